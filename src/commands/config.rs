use clap::{Args, Subcommand};
use serde::Serialize;

use webshell::config::{self, Defaults, ServiceConfig, WebShellConfig};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (file merged with built-in defaults)
    Show {
        /// Show only built-in defaults (ignore webshell.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Write a service section to webshell.json, keeping existing defaults
    Init {
        /// Server base URL (e.g., https://host/app)
        #[arg(long)]
        base_url: String,
        /// Database name sent with every request
        #[arg(long)]
        database_name: String,
        /// Route requests through this URL instead of the base URL
        #[arg(long)]
        proxy_url: Option<String>,
        /// Identity to run requests as
        #[arg(long)]
        run_as: Option<String>,
    },
    /// Show the path to webshell.json
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<WebShellConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = global.config_path.display().to_string();

    match args.command {
        ConfigCommand::Show { builtin } => {
            let config = if builtin {
                WebShellConfig {
                    service: None,
                    defaults: Defaults::default(),
                }
            } else {
                config::load_config_or_default(&global.config_path)?
            };

            Ok((
                ConfigOutput {
                    command: "show".to_string(),
                    config: Some(config),
                    path: Some(path),
                    exists: Some(global.config_path.exists()),
                },
                0,
            ))
        }
        ConfigCommand::Init {
            base_url,
            database_name,
            proxy_url,
            run_as,
        } => {
            let mut config = config::load_config_or_default(&global.config_path)?;
            let service = ServiceConfig {
                proxy_url,
                run_as,
                ..ServiceConfig::new(base_url, database_name)
            };
            service.validate()?;
            config.service = Some(service);
            config::save_config(&global.config_path, &config)?;

            Ok((
                ConfigOutput {
                    command: "init".to_string(),
                    config: Some(config),
                    path: Some(path),
                    exists: Some(true),
                },
                0,
            ))
        }
        ConfigCommand::Path => Ok((
            ConfigOutput {
                command: "path".to_string(),
                config: None,
                path: Some(path),
                exists: Some(global.config_path.exists()),
            },
            0,
        )),
    }
}
