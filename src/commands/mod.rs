use std::path::PathBuf;

use webshell::config::WebShellConfig;
use webshell::ShellService;

pub type CmdResult<T> = webshell::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config_path: PathBuf,
}

impl GlobalArgs {
    pub fn load_config(&self) -> webshell::Result<WebShellConfig> {
        webshell::config::load_config(&self.config_path)
    }

    /// Service handle built from the configured `service` section.
    pub fn service(&self) -> webshell::Result<ShellService> {
        let config = self.load_config()?;
        let service = config.require_service()?.clone();
        ShellService::new(service, config.defaults)
    }
}

pub mod config;
pub mod request;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($result:expr) => {
        crate::output::map_cmd_result_to_json($result)
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (webshell::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Url(args) => dispatch!(request::run_url(args, global)),
        crate::Commands::Get(args) => dispatch!(request::run_get(args, global)),
        crate::Commands::Post(args) => dispatch!(request::run_post(args, global)),
        crate::Commands::Cancel(args) => dispatch!(request::run_cancel(args, global)),
        crate::Commands::Config(args) => dispatch!(config::run(args, global)),
    }
}
