use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{config, request, GlobalArgs};
use webshell::config::CONFIG_FILE_NAME;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "webshell")]
#[command(version = VERSION)]
#[command(about = "Build and send web shell service requests")]
struct Cli {
    /// Path to webshell.json (defaults to ./webshell.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL an action would be sent to
    Url(request::ActionArgs),
    /// Send a GET request for an action
    Get(request::ActionArgs),
    /// Send a POST request for an action
    Post(request::PostArgs),
    /// Ask the server to cancel a long-running operation
    Cancel(request::CancelArgs),
    /// Manage webshell.json
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config_path: cli
            .config
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
