use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::GlobalArgs;
use commands::{doc, run, units};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "jig")]
#[command(version = VERSION)]
#[command(about = "Command and capability-unit execution engine for project automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute command segments against capability units
    Run(run::RunArgs),
    /// List selectable capability units
    Units(units::UnitsArgs),
    /// Show a unit's documented properties and actions
    Doc(doc::DocArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

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
