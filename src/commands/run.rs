use std::path::PathBuf;

use clap::Args;
use jig::engine::{Engine, RunReport};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Base directory of the project (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Attempt later segments even when one fails
    #[arg(long)]
    pub continue_on_failure: bool,

    /// Command tokens: `unit: prop=value action ...`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunReport> {
    let base_dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let mut engine = Engine::new(&base_dir);
    engine.boot()?;
    if args.continue_on_failure {
        engine.set_continue_on_failure(true);
    }

    let report = engine.run(&args.tokens)?;
    let exit = if report.success { 0 } else { 1 };
    Ok((report, exit))
}
