pub mod doc;
pub mod run;
pub mod units;

/// Command handlers return their payload plus the process exit code.
pub type CmdResult<T> = jig::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (jig::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Units(args) => dispatch!(args, global, units),
        crate::Commands::Doc(args) => dispatch!(args, global, doc),
    }
}
