use std::path::PathBuf;

use clap::Args;
use jig::engine::Engine;
use jig::registry::UnitOrigin;
use serde::Serialize;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct UnitsArgs {
    /// Base directory of the project (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsOutput {
    pub default_unit: String,
    pub units: Vec<UnitSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSummary {
    pub id: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub summary: &'static str,
    pub origin: &'static str,
    pub default: bool,
}

pub fn run(args: UnitsArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<UnitsOutput> {
    let base_dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let mut engine = Engine::new(&base_dir);
    engine.boot()?;

    let registry = engine.registry()?;
    let default_unit = registry.default_unit_id();
    let units = registry
        .defs()
        .map(|def| UnitSummary {
            id: def.id.to_string(),
            summary: def.summary,
            origin: match registry.origin(def.id) {
                Some(UnitOrigin::Local) => "local",
                _ => "builtin",
            },
            default: def.id == default_unit,
        })
        .collect();

    Ok((
        UnitsOutput {
            default_unit,
            units,
        },
        0,
    ))
}
