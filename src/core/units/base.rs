//! The `base` unit: fallback target for unaddressed segments when no
//! project-local unit claims the default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::log_status;
use crate::registry::UnitDef;
use crate::unit::{
    settings_from_value, settings_value, ActionSpec, CapabilityUnit, FieldKind, FieldSpec,
    RunContext, UnitSpec,
};

pub const DEF: UnitDef = UnitDef {
    id: "base",
    summary: "Engine information and bound-settings inspection",
    spec: &SPEC,
    factory: || Box::new(BaseUnit::default()),
};

static SPEC: UnitSpec = UnitSpec {
    fields: &[FieldSpec {
        name: "verbose",
        doc: "Also log the run's base directory",
        documented: true,
        kind: FieldKind::Bool,
    }],
    actions: &[
        ActionSpec {
            name: "about",
            doc: "Log the engine name and version",
        },
        ActionSpec {
            name: "settings",
            doc: "Log the unit's bound settings as JSON",
        },
    ],
    requires: &[],
};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BaseSettings {
    verbose: bool,
}

#[derive(Default)]
pub struct BaseUnit {
    cfg: BaseSettings,
}

impl CapabilityUnit for BaseUnit {
    fn spec(&self) -> &'static UnitSpec {
        &SPEC
    }

    fn settings(&self) -> Result<Value> {
        settings_value(&self.cfg)
    }

    fn apply_settings(&mut self, settings: Value) -> Result<()> {
        self.cfg = settings_from_value(settings)?;
        Ok(())
    }

    fn invoke(&mut self, action: &str, ctx: &RunContext) -> Result<()> {
        match action {
            "about" => {
                log_status!("base", "jig {}", env!("CARGO_PKG_VERSION"));
                if self.cfg.verbose {
                    log_status!("base", "base directory {}", ctx.base_dir.display());
                }
                Ok(())
            }
            "settings" => {
                let rendered = serde_json::to_string(&self.cfg).map_err(|e| {
                    Error::internal_json(e.to_string(), Some("render base settings".to_string()))
                })?;
                log_status!("base", "{}", rendered);
                Ok(())
            }
            other => Err(Error::internal_unexpected(format!(
                "unresolved action '{}'",
                other
            ))),
        }
    }
}
