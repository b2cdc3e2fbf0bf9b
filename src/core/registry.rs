//! Capability unit registration and default-unit selection.
//!
//! No classpath scanning: the selectable units are an explicit table, a
//! fixed built-in list plus the project-local units injected by whoever
//! resolved the run environment. Instances are memoized per run and shared
//! between every requirer.

use crate::error::{Error, Result};
use crate::unit::{Instances, SharedUnit, UnitSpec};

/// Identifier every run falls back to when nothing better is selected.
pub const FALLBACK_UNIT: &str = "base";

/// Registration entry: identifier, one-line summary, static descriptor and
/// constructor.
#[derive(Debug, Clone, Copy)]
pub struct UnitDef {
    pub id: &'static str,
    pub summary: &'static str,
    pub spec: &'static UnitSpec,
    pub factory: fn() -> Box<dyn crate::unit::CapabilityUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOrigin {
    BuiltIn,
    Local,
}

pub struct Registry {
    builtins: Vec<UnitDef>,
    locals: Vec<UnitDef>,
    default_override: Option<String>,
    instances: Instances,
}

impl Registry {
    pub fn new(builtins: Vec<UnitDef>) -> Self {
        Self {
            builtins,
            locals: Vec::new(),
            default_override: None,
            instances: Instances::default(),
        }
    }

    /// Project-local units discovered by the environment collaborator.
    pub fn with_locals(mut self, locals: Vec<UnitDef>) -> Self {
        self.locals = locals;
        self
    }

    /// Explicit default-unit override from the run configuration.
    pub fn with_default_override(mut self, id: Option<String>) -> Self {
        self.default_override = id;
        self
    }

    /// All selectable identifiers, built-ins first, registration order.
    pub fn ids(&self) -> Vec<String> {
        self.defs().map(|def| def.id.to_string()).collect()
    }

    pub fn defs(&self) -> impl Iterator<Item = &UnitDef> {
        self.builtins.iter().chain(self.locals.iter())
    }

    pub fn origin(&self, id: &str) -> Option<UnitOrigin> {
        if self.builtins.iter().any(|def| def.id == id) {
            Some(UnitOrigin::BuiltIn)
        } else if self.locals.iter().any(|def| def.id == id) {
            Some(UnitOrigin::Local)
        } else {
            None
        }
    }

    pub fn def(&self, id: &str) -> Result<&UnitDef> {
        self.defs()
            .find(|def| def.id == id)
            .ok_or_else(|| Error::unknown_unit(id, self.ids()))
    }

    /// The default unit identifier for this run. Pure and deterministic:
    /// explicit override, else the sole project-local unit, else the fixed
    /// fallback. Whether the chosen identifier actually resolves is checked
    /// later, at segment resolution.
    pub fn default_unit_id(&self) -> String {
        if let Some(id) = &self.default_override {
            return id.clone();
        }
        if self.locals.len() == 1 {
            return self.locals[0].id.to_string();
        }
        FALLBACK_UNIT.to_string()
    }

    /// Memoized instance lookup: one instance per identifier per run,
    /// created on first touch.
    pub fn instance(&self, id: &str) -> Result<SharedUnit> {
        let def = self.def(id)?;
        Ok(self.instances.get_or_insert_with(id, def.factory))
    }

    /// Shared instance table for building `RunContext`s.
    pub fn instances(&self) -> Instances {
        self.instances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::unit::{CapabilityUnit, RunContext, UnitSpec};
    use serde_json::Value;
    use std::rc::Rc;

    struct Inert;

    impl CapabilityUnit for Inert {
        fn spec(&self) -> &'static UnitSpec {
            static SPEC: UnitSpec = UnitSpec {
                fields: &[],
                actions: &[],
                requires: &[],
            };
            &SPEC
        }

        fn settings(&self) -> crate::error::Result<Value> {
            Ok(serde_json::json!({}))
        }

        fn apply_settings(&mut self, _settings: Value) -> crate::error::Result<()> {
            Ok(())
        }

        fn invoke(&mut self, _action: &str, _ctx: &RunContext) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn def(id: &'static str) -> UnitDef {
        static SPEC: UnitSpec = UnitSpec {
            fields: &[],
            actions: &[],
            requires: &[],
        };
        UnitDef {
            id,
            summary: "",
            spec: &SPEC,
            factory: || Box::new(Inert),
        }
    }

    #[test]
    fn default_prefers_override_then_sole_local_then_fallback() {
        let reg = Registry::new(vec![def("base")]);
        assert_eq!(reg.default_unit_id(), "base");

        let reg = Registry::new(vec![def("base")]).with_locals(vec![def("mybuild")]);
        assert_eq!(reg.default_unit_id(), "mybuild");

        let reg = Registry::new(vec![def("base")])
            .with_locals(vec![def("mybuild"), def("other")]);
        assert_eq!(reg.default_unit_id(), "base");

        let reg = Registry::new(vec![def("base")])
            .with_locals(vec![def("mybuild")])
            .with_default_override(Some("other".to_string()));
        assert_eq!(reg.default_unit_id(), "other");
    }

    #[test]
    fn default_selection_is_idempotent() {
        let reg = Registry::new(vec![def("base")]).with_locals(vec![def("mybuild")]);
        assert_eq!(reg.default_unit_id(), reg.default_unit_id());
    }

    #[test]
    fn unknown_unit_lists_known_ids() {
        let reg = Registry::new(vec![def("base")]).with_locals(vec![def("mybuild")]);
        let err = reg.def("ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnitUnknown);
        assert_eq!(err.details["known"], serde_json::json!(["base", "mybuild"]));
    }

    #[test]
    fn instances_are_memoized_and_shared() {
        let reg = Registry::new(vec![def("base")]);
        let first = reg.instance("base").unwrap();
        let second = reg.instance("base").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn origin_distinguishes_builtin_from_local() {
        let reg = Registry::new(vec![def("base")]).with_locals(vec![def("mybuild")]);
        assert_eq!(reg.origin("base"), Some(UnitOrigin::BuiltIn));
        assert_eq!(reg.origin("mybuild"), Some(UnitOrigin::Local));
        assert_eq!(reg.origin("ghost"), None);
    }
}
