//! Capability unit contract and per-type descriptor tables.
//!
//! A capability unit is a named module exposing documented configuration
//! fields and zero-argument actions. Instead of runtime reflection, each
//! unit type carries a static `UnitSpec` describing what the binder may
//! touch and what the engine may invoke.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Static descriptor for one capability unit type.
#[derive(Debug)]
pub struct UnitSpec {
    pub fields: &'static [FieldSpec],
    pub actions: &'static [ActionSpec],
    /// Units that must be instantiated, bound and initialized before this
    /// unit's `init` hook runs. Declared statically so the requirement graph
    /// can be checked before any instantiation.
    pub requires: &'static [&'static str],
}

/// One configuration field. The binder only sees fields with
/// `documented: true`; an undocumented nested field hides its whole subtree
/// even when the Rust fields exist.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub doc: &'static str,
    pub documented: bool,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub enum FieldKind {
    Bool,
    Number,
    Enum(&'static [&'static str]),
    Text,
    /// Multi-valued field: the property path carries one extra segment, a
    /// numeric list index or a string map key. Elements coerce recursively.
    Multi(&'static FieldKind),
    Nested(&'static [FieldSpec]),
}

impl FieldKind {
    /// Human-readable kind tag for docs and coercion errors.
    pub fn label(&self) -> String {
        match self {
            FieldKind::Bool => "boolean".to_string(),
            FieldKind::Number => "integer".to_string(),
            FieldKind::Enum(variants) => format!("enum[{}]", variants.join("|")),
            FieldKind::Text => "text".to_string(),
            FieldKind::Multi(element) => format!("multi<{}>", element.label()),
            FieldKind::Nested(_) => "nested".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ActionSpec {
    pub name: &'static str,
    pub doc: &'static str,
}

/// A capability unit instance: one per unit id per run, shared by the
/// engine and by every unit that requires it.
pub trait CapabilityUnit {
    fn spec(&self) -> &'static UnitSpec;

    /// Snapshot of the unit's configuration as a JSON object. The binder
    /// edits this tree and hands it back through `apply_settings`.
    fn settings(&self) -> Result<Value>;

    fn apply_settings(&mut self, settings: Value) -> Result<()>;

    /// Post-initialization hook, called once per run after the unit and all
    /// of its requirements are instantiated and property-bound.
    fn init(&mut self, _ctx: &RunContext) -> Result<()> {
        Ok(())
    }

    /// Run a named action. The engine resolves the name against
    /// `spec().actions` before calling, so unknown names reaching here are
    /// an internal error.
    fn invoke(&mut self, action: &str, ctx: &RunContext) -> Result<()>;
}

pub type SharedUnit = Rc<RefCell<Box<dyn CapabilityUnit>>>;

/// Per-run instance memoization table. Write-once per unit id, shared
/// between the registry and every `RunContext`.
#[derive(Clone, Default)]
pub struct Instances {
    map: Rc<RefCell<BTreeMap<String, SharedUnit>>>,
}

impl Instances {
    pub fn get(&self, id: &str) -> Option<SharedUnit> {
        self.map.borrow().get(id).cloned()
    }

    pub fn get_or_insert_with(
        &self,
        id: &str,
        create: impl FnOnce() -> Box<dyn CapabilityUnit>,
    ) -> SharedUnit {
        if let Some(existing) = self.get(id) {
            return existing;
        }
        let unit: SharedUnit = Rc::new(RefCell::new(create()));
        self.map
            .borrow_mut()
            .insert(id.to_string(), Rc::clone(&unit));
        unit
    }

    pub fn contains(&self, id: &str) -> bool {
        self.map.borrow().contains_key(id)
    }
}

/// Context handed to unit hooks and actions. Gives access to the run's
/// base directory and to the shared instances of other units (typically
/// declared requirements).
///
/// A unit must not look up its own instance from inside one of its own
/// actions: the engine already holds the mutable borrow.
pub struct RunContext {
    pub base_dir: PathBuf,
    /// Whether task lists should log start/end markers, from the run
    /// configuration. Units pass this to `TaskList::set_log_tasks`.
    pub log_tasks: bool,
    instances: Instances,
}

impl RunContext {
    pub fn new(base_dir: PathBuf, instances: Instances) -> Self {
        Self {
            base_dir,
            log_tasks: false,
            instances,
        }
    }

    pub fn with_log_tasks(mut self, log: bool) -> Self {
        self.log_tasks = log;
        self
    }

    pub fn unit(&self, id: &str) -> Option<SharedUnit> {
        self.instances.get(id)
    }

    /// Like `unit`, but failing with the standard unknown-unit error.
    pub fn require(&self, id: &str) -> Result<SharedUnit> {
        self.instances
            .get(id)
            .ok_or_else(|| Error::unknown_unit(id, Vec::new()))
    }
}

/// Serialize a unit's settings struct for `CapabilityUnit::settings`.
pub fn settings_value<T: Serialize>(settings: &T) -> Result<Value> {
    serde_json::to_value(settings)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize unit settings".to_string())))
}

/// Deserialize a settings tree for `CapabilityUnit::apply_settings`.
pub fn settings_from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("apply unit settings".to_string())))
}
