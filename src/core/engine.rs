//! Invocation orchestration.
//!
//! One engine serves one process and walks a fixed state machine per
//! command: resolve the run environment, bind the registry, then for each
//! command segment bind properties, satisfy requirements and invoke
//! actions. A long-lived host may call `run` repeatedly on one booted
//! engine; instances and init hooks are shared across those commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::binder;
use crate::env::{self, RunEnvironment};
use crate::error::{Error, Result};
use crate::log_status;
use crate::registry::{Registry, UnitDef};
use crate::requires;
use crate::segment::{self, ActionToken, CommandSegment};
use crate::unit::RunContext;
use crate::units;
use crate::utils::args::action_stream_args;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    EnvResolved,
    RegistryBound,
    PropertiesBound,
    RequirementsSatisfied,
    Executed,
    Terminated,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub segments: Vec<SegmentReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReport {
    pub unit: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bound: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invoked: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SegmentError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentError {
    pub code: String,
    pub message: String,
}

pub struct Engine {
    state: EngineState,
    base_dir: PathBuf,
    env: Option<RunEnvironment>,
    registry: Option<Registry>,
    local_units: Vec<UnitDef>,
    continue_on_failure: Option<bool>,
    initialized: BTreeSet<String>,
}

impl Engine {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            state: EngineState::Created,
            base_dir: base_dir.to_path_buf(),
            env: None,
            registry: None,
            local_units: Vec::new(),
            continue_on_failure: None,
            initialized: BTreeSet::new(),
        }
    }

    /// Project-local units to register alongside the built-ins. Must be
    /// called before `boot`.
    pub fn with_local_units(mut self, locals: Vec<UnitDef>) -> Self {
        self.local_units = locals;
        self
    }

    /// Command-line override for the config's continue-on-failure setting.
    pub fn set_continue_on_failure(&mut self, on: bool) {
        self.continue_on_failure = Some(on);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Resolve the run environment and bind the registry. Failures here are
    /// fatal for the whole invocation.
    pub fn boot(&mut self) -> Result<()> {
        if self.state != EngineState::Created {
            return Err(Error::internal_unexpected(format!(
                "engine cannot boot from state {:?}",
                self.state
            )));
        }

        let env = env::resolve(&self.base_dir)?;
        self.state = EngineState::EnvResolved;

        let registry = Registry::new(units::built_in())
            .with_locals(self.local_units.clone())
            .with_default_override(env.config.run.default_unit.clone());
        self.env = Some(env);
        self.registry = Some(registry);
        self.state = EngineState::RegistryBound;
        Ok(())
    }

    pub fn environment(&self) -> Result<&RunEnvironment> {
        self.env
            .as_ref()
            .ok_or_else(|| Error::internal_unexpected("engine not booted"))
    }

    pub fn registry(&self) -> Result<&Registry> {
        self.registry
            .as_ref()
            .ok_or_else(|| Error::internal_unexpected("engine not booted"))
    }

    /// No further commands: a terminated engine rejects `run`.
    pub fn shutdown(&mut self) {
        self.state = EngineState::Terminated;
    }

    /// Execute one command. Reserved lifecycle flags are filtered before
    /// segmentation; segments then process strictly in declared order. A
    /// segment failure aborts the remaining segments unless
    /// continue-on-failure is set, in which case the report carries the
    /// per-segment errors and `success: false`.
    pub fn run(&mut self, tokens: &[String]) -> Result<RunReport> {
        match self.state {
            EngineState::RegistryBound | EngineState::Executed => {}
            EngineState::Terminated => {
                return Err(Error::internal_unexpected("engine is terminated"));
            }
            _ => {
                return Err(Error::internal_unexpected("engine not booted"));
            }
        }

        let filtered = action_stream_args(tokens);
        let segments = segment::parse_segments(&filtered)?;

        let registry = self
            .registry
            .take()
            .ok_or_else(|| Error::internal_unexpected("engine not booted"))?;
        let outcome = self.run_segments(&registry, segments);
        self.registry = Some(registry);
        self.state = EngineState::Executed;
        outcome
    }

    fn continue_on_failure(&self) -> bool {
        self.continue_on_failure.unwrap_or_else(|| {
            self.env
                .as_ref()
                .map(|env| env.config.run.continue_on_failure)
                .unwrap_or(false)
        })
    }

    fn run_segments(
        &mut self,
        registry: &Registry,
        segments: Vec<CommandSegment>,
    ) -> Result<RunReport> {
        let continue_on_failure = self.continue_on_failure();
        let mut reports = Vec::with_capacity(segments.len());
        let mut success = true;

        self.state = EngineState::PropertiesBound;
        for seg in segments {
            let (report, error) = self.run_segment(registry, seg);
            reports.push(report);
            if let Some(error) = error {
                success = false;
                if !continue_on_failure {
                    return Err(error);
                }
            }
        }

        Ok(RunReport {
            success,
            segments: reports,
        })
    }

    fn run_segment(
        &mut self,
        registry: &Registry,
        seg: CommandSegment,
    ) -> (SegmentReport, Option<Error>) {
        let unit_id = seg
            .unit
            .clone()
            .unwrap_or_else(|| registry.default_unit_id());
        let mut report = SegmentReport {
            unit: unit_id.clone(),
            bound: Vec::new(),
            invoked: Vec::new(),
            error: None,
        };
        let error = self
            .process_segment(registry, &unit_id, &seg, &mut report)
            .err();
        if let Some(e) = &error {
            report.error = Some(SegmentError {
                code: e.code.as_str().to_string(),
                message: e.message.clone(),
            });
        }
        (report, error)
    }

    fn process_segment(
        &mut self,
        registry: &Registry,
        unit_id: &str,
        seg: &CommandSegment,
        report: &mut SegmentReport,
    ) -> Result<()> {
        registry.def(unit_id)?;
        log_status!("run", "segment -> {}", unit_id);

        // The requirement graph lives on static descriptors, so a cycle
        // fails here, before any unit is instantiated.
        let touched = [unit_id.to_string()];
        let order = requires::resolve_order(registry, &touched)?;

        let target = registry.instance(unit_id)?;

        // Properties first, whatever their position among the method tokens.
        self.state = EngineState::PropertiesBound;
        for token in &seg.tokens {
            if let ActionToken::Assign { path, raw } = token {
                binder::bind(target.borrow_mut().as_mut(), path, raw.as_deref())
                    .map_err(|e| e.annotate_unit(unit_id))?;
                report.bound.push(path.clone());
            }
        }

        // Init hooks fire requirements-first, each at most once per run.
        let log_tasks = self
            .env
            .as_ref()
            .map(|env| env.config.run.log_tasks)
            .unwrap_or(false);
        let ctx = RunContext::new(self.base_dir.clone(), registry.instances())
            .with_log_tasks(log_tasks);
        for id in &order {
            let instance = registry.instance(id)?;
            if self.initialized.insert(id.clone()) {
                instance
                    .borrow_mut()
                    .init(&ctx)
                    .map_err(|e| Error::action_failed(id, "init", e.message))?;
            }
        }
        self.state = EngineState::RequirementsSatisfied;

        for token in &seg.tokens {
            if let ActionToken::Invoke { name } = token {
                let def = registry.def(unit_id)?;
                if !def.spec.actions.iter().any(|action| action.name == name) {
                    return Err(Error::validation_invalid_argument(
                        "action",
                        format!("Unit '{}' has no action '{}'", unit_id, name),
                        Some(
                            def.spec
                                .actions
                                .iter()
                                .map(|action| action.name.to_string())
                                .collect(),
                        ),
                    )
                    .annotate_unit(unit_id));
                }
                target
                    .borrow_mut()
                    .invoke(name, &ctx)
                    .map_err(|e| Error::action_failed(unit_id, name, e.message))?;
                report.invoked.push(name.clone());
            }
        }
        Ok(())
    }
}
