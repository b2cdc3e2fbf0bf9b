//! Run environment resolution.
//!
//! Resolved once per engine boot: the base directory plus the optional
//! `jig.toml` run configuration found there. Project-local unit discovery
//! is not done here; locals are injected by the embedding application.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "jig.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Overrides default-unit selection for every command in this project.
    pub default_unit: Option<String>,
    #[serde(default)]
    pub continue_on_failure: bool,
    /// Wrap unit sub-tasks with start/end status markers.
    #[serde(default)]
    pub log_tasks: bool,
}

#[derive(Debug, Clone)]
pub struct RunEnvironment {
    pub base_dir: PathBuf,
    pub config: RunConfig,
}

/// Read the run environment for a base directory. A missing config file is
/// not an error; a malformed one is.
pub fn resolve(base_dir: &Path) -> Result<RunEnvironment> {
    let config_path = base_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(RunEnvironment {
            base_dir: base_dir.to_path_buf(),
            config: RunConfig::default(),
        });
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(config_path.display().to_string()))
    })?;
    let config: RunConfig = toml::from_str(&content).map_err(|e| {
        Error::config_invalid_value(
            config_path.display().to_string(),
            None,
            e.to_string(),
        )
    })?;

    Ok(RunEnvironment {
        base_dir: base_dir.to_path_buf(),
        config,
    })
}
