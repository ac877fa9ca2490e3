//! Scenario file loader.
//!
//! Scenarios are YAML files kept in one directory and addressed by file stem:
//!
//! ```text
//! scenarios/
//! ├── head_on.yaml
//! ├── wall_bounce.yaml
//! └── random_pit.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::scenario::ScenarioConfig;

/// Error type for loading and validating scenarios.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Scenario not found: {0}")]
    NotFound(String),
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// Scenario loader with configurable base directory.
pub struct ScenarioLoader {
    base_path: PathBuf,
}

impl ScenarioLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load and validate a scenario by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = ScenarioLoader::new("scenarios");
    /// let engine = loader.load("head_on")?.build_engine()?;
    /// ```
    pub fn load(&self, name: &str) -> Result<ScenarioConfig, ConfigError> {
        let path = self.base_path.join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        Self::load_path(path)
    }

    /// Load and validate a scenario from an explicit file.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
        let path = path.as_ref();
        debug!("loading scenario from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let scenario: ScenarioConfig = serde_yaml::from_str(&contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Names of all scenarios in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
