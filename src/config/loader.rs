//! Configuration loading functionality.
//!
//! This module provides the [`RulesetLoader`] type for loading ruleset
//! declarations from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::RulesetConfig;

/// Loads ruleset declarations from a directory.
///
/// # Directory Structure
///
/// ```text
/// config/rulesets/
/// ├── fha-w2-1.0.0.yaml
/// └── fha-w2-1.1.0.yaml
/// ```
///
/// Files are read in file-name order, so the resulting list is stable.
///
/// # Example
///
/// ```no_run
/// use income_engine::config::RulesetLoader;
///
/// let loader = RulesetLoader::load("./config/rulesets").unwrap();
/// for ruleset in loader.rulesets() {
///     println!("{}@{}", ruleset.id, ruleset.version);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RulesetLoader {
    rulesets: Vec<RulesetConfig>,
}

impl RulesetLoader {
    /// Loads every `.yaml` file from the specified directory.
    ///
    /// Returns an error if:
    /// - The directory does not exist or contains no ruleset files
    /// - Any file contains invalid YAML or misses a required field
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let dir = path.as_ref();
        let dir_str = dir.display().to_string();

        if !dir.is_dir() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no ruleset files found)", dir_str),
            });
        }

        let rulesets = files
            .iter()
            .map(|file| Self::load_yaml(file))
            .collect::<EngineResult<Vec<RulesetConfig>>>()?;

        debug!(directory = %dir_str, count = rulesets.len(), "Loaded ruleset configuration");
        Ok(Self { rulesets })
    }

    /// Loads and parses a single YAML file.
    fn load_yaml(path: &Path) -> EngineResult<RulesetConfig> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded ruleset declarations.
    pub fn rulesets(&self) -> &[RulesetConfig] {
        &self.rulesets
    }

    /// Consumes the loader, returning the declarations.
    pub fn into_rulesets(self) -> Vec<RulesetConfig> {
        self.rulesets
    }
}
