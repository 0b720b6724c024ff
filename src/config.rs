//! Interpreter configuration
//!
//! Loaded from a JSON file given with `--config`. Every field has a default,
//! so an empty object `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::runtime::storage::Engine;

/// Default cap on DO-loop iterations per loop
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 1_000_000;

/// A libref assigned at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Libref
    pub name: String,
    /// Directory holding the datasets
    pub path: PathBuf,
    /// On-disk format; the interpreter default when absent
    #[serde(default)]
    pub engine: Option<Engine>,
    /// Assign with ACCESS=READONLY
    #[serde(default)]
    pub readonly: bool,
}

/// Tunables of one interpreter session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Iteration cap applied to each DO loop
    pub max_loop_iterations: usize,
    /// Print every dataset a DATA step writes
    pub auto_print: bool,
    /// Initial `OBS=` system option
    pub obs_limit: Option<usize>,
    /// Engine used by LIBNAME when none is named
    pub default_engine: Engine,
    /// Librefs assigned before the program runs
    pub libraries: Vec<LibraryConfig>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            auto_print: false,
            obs_limit: None,
            default_engine: Engine::default(),
            libraries: Vec::new(),
        }
    }
}

impl InterpreterConfig {
    /// Reads a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        Self::from_json(&text)
    }

    /// Parses a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: InterpreterConfig =
            serde_json::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))?;
        if config.max_loop_iterations == 0 {
            return Err(Error::ConfigError(
                "max_loop_iterations must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = InterpreterConfig::from_json("{}").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.max_loop_iterations, 1_000_000);
    }

    #[test]
    fn test_partial_config() {
        let config = InterpreterConfig::from_json(
            r#"{"auto_print": true, "obs_limit": 10,
                "libraries": [{"name": "sales", "path": "/tmp", "engine": "csv"}]}"#,
        )
        .unwrap();
        assert!(config.auto_print);
        assert_eq!(config.obs_limit, Some(10));
        assert_eq!(config.libraries[0].engine, Some(Engine::Csv));
        assert!(!config.libraries[0].readonly);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        assert!(matches!(
            InterpreterConfig::from_json(r#"{"max_loop_iterations": 0}"#),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            InterpreterConfig::from_json("not json"),
            Err(Error::ConfigError(_))
        ));
    }
}
