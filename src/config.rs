// src/config.rs

//! Self-test configuration.
//!
//! The vector types themselves take no runtime configuration; backend
//! selection is a compile-time cfg. This module only configures the parity
//! self-check run by the `laneflow` binary. Settings are read from the JSON
//! file named by `LANEFLOW_CONFIG` when that variable is set, and default
//! otherwise.
//!
//! ```json
//! { "samples": 10000, "seed": 7, "include_nan": false }
//! ```

use std::path::Path;

use anyhow::Context;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "LANEFLOW_CONFIG";

/// Settings for [`crate::selftest::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfTestConfig {
    /// Pseudo-random input vectors per operation, on top of the fixed edge
    /// values.
    pub samples: usize,
    /// Seed for the pseudo-random inputs. Runs with the same seed check the
    /// same inputs.
    pub seed: u64,
    /// Whether NaN is part of the float corpus.
    pub include_nan: bool,
    /// Print the report as JSON instead of a log summary.
    pub report_json: bool,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        SelfTestConfig {
            samples: 4096,
            seed: 0x1a5e_f10e,
            include_nan: true,
            report_json: false,
        }
    }
}

impl SelfTestConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse self-test config")
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Loads from `LANEFLOW_CONFIG` if set; falls back to defaults (with a
    /// warning) when the file cannot be used.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded self-test config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                warn!("{e:#}; using default self-test config");
                Self::default()
            }
        }
    }
}

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<SelfTestConfig> = Lazy::new(SelfTestConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SelfTestConfig::from_json(r#"{ "samples": 12 }"#).unwrap();
        assert_eq!(config.samples, 12);
        assert_eq!(config.seed, SelfTestConfig::default().seed);
        assert!(config.include_nan);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = SelfTestConfig::from_json("{ samples: ").unwrap_err();
        assert!(format!("{err:#}").contains("self-test config"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = SelfTestConfig::load("/nonexistent/laneflow.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/laneflow.json"));
    }
}
