//! Configuration I/O (YAML loading)
//!
//! Unknown keys are rejected so that a typo does not silently fall back to
//! the default value.

use super::engine_config::ErrorPropConfig;
use super::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// YAML document layout: `version: 1` plus the engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    version: u32,
    #[serde(default)]
    errorprop: ErrorPropConfig,
}

const SUPPORTED_VERSION: u32 = 1;

impl ErrorPropConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(yaml)?;
        if file.version != SUPPORTED_VERSION {
            return Err(super::ConfigError::range_with_hint(
                "version",
                file.version,
                SUPPORTED_VERSION,
                SUPPORTED_VERSION,
                "Add 'version: 1' to the top of the file",
            ));
        }
        file.errorprop.validate()?;
        Ok(file.errorprop)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to a versioned YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: SUPPORTED_VERSION,
            errorprop: self.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}
