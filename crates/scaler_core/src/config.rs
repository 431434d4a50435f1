//! Optional TOML configuration for the scaler.
//!
//! ```toml
//! enabled = true
//! aspect_tolerance = 0.01
//! center_rounding = "floor"
//! log_level = "info"
//! log_file = "d3d9_scaler.log"
//! ```
//!
//! Every key is optional. A missing file means defaults.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::scaling::{CenterRounding, ScalingOptions, DEFAULT_ASPECT_TOLERANCE};

/// File name looked up in the host process's working directory.
pub const CONFIG_FILE_NAME: &str = "d3d9_scaler.toml";

const DEFAULT_LOG_FILE: &str = "d3d9_scaler.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalerConfig {
    /// When `false` every scaling decision is NoScale; devices are still wrapped.
    pub enabled: bool,
    /// Largest aspect-ratio difference still treated as "same aspect".
    pub aspect_tolerance: f64,
    /// Which side gets the odd pixel when a letterbox border cannot be split evenly.
    pub center_rounding: CenterRounding,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            aspect_tolerance: DEFAULT_ASPECT_TOLERANCE,
            center_rounding: CenterRounding::Floor,
            log_level: LevelFilter::Info,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ScalerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ScalerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`. A file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn scaling_options(&self) -> ScalingOptions {
        ScalingOptions {
            aspect_tolerance: self.aspect_tolerance,
            center_rounding: self.center_rounding,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.aspect_tolerance.is_finite() || self.aspect_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "aspect_tolerance must be a finite non-negative number, got {}",
                self.aspect_tolerance
            )));
        }
        Ok(())
    }
}
