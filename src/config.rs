//! Process-wide settings read by the shipped types.
//!
//! A config is installed at most once, before graph construction starts.
//! Until then (or if nothing is ever installed) [`current`] returns the
//! defaults.
use crate::types::DowncastPolicy;
use crate::value::DType;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a JSON config file for [`ContractConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "SYMGRAPH_TYPES_CONFIG";

static INSTALLED: OnceCell<ContractConfig> = OnceCell::new();
static DEFAULT: Lazy<ContractConfig> = Lazy::new(ContractConfig::default);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tolerance {field}: {value} (must be finite and non-negative)")]
    InvalidTolerance { field: &'static str, value: f64 },
    #[error("a config has already been installed for this process")]
    AlreadyInstalled,
}

/// Relative and absolute tolerance for approximate comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    /// `|a - b| <= atol + rtol * |b|`. Exactly equal values (including equal
    /// infinities) and NaN against NaN are close.
    pub fn close(&self, a: f64, b: f64) -> bool {
        if a == b || (a.is_nan() && b.is_nan()) {
            return true;
        }
        if a.is_infinite() || b.is_infinite() {
            return false;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        for value in [self.rtol, self.atol] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub float32_tolerance: Tolerance,
    pub float64_tolerance: Tolerance,
    /// Policy given to scalar and array types built without an explicit one.
    pub default_downcast: DowncastPolicy,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            float32_tolerance: Tolerance { rtol: 1e-5, atol: 1e-5 },
            float64_tolerance: Tolerance { rtol: 1e-5, atol: 1e-8 },
            default_downcast: DowncastPolicy::Deny,
        }
    }
}

impl ContractConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Loads the file named by `SYMGRAPH_TYPES_CONFIG`, if set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_path(path).map(Some),
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.float32_tolerance.validate("float32_tolerance")?;
        self.float64_tolerance.validate("float64_tolerance")
    }

    /// Tolerance for a dtype. Non-float kinds compare exactly.
    pub fn tolerance_for(&self, dtype: DType) -> Tolerance {
        match dtype {
            DType::Float32 => self.float32_tolerance,
            DType::Float64 => self.float64_tolerance,
            _ => Tolerance { rtol: 0.0, atol: 0.0 },
        }
    }
}

/// Installs the process-wide config. Fails if one is already installed.
pub fn install(config: ContractConfig) -> Result<(), ConfigError> {
    config.validate()?;
    INSTALLED.set(config).map_err(|_| ConfigError::AlreadyInstalled)?;
    tracing::debug!("installed contract config");
    Ok(())
}

pub fn current() -> &'static ContractConfig {
    INSTALLED.get().unwrap_or_else(|| &*DEFAULT)
}
