//! Solver and node configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schema::AffectsPolicy;

/// Lowest `globalScale` the solver may divide by.
pub const MIN_GLOBAL_SCALE: f64 = 0.001;

/// Numeric gates used by the solver. Defaults reproduce the historical constants.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Floor applied to `globalScale` before it is used. Never below [`MIN_GLOBAL_SCALE`].
    pub min_global_scale: f64,
    /// `stretch` must exceed this for the stretch stage to run.
    pub stretch_threshold: f64,
    /// `poleVecLock` must exceed this for the pole lock stage to run.
    pub pole_lock_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_global_scale: MIN_GLOBAL_SCALE,
            stretch_threshold: 0.001,
            pole_lock_threshold: 0.001,
        }
    }
}

impl SolverConfig {
    /// Reject a floor below [`MIN_GLOBAL_SCALE`] and negative or non-finite gates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_global_scale.is_finite() || self.min_global_scale < MIN_GLOBAL_SCALE {
            return Err(ConfigError::Invalid {
                field: "min_global_scale",
                value: self.min_global_scale,
                reason: "must be finite and at least 0.001",
            });
        }
        for (field, value) in [
            ("stretch_threshold", self.stretch_threshold),
            ("pole_lock_threshold", self.pole_lock_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    value,
                    reason: "must be finite and non-negative",
                });
            }
        }
        Ok(())
    }
}

/// Configuration for a registered node type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
    pub affects: AffectsPolicy,
}

impl Config {
    /// Parse and validate.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()
    }
}
