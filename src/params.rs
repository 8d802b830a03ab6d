//! Bell observer parameters
//!
//! Every tuning constant of the estimator lives here so runs are reproducible
//! and can be varied from a TOML file.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrikeError};
use crate::window::RollingLinearFit;

/// How the torque constant follows the apparent value seen in each sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TorquePolicy {
    /// Move a fixed step toward the apparent value.
    Step { step: f64 },
    /// Exponential blend: `mg_i = weight * mg_i + (1 - weight) * apparent`.
    Blend { weight: f64 },
}

impl TorquePolicy {
    /// Apply the policy and return the new torque constant.
    pub fn adapt(&self, current: f64, apparent: f64) -> f64 {
        match *self {
            Self::Step { step } => {
                if apparent > current {
                    current + step
                } else {
                    current - step
                }
            }
            Self::Blend { weight } => weight * current + (1.0 - weight) * apparent,
        }
    }
}

impl Default for TorquePolicy {
    fn default() -> Self {
        Self::Step { step: 0.001 }
    }
}

/// Parameters for the bell observer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BellParams {
    /// Samples kept by the acceleration line fit
    pub window_capacity: usize,
    /// Time gap [s] above which the stream is treated as a dropout
    pub dropout_gap: f64,
    /// Measured rate [rad/s] above which corrections are applied
    pub min_correction_rate: f64,
    /// Minimum |sin(theta)| for torque adaptation
    pub min_sin_theta: f64,
    /// Angle scale applied at an acceleration zero-crossing
    pub bdc_attenuation: f64,
    /// Weight of the model forecast in the rate blend (0 = trust the gyro)
    pub alpha_omega: f64,
    /// Torque constant [1/s^2] assumed after init and reset
    pub initial_torque: f64,
    /// Angle [rad] assumed after init and reset (bell up at the balance)
    pub rest_angle: f64,
    pub torque_policy: TorquePolicy,
}

impl BellParams {
    /// Create default parameters matching the reference tuning
    pub fn default_params() -> Self {
        Self {
            window_capacity: RollingLinearFit::DEFAULT_CAPACITY,
            dropout_gap: 1.0,
            min_correction_rate: 5.0,
            min_sin_theta: 0.2,
            bdc_attenuation: 0.9,
            alpha_omega: 0.1,
            initial_torque: 12.0,
            rest_angle: PI,
            torque_policy: TorquePolicy::default(),
        }
    }

    /// Parse parameters from TOML. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: Self = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(StrikeError::invalid_config(
                "window_capacity must be at least 1",
            ));
        }

        let finite = [
            ("dropout_gap", self.dropout_gap),
            ("min_correction_rate", self.min_correction_rate),
            ("min_sin_theta", self.min_sin_theta),
            ("bdc_attenuation", self.bdc_attenuation),
            ("alpha_omega", self.alpha_omega),
            ("initial_torque", self.initial_torque),
            ("rest_angle", self.rest_angle),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(StrikeError::invalid_config(format!(
                "{name} must be finite"
            )));
        }

        if self.dropout_gap <= 0.0 {
            return Err(StrikeError::invalid_config("dropout_gap must be > 0"));
        }
        if self.min_correction_rate < 0.0 {
            return Err(StrikeError::invalid_config(
                "min_correction_rate must be >= 0",
            ));
        }
        if !(0.0..1.0).contains(&self.min_sin_theta) {
            return Err(StrikeError::invalid_config(
                "min_sin_theta must be in [0, 1)",
            ));
        }
        if !(self.bdc_attenuation > 0.0 && self.bdc_attenuation <= 1.0) {
            return Err(StrikeError::invalid_config(
                "bdc_attenuation must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_omega) {
            return Err(StrikeError::invalid_config(
                "alpha_omega must be in [0, 1]",
            ));
        }

        match self.torque_policy {
            TorquePolicy::Step { step } if !(step.is_finite() && step > 0.0) => Err(
                StrikeError::invalid_config("torque step must be finite and > 0"),
            ),
            TorquePolicy::Blend { weight } if !(0.0..=1.0).contains(&weight) => Err(
                StrikeError::invalid_config("torque blend weight must be in [0, 1]"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for BellParams {
    fn default() -> Self {
        Self::default_params()
    }
}
