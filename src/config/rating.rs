//! Rating system configuration

use serde::{Deserialize, Serialize};

/// Weng-Lin parameters plus the initial rating handed to new keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSettings {
    /// Skill-class width of the underlying rating model
    pub beta: f64,
    /// Numerical floor for uncertainty updates
    pub uncertainty_tolerance: f64,
    /// Initial mean for users and rosters with no history
    pub initial_mu: f64,
    /// Initial uncertainty for users and rosters with no history
    pub initial_sigma: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            beta: 200.0,
            uncertainty_tolerance: 0.0001,
            initial_mu: 1500.0,
            initial_sigma: 200.0,
        }
    }
}

impl RatingSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.beta <= 0.0 {
            return Err(crate::error::PodiumError::Configuration {
                message: "beta must be positive".to_string(),
            }
            .into());
        }

        if self.uncertainty_tolerance < 0.0 {
            return Err(crate::error::PodiumError::Configuration {
                message: "uncertainty tolerance must be non-negative".to_string(),
            }
            .into());
        }

        if self.initial_sigma <= 0.0 {
            return Err(crate::error::PodiumError::Configuration {
                message: "initial sigma must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
