//! Weng-Lin (OpenSkill) rating function implementation
//!
//! This module provides the production implementation of the injected rating
//! function using the Weng-Lin algorithm from the skillratings crate.

use crate::config::rating::RatingSettings;
use crate::error::{PodiumError, Result};
use crate::rating::function::RatingFunction;
use crate::types::Rating;
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::{weng_lin_multi_team, WengLinConfig, WengLinRating};
use skillratings::MultiTeamOutcome;

/// Configuration for the Weng-Lin rating function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WengLinSettings {
    /// Core Weng-Lin parameters
    pub weng_lin_config: WengLinConfig,
    /// Initial rating for new users and rosters
    pub initial_mu: f64,
    /// Initial uncertainty for new users and rosters
    pub initial_sigma: f64,
}

impl Default for WengLinSettings {
    fn default() -> Self {
        Self {
            weng_lin_config: WengLinConfig {
                beta: 200.0,
                uncertainty_tolerance: 0.0001,
            },
            initial_mu: 1500.0,
            initial_sigma: 200.0,
        }
    }
}

impl From<&RatingSettings> for WengLinSettings {
    fn from(settings: &RatingSettings) -> Self {
        Self {
            weng_lin_config: WengLinConfig {
                beta: settings.beta,
                uncertainty_tolerance: settings.uncertainty_tolerance,
            },
            initial_mu: settings.initial_mu,
            initial_sigma: settings.initial_sigma,
        }
    }
}

impl WengLinSettings {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.weng_lin_config.beta <= 0.0 {
            return Err(PodiumError::Configuration {
                message: "beta must be positive".to_string(),
            }
            .into());
        }

        if self.weng_lin_config.uncertainty_tolerance < 0.0 {
            return Err(PodiumError::Configuration {
                message: "uncertainty tolerance must be non-negative".to_string(),
            }
            .into());
        }

        if self.initial_sigma <= 0.0 {
            return Err(PodiumError::Configuration {
                message: "initial sigma must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Weng-Lin rating function implementation
#[derive(Debug)]
pub struct WengLinRatingFunction {
    settings: WengLinSettings,
}

impl WengLinRatingFunction {
    /// Create a new Weng-Lin rating function
    pub fn new(settings: WengLinSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self { settings })
    }

    /// Blend each slot's rating with its prior by averaging mean and
    /// uncertainty, keeping roster continuity while acknowledging current
    /// player strength for newly-formed rosters.
    fn blend(teams: &[Vec<Rating>], priors: &[Vec<Rating>]) -> Result<Vec<Vec<Rating>>> {
        if priors.len() != teams.len()
            || teams
                .iter()
                .zip(priors)
                .any(|(team, prior)| team.len() != prior.len())
        {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "priors shape does not match teams".to_string(),
            }
            .into());
        }

        Ok(teams
            .iter()
            .zip(priors)
            .map(|(team, prior)| {
                team.iter()
                    .zip(prior)
                    .map(|(rating, prior)| Rating {
                        mu: (rating.mu + prior.mu) / 2.0,
                        sigma: (rating.sigma + prior.sigma) / 2.0,
                    })
                    .collect()
            })
            .collect())
    }
}

impl RatingFunction for WengLinRatingFunction {
    fn rate(
        &self,
        teams: &[Vec<Rating>],
        priors: Option<&[Vec<Rating>]>,
    ) -> Result<Vec<Vec<Rating>>> {
        if teams.len() < 2 {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "at least two competing groups are required".to_string(),
            }
            .into());
        }
        if teams.iter().any(|team| team.is_empty()) {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "empty group passed to rating function".to_string(),
            }
            .into());
        }

        let effective = match priors {
            Some(priors) => Self::blend(teams, priors)?,
            None => teams.to_vec(),
        };

        let weng_lin_teams: Vec<Vec<WengLinRating>> = effective
            .iter()
            .map(|team| team.iter().map(|rating| (*rating).into()).collect())
            .collect();

        // Groups arrive ordered by final placement, best first
        let teams_with_outcomes: Vec<(&[WengLinRating], MultiTeamOutcome)> = weng_lin_teams
            .iter()
            .enumerate()
            .map(|(place, team)| (team.as_slice(), MultiTeamOutcome::new(place + 1)))
            .collect();

        let updated = weng_lin_multi_team(&teams_with_outcomes, &self.settings.weng_lin_config);

        if updated.len() != teams.len() {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "rating update returned wrong number of groups".to_string(),
            }
            .into());
        }

        Ok(updated
            .into_iter()
            .map(|team| team.into_iter().map(Rating::from).collect())
            .collect())
    }

    fn ordinal(&self, rating: &Rating) -> f64 {
        rating.mu - 3.0 * rating.sigma
    }

    fn initial_rating(&self) -> Rating {
        Rating {
            mu: self.settings.initial_mu,
            sigma: self.settings.initial_sigma,
        }
    }
}
