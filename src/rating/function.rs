//! Rating function trait and test implementations
//!
//! The mean/variance update rule is an injected external function; nothing in
//! the engine assumes anything about it beyond this interface.

use crate::error::{PodiumError, Result};
use crate::types::Rating;

/// Trait for the injected rating update function.
///
/// `rate` receives two or more competing groups ordered by final placement,
/// best first, and returns updated ratings in the same shape. `priors`, when
/// supplied, carries one secondary rating per slot that implementations may
/// blend into the corresponding group rating before updating.
pub trait RatingFunction: Send + Sync {
    /// Compute updated ratings for competing groups
    fn rate(&self, teams: &[Vec<Rating>], priors: Option<&[Vec<Rating>]>)
        -> Result<Vec<Vec<Rating>>>;

    /// Monotonic scalar transform used for display and visible diffs
    fn ordinal(&self, rating: &Rating) -> f64;

    /// Rating assigned to users and rosters with no history
    fn initial_rating(&self) -> Rating;
}

/// Deterministic rating function for tests: the first-placed group gains a
/// fixed amount of mu, every other group loses it, sigma shrinks slightly.
#[derive(Debug)]
pub struct FixedDeltaRatingFunction {
    delta: f64,
    initial: Rating,
    calls: std::sync::Mutex<usize>,
}

impl FixedDeltaRatingFunction {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            initial: Rating::default(),
            calls: std::sync::Mutex::new(0),
        }
    }

    /// Number of `rate` invocations made (for testing)
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| *calls).unwrap_or(0)
    }
}

impl Default for FixedDeltaRatingFunction {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl RatingFunction for FixedDeltaRatingFunction {
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
        if let Some(priors) = priors {
            if priors.len() != teams.len() {
                return Err(PodiumError::RatingCalculationFailed {
                    reason: "priors shape does not match teams".to_string(),
                }
                .into());
            }
        }

        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }

        Ok(teams
            .iter()
            .enumerate()
            .map(|(place, team)| {
                let delta = if place == 0 { self.delta } else { -self.delta };
                team.iter()
                    .map(|rating| Rating {
                        mu: rating.mu + delta,
                        sigma: (rating.sigma - 1.0).max(1.0),
                    })
                    .collect()
            })
            .collect())
    }

    fn ordinal(&self, rating: &Rating) -> f64 {
        rating.mu
    }

    fn initial_rating(&self) -> Rating {
        self.initial
    }
}
