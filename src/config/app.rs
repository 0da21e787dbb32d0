//! Main application configuration
//!
//! This module defines the primary configuration structures for the podium
//! engine, including environment variable loading, TOML loading, and
//! validation.

use crate::config::rating::RatingSettings;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingSettings,
    pub summary: SummarySettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Summarization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySettings {
    /// Ladder matches required before visible skill-point diffs are emitted
    pub sp_visibility_threshold: u32,
    /// Season written to skill records when the caller does not supply one
    pub default_season: i32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "podium".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            sp_visibility_threshold: 7,
            default_season: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(threshold) = env::var("SP_VISIBILITY_THRESHOLD") {
            config.summary.sp_visibility_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("Invalid SP_VISIBILITY_THRESHOLD value: {}", threshold))?;
        }
        if let Ok(season) = env::var("DEFAULT_SEASON") {
            config.summary.default_season = season
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_SEASON value: {}", season))?;
        }
        if let Ok(beta) = env::var("RATING_BETA") {
            config.rating.beta = beta
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_BETA value: {}", beta))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        validate_config(&config)?;
        Ok(config)
    }
}

/// Validate a full configuration tree
pub fn validate_config(config: &AppConfig) -> Result<()> {
    config.rating.validate()?;

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.service.log_level.as_str()) {
        return Err(anyhow!(
            "Invalid log level: {} (expected one of {:?})",
            config.service.log_level,
            valid_levels
        ));
    }

    Ok(())
}
