//! Error types for the ladder and tournament engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Protocol outcomes (DIFFERENT, DUPLICATE, CANT_CANCEL)
//! are typed statuses, not errors; only genuine failures live here.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific reporting and summarization scenarios
#[derive(Debug, thiserror::Error)]
pub enum PodiumError {
    #[error("invalid win sequence: {reason}")]
    InvalidWinSequence { reason: String },

    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("match already locked: {match_id}")]
    MatchLocked { match_id: String },

    #[error("reporter {user_id} is not part of match {match_id}")]
    ReporterNotInMatch { user_id: u32, match_id: String },

    #[error("corrupt match data: {reason}")]
    CorruptMatchData { reason: String },

    #[error("group not fully staffed: {group_id}")]
    GroupNotStaffed { group_id: String },

    #[error("rating calculation failed: {reason}")]
    RatingCalculationFailed { reason: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("internal service error: {message}")]
    Internal { message: String },
}
