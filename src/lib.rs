//! Podium - competitive ladder and tournament engine
//!
//! This crate provides dual-confirmation match reporting and tournament
//! summarization: skill-rating deltas, head-to-head statistics, and
//! placement records, committed atomically per tournament.

pub mod config;
pub mod error;
pub mod notify;
pub mod rating;
pub mod report;
pub mod summary;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{PodiumError, Result};
pub use types::*;

// Re-export key components
pub use notify::ResultNotifier;
pub use rating::{RatingFunction, RatingReader};
pub use report::{MatchReportProtocol, Reporter};
pub use summary::{tournament_summary, SummaryInputs, SummaryStore, TournamentSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
