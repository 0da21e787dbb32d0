//! Dual-confirmation match reporting
//!
//! This module contains the live, per-match workflow that reconciles two
//! independently-submitted results into one authoritative outcome, plus the
//! storage seam its atomicity depends on.

pub mod protocol;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use protocol::{MatchReportProtocol, Reporter};
pub use state::{
    validate_win_sequence, CancelMatchResponse, CancelStatus, ConfirmedResult, MatchPhase,
    ReportScoreResponse, ReportStatus, Side,
};
pub use store::{GroupSide, InMemoryMatchStore, MatchStore, StoredMatch};
