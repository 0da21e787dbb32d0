//! Per-match report state machine types
//!
//! States: OPEN -> REPORTED(side) -> {CONFIRMED | DIFFERENT | DUPLICATE} ->
//! LOCKED, with a parallel cancellation path OPEN -> CANCEL_REPORTED(side) ->
//! {CANCEL_CONFIRMED | CANT_CANCEL}. A pending report or cancellation waits
//! indefinitely for the opposing action; there is no timeout.

use crate::error::{PodiumError, Result};
use crate::types::{ReportedWeapon, RoundConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a match a group occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Alpha,
    Bravo,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Alpha => Side::Bravo,
            Side::Bravo => Side::Alpha,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Alpha => write!(f, "Alpha"),
            Side::Bravo => write!(f, "Bravo"),
        }
    }
}

/// Canonical result committed once both sides agree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedResult {
    pub winners: Vec<Side>,
    pub weapons: Vec<ReportedWeapon>,
    pub confirmed_at: DateTime<Utc>,
}

/// Live phase of one match's report workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchPhase {
    /// No report received yet
    Open,
    /// One side has reported a score; waiting for the other side
    Reported {
        side: Side,
        winners: Vec<Side>,
        weapons: Vec<ReportedWeapon>,
        reported_at: DateTime<Utc>,
    },
    /// One side has requested cancellation; waiting for the other side
    CancelReported { side: Side },
    /// Terminal. `result` is None when the match was cancelled.
    Locked { result: Option<ConfirmedResult> },
}

impl MatchPhase {
    pub fn is_locked(&self) -> bool {
        matches!(self, MatchPhase::Locked { .. })
    }
}

/// Status returned by `report_score`. An empty winners array routes through
/// the cancellation path, so its statuses surface here as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Reported,
    Confirmed,
    Different,
    Duplicate,
    CancelReported,
    CancelConfirmed,
    CantCancel,
}

impl From<CancelStatus> for ReportStatus {
    fn from(status: CancelStatus) -> Self {
        match status {
            CancelStatus::CancelReported => ReportStatus::CancelReported,
            CancelStatus::CancelConfirmed => ReportStatus::CancelConfirmed,
            CancelStatus::CantCancel => ReportStatus::CantCancel,
        }
    }
}

/// Response of `report_score`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScoreResponse {
    pub status: ReportStatus,
    pub should_refresh_caches: bool,
}

/// Status returned by `cancel_match`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelStatus {
    CancelReported,
    CancelConfirmed,
    CantCancel,
}

/// Response of `cancel_match`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMatchResponse {
    pub status: CancelStatus,
    pub should_refresh_caches: bool,
}

/// Reject win sequences that continue after the set mathematically ended,
/// or that cannot fit the round at all.
pub fn validate_win_sequence(winners: &[Side], round: &RoundConfig) -> Result<()> {
    if winners.len() > round.count as usize {
        return Err(PodiumError::InvalidWinSequence {
            reason: format!(
                "{} map results reported for a round of {}",
                winners.len(),
                round.count
            ),
        }
        .into());
    }

    let needed = round.wins_needed();
    let mut alpha_wins = 0u32;
    let mut bravo_wins = 0u32;

    for (index, winner) in winners.iter().enumerate() {
        if alpha_wins >= needed || bravo_wins >= needed {
            return Err(PodiumError::InvalidWinSequence {
                reason: format!("map result at position {} comes after the set ended", index),
            }
            .into());
        }
        match winner {
            Side::Alpha => alpha_wins += 1,
            Side::Bravo => bravo_wins += 1,
        }
    }

    Ok(())
}
