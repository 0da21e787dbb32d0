//! Outbound notification hooks for confirmed protocol outcomes
//!
//! Delivery (chat messages, cache busting) lives outside this crate; the
//! protocol only fires these hooks after a match reaches a terminal state.

use crate::error::Result;
use crate::types::MatchId;
use async_trait::async_trait;

/// Trait for reacting to terminal match outcomes
#[async_trait]
pub trait ResultNotifier: Send + Sync {
    /// Fired when two reports agree (or staff confirms) and a result commits
    async fn score_confirmed(&self, match_id: MatchId) -> Result<()>;

    /// Fired when both sides confirm cancellation
    async fn match_cancelled(&self, match_id: MatchId) -> Result<()>;
}

/// Notifier that does nothing, for callers without a delivery layer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl ResultNotifier for NoopNotifier {
    async fn score_confirmed(&self, _match_id: MatchId) -> Result<()> {
        Ok(())
    }

    async fn match_cancelled(&self, _match_id: MatchId) -> Result<()> {
        Ok(())
    }
}
