//! Dual-confirmation match report protocol
//!
//! Two sides independently submit the same match result; the protocol commits
//! a canonical outcome only when both reports agree. Operations race freely
//! between the two reporting sides and retry on revision conflicts.

use crate::error::{PodiumError, Result};
use crate::notify::ResultNotifier;
use crate::report::state::{
    validate_win_sequence, CancelMatchResponse, CancelStatus, ConfirmedResult, MatchPhase,
    ReportScoreResponse, ReportStatus, Side,
};
use crate::report::store::{GroupSide, MatchStore, StoredMatch};
use crate::types::{MatchId, ReportedWeapon, RoundConfig, SkillRecord, UserId};
use crate::utils::{current_timestamp, generate_match_id};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity of the user submitting a report
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    pub user_id: UserId,
    /// Staff reports bypass dual confirmation
    pub staff: bool,
}

impl Reporter {
    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            staff: false,
        }
    }

    pub fn staff(user_id: UserId) -> Self {
        Self {
            user_id,
            staff: true,
        }
    }
}

/// The live, per-match dual-confirmation workflow
pub struct MatchReportProtocol {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn ResultNotifier>,
}

impl MatchReportProtocol {
    pub fn new(store: Arc<dyn MatchStore>, notifier: Arc<dyn ResultNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Create a match between two fully staffed groups.
    /// Rejects a group below `required_size` before any row is written.
    pub fn create_match(
        &self,
        alpha: GroupSide,
        bravo: GroupSide,
        round: RoundConfig,
        required_size: usize,
    ) -> Result<MatchId> {
        for side in [&alpha, &bravo] {
            if side.members.len() < required_size {
                return Err(PodiumError::GroupNotStaffed {
                    group_id: side.group_id.to_string(),
                }
                .into());
            }
        }

        let match_id = generate_match_id();
        self.store.insert_match(StoredMatch {
            match_id,
            alpha,
            bravo,
            round,
            phase: MatchPhase::Open,
            revision: 0,
        })?;

        debug!(%match_id, "created match");
        Ok(match_id)
    }

    /// Submit one side's view of a finished set.
    ///
    /// An empty `winners` array on an unreported match is a cancellation
    /// request, not an error, and routes through the cancellation path.
    pub async fn report_score(
        &self,
        match_id: MatchId,
        reporter: Reporter,
        winners: Vec<Side>,
        weapons: Vec<ReportedWeapon>,
    ) -> Result<ReportScoreResponse> {
        loop {
            let row = self
                .store
                .load_match(match_id)?
                .ok_or(PodiumError::MatchNotFound {
                    match_id: match_id.to_string(),
                })?;

            if row.phase.is_locked() {
                return Err(PodiumError::MatchLocked {
                    match_id: match_id.to_string(),
                }
                .into());
            }

            // Re-checked here as an integrity condition; the boundary owns
            // user-facing rejection.
            validate_win_sequence(&winners, &row.round)?;

            if winners.is_empty() {
                let cancel = self.cancel_match(match_id, reporter).await?;
                return Ok(ReportScoreResponse {
                    status: cancel.status.into(),
                    should_refresh_caches: cancel.should_refresh_caches,
                });
            }

            let side = row.side_of(reporter.user_id);
            if side.is_none() && !reporter.staff {
                return Err(PodiumError::ReporterNotInMatch {
                    user_id: reporter.user_id,
                    match_id: match_id.to_string(),
                }
                .into());
            }

            if reporter.staff {
                if !self.commit_result(row, winners.clone(), weapons.clone()).await? {
                    continue;
                }
                info!(%match_id, "staff report confirmed result");
                return Ok(ReportScoreResponse {
                    status: ReportStatus::Confirmed,
                    should_refresh_caches: true,
                });
            }

            let side = side.expect("non-staff reporter is a member");

            match row.phase.clone() {
                MatchPhase::Open | MatchPhase::CancelReported { .. } => {
                    // A score report supersedes a pending cancellation
                    let mut updated = row.clone();
                    updated.phase = MatchPhase::Reported {
                        side,
                        winners: winners.clone(),
                        weapons: weapons.clone(),
                        reported_at: current_timestamp(),
                    };
                    if !self.store.store_match(updated, row.revision)? {
                        continue;
                    }
                    self.store.deactivate_group(row.group_id_of(side))?;
                    debug!(%match_id, %side, "score reported, awaiting other side");
                    return Ok(ReportScoreResponse {
                        status: ReportStatus::Reported,
                        should_refresh_caches: false,
                    });
                }
                MatchPhase::Reported {
                    side: prior_side,
                    winners: prior_winners,
                    ..
                } => {
                    if prior_side == side {
                        return Ok(ReportScoreResponse {
                            status: ReportStatus::Duplicate,
                            should_refresh_caches: false,
                        });
                    }
                    if prior_winners == winners {
                        if !self.commit_result(row, winners.clone(), weapons.clone()).await? {
                            continue;
                        }
                        info!(%match_id, "both sides agree, result confirmed");
                        return Ok(ReportScoreResponse {
                            status: ReportStatus::Confirmed,
                            should_refresh_caches: true,
                        });
                    }
                    debug!(%match_id, "win sequences disagree, manual resolution required");
                    return Ok(ReportScoreResponse {
                        status: ReportStatus::Different,
                        should_refresh_caches: false,
                    });
                }
                MatchPhase::Locked { .. } => unreachable!("locked handled above"),
            }
        }
    }

    /// Request cancellation of a match that has not been scored yet
    pub async fn cancel_match(
        &self,
        match_id: MatchId,
        reporter: Reporter,
    ) -> Result<CancelMatchResponse> {
        loop {
            let row = self
                .store
                .load_match(match_id)?
                .ok_or(PodiumError::MatchNotFound {
                    match_id: match_id.to_string(),
                })?;

            let side =
                row.side_of(reporter.user_id)
                    .ok_or(PodiumError::ReporterNotInMatch {
                        user_id: reporter.user_id,
                        match_id: match_id.to_string(),
                    })?;

            match row.phase.clone() {
                // A reported score always wins over cancellation
                MatchPhase::Reported { .. } | MatchPhase::Locked { result: Some(_) } => {
                    return Ok(CancelMatchResponse {
                        status: CancelStatus::CantCancel,
                        should_refresh_caches: false,
                    });
                }
                // Already cancelled; repeating the request is a no-op
                MatchPhase::Locked { result: None } => {
                    return Ok(CancelMatchResponse {
                        status: CancelStatus::CancelConfirmed,
                        should_refresh_caches: false,
                    });
                }
                MatchPhase::Open => {
                    let mut updated = row.clone();
                    updated.phase = MatchPhase::CancelReported { side };
                    if !self.store.store_match(updated, row.revision)? {
                        continue;
                    }
                    self.store.deactivate_group(row.group_id_of(side))?;
                    debug!(%match_id, %side, "cancellation reported, awaiting other side");
                    return Ok(CancelMatchResponse {
                        status: CancelStatus::CancelReported,
                        should_refresh_caches: false,
                    });
                }
                MatchPhase::CancelReported { side: prior_side } if prior_side == side => {
                    return Ok(CancelMatchResponse {
                        status: CancelStatus::CancelReported,
                        should_refresh_caches: false,
                    });
                }
                MatchPhase::CancelReported { .. } => {
                    let mut updated = row.clone();
                    updated.phase = MatchPhase::Locked { result: None };
                    if !self.store.store_match(updated, row.revision)? {
                        continue;
                    }
                    self.store.deactivate_group(row.group_id_of(side))?;
                    self.store
                        .insert_skill_record(SkillRecord::lock_for_match(match_id))?;
                    if let Err(error) = self.notifier.match_cancelled(match_id).await {
                        warn!(%match_id, %error, "match-cancelled hook failed");
                    }
                    info!(%match_id, "both sides agree, match cancelled");
                    return Ok(CancelMatchResponse {
                        status: CancelStatus::CancelConfirmed,
                        should_refresh_caches: true,
                    });
                }
            }
        }
    }

    /// Administrative close with no rating effect
    pub fn lock_match_without_skill_change(&self, match_id: MatchId) -> Result<()> {
        loop {
            let row = self
                .store
                .load_match(match_id)?
                .ok_or(PodiumError::MatchNotFound {
                    match_id: match_id.to_string(),
                })?;

            if !row.phase.is_locked() {
                let mut updated = row.clone();
                updated.phase = MatchPhase::Locked { result: None };
                if !self.store.store_match(updated, row.revision)? {
                    continue;
                }
            }

            if !self.store.has_skill_record(match_id)? {
                self.store
                    .insert_skill_record(SkillRecord::lock_for_match(match_id))?;
            }
            info!(%match_id, "match locked without skill change");
            return Ok(());
        }
    }

    /// A match is closed exactly when any skill record exists for it
    pub fn is_match_closed(&self, match_id: MatchId) -> Result<bool> {
        self.store.has_skill_record(match_id)
    }

    /// Lock the row with a canonical result, then fire the confirmation hook.
    /// Returns false when the row moved underneath us and the caller must
    /// re-read.
    async fn commit_result(
        &self,
        row: StoredMatch,
        winners: Vec<Side>,
        weapons: Vec<ReportedWeapon>,
    ) -> Result<bool> {
        let match_id = row.match_id;
        let expected_revision = row.revision;

        let mut updated = row;
        updated.phase = MatchPhase::Locked {
            result: Some(ConfirmedResult {
                winners,
                weapons,
                confirmed_at: current_timestamp(),
            }),
        };

        if !self.store.store_match(updated, expected_revision)? {
            return Ok(false);
        }

        if let Err(error) = self.notifier.score_confirmed(match_id).await {
            warn!(%match_id, %error, "score-confirmed hook failed");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoopNotifier;
    use crate::report::store::InMemoryMatchStore;
    use crate::types::{RoundCountType, SkillOutcome};
    use uuid::Uuid;

    fn protocol() -> (MatchReportProtocol, Arc<InMemoryMatchStore>) {
        let store = Arc::new(InMemoryMatchStore::new());
        let protocol = MatchReportProtocol::new(store.clone(), Arc::new(NoopNotifier));
        (protocol, store)
    }

    fn groups() -> (GroupSide, GroupSide) {
        (
            GroupSide {
                group_id: Uuid::new_v4(),
                members: vec![1, 2, 3, 4],
            },
            GroupSide {
                group_id: Uuid::new_v4(),
                members: vec![5, 6, 7, 8],
            },
        )
    }

    fn best_of_five() -> RoundConfig {
        RoundConfig {
            count: 5,
            count_type: RoundCountType::BestOf,
        }
    }

    fn alpha_sweep() -> Vec<Side> {
        vec![Side::Alpha, Side::Alpha, Side::Alpha]
    }

    fn create(protocol: &MatchReportProtocol) -> MatchId {
        let (alpha, bravo) = groups();
        protocol
            .create_match(alpha, bravo, best_of_five(), 4)
            .unwrap()
    }

    #[test]
    fn test_create_match_rejects_understaffed_group() {
        let (protocol, _) = protocol();
        let (alpha, mut bravo) = groups();
        bravo.members.truncate(2);

        let result = protocol.create_match(alpha, bravo, best_of_five(), 4);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_first_report_deactivates_side() {
        let (protocol, store) = protocol();
        let match_id = create(&protocol);
        let alpha_group = store.load_match(match_id).unwrap().unwrap().alpha.group_id;

        let response = protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Reported);
        assert!(!response.should_refresh_caches);
        assert!(!store.group_active(alpha_group).unwrap());
    }

    #[tokio::test]
    async fn test_matching_reports_confirm() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await
            .unwrap();
        let response = protocol
            .report_score(match_id, Reporter::member(5), alpha_sweep(), vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Confirmed);
        assert!(response.should_refresh_caches);
    }

    #[tokio::test]
    async fn test_disagreeing_reports_stay_pending() {
        let (protocol, store) = protocol();
        let match_id = create(&protocol);

        protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await
            .unwrap();
        let response = protocol
            .report_score(
                match_id,
                Reporter::member(5),
                vec![Side::Bravo, Side::Bravo, Side::Bravo],
                vec![],
            )
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Different);
        // First report stays in place for manual resolution
        let row = store.load_match(match_id).unwrap().unwrap();
        assert!(matches!(row.phase, MatchPhase::Reported { side: Side::Alpha, .. }));
    }

    #[tokio::test]
    async fn test_same_side_report_is_duplicate() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await
            .unwrap();
        let response = protocol
            .report_score(match_id, Reporter::member(2), alpha_sweep(), vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Duplicate);
    }

    #[tokio::test]
    async fn test_staff_report_confirms_immediately() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        let response = protocol
            .report_score(match_id, Reporter::staff(999), alpha_sweep(), vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Confirmed);
        assert!(response.should_refresh_caches);
    }

    #[tokio::test]
    async fn test_report_after_lock_rejected() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        protocol
            .report_score(match_id, Reporter::staff(999), alpha_sweep(), vec![])
            .await
            .unwrap();
        let result = protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_win_sequence_rejected() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        // Bo5 ends at three wins; a fourth map result is impossible
        let result = protocol
            .report_score(
                match_id,
                Reporter::member(1),
                vec![Side::Alpha, Side::Alpha, Side::Alpha, Side::Bravo],
                vec![],
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_outsider_report_rejected() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        let result = protocol
            .report_score(match_id, Reporter::member(42), alpha_sweep(), vec![])
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_winners_routes_to_cancellation() {
        let (protocol, store) = protocol();
        let match_id = create(&protocol);
        let alpha_group = store.load_match(match_id).unwrap().unwrap().alpha.group_id;

        let response = protocol
            .report_score(match_id, Reporter::member(1), vec![], vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::CancelReported);
        assert!(!store.group_active(alpha_group).unwrap());
    }

    #[tokio::test]
    async fn test_cancel_confirmed_inserts_lock_record() {
        let (protocol, store) = protocol();
        let match_id = create(&protocol);

        protocol
            .cancel_match(match_id, Reporter::member(1))
            .await
            .unwrap();
        let response = protocol
            .cancel_match(match_id, Reporter::member(5))
            .await
            .unwrap();

        assert_eq!(response.status, CancelStatus::CancelConfirmed);
        assert!(response.should_refresh_caches);
        assert!(protocol.is_match_closed(match_id).unwrap());

        let records = store.skill_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, SkillOutcome::Locked);
        assert_eq!(records[0].match_id, Some(match_id));
        assert!(records[0].user_id.is_none());
        assert!(records[0].identifier.is_none());
    }

    #[tokio::test]
    async fn test_cancel_twice_from_same_side_is_idempotent() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        let first = protocol
            .cancel_match(match_id, Reporter::member(1))
            .await
            .unwrap();
        let second = protocol
            .cancel_match(match_id, Reporter::member(2))
            .await
            .unwrap();

        assert_eq!(first.status, CancelStatus::CancelReported);
        assert_eq!(second.status, first.status);
    }

    #[tokio::test]
    async fn test_cancel_after_score_report_refused() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        protocol
            .report_score(match_id, Reporter::member(1), alpha_sweep(), vec![])
            .await
            .unwrap();
        let response = protocol
            .cancel_match(match_id, Reporter::member(5))
            .await
            .unwrap();

        assert_eq!(response.status, CancelStatus::CantCancel);
    }

    #[tokio::test]
    async fn test_score_report_supersedes_pending_cancellation() {
        let (protocol, _) = protocol();
        let match_id = create(&protocol);

        protocol
            .cancel_match(match_id, Reporter::member(1))
            .await
            .unwrap();
        let response = protocol
            .report_score(match_id, Reporter::member(5), alpha_sweep(), vec![])
            .await
            .unwrap();

        assert_eq!(response.status, ReportStatus::Reported);
    }

    #[tokio::test]
    async fn test_lock_without_skill_change() {
        let (protocol, store) = protocol();
        let match_id = create(&protocol);

        protocol.lock_match_without_skill_change(match_id).unwrap();
        assert!(protocol.is_match_closed(match_id).unwrap());

        // Idempotent; no duplicate record
        protocol.lock_match_without_skill_change(match_id).unwrap();
        assert_eq!(store.skill_records().len(), 1);

        let row = store.load_match(match_id).unwrap().unwrap();
        assert!(matches!(row.phase, MatchPhase::Locked { result: None }));
    }
}
