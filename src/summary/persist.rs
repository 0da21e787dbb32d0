//! Summary persistence interface and implementations
//!
//! A computed summary commits in one transaction or not at all; a failure
//! leaves the tournament un-finalized so the whole pass can be retried.
//! Partial rating corruption is structurally impossible.

use crate::error::PodiumError;
use crate::summary::TournamentSummary;
use crate::types::{
    BadgeId, BadgeReceivers, Mode, Relationship, RosterIdentifier, SeedingSkill, SeedingTag,
    SkillOutcome, SkillRecord, StageId, TeamId, TournamentId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::info;

/// Placement row as written to storage, with visible diff and the serialized
/// per-set outcomes attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPlacement {
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub placement: u32,
    pub division_label: Option<String>,
    pub participant_count: u32,
    pub sp_diff: Option<i32>,
    /// JSON array of "W" / "L" / null in match-processing order
    pub set_results: String,
}

/// Badge ownership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeOwnership {
    pub tournament_id: TournamentId,
    pub badge_id: BadgeId,
    pub user_id: UserId,
}

/// Trait for committing a tournament summary
pub trait SummaryStore: Send + Sync {
    /// Write the whole summary atomically and mark the tournament finalized
    fn add_summary(
        &self,
        tournament_id: TournamentId,
        summary: &TournamentSummary,
        season: Option<i32>,
        badge_receivers: Option<&[BadgeReceivers]>,
    ) -> crate::error::Result<()>;

    /// Whether a tournament's summary has been committed
    fn is_finalized(&self, tournament_id: TournamentId) -> crate::error::Result<bool>;
}

#[derive(Debug, Default, Clone)]
struct PairTotals {
    map_wins: u32,
    map_losses: u32,
    set_wins: u32,
    set_losses: u32,
}

/// Everything the in-memory store holds; cloned wholesale to stage a
/// transaction and swapped back only on success
#[derive(Debug, Default, Clone)]
struct SummaryState {
    skill_records: Vec<SkillRecord>,
    roster_members: HashSet<(RosterIdentifier, UserId)>,
    seeding: HashMap<(UserId, SeedingTag), SeedingSkill>,
    map_results: HashMap<(UserId, StageId, Mode), (u32, u32)>,
    player_results: HashMap<(UserId, UserId, Relationship), PairTotals>,
    badges: Vec<BadgeOwnership>,
    placements: Vec<PersistedPlacement>,
    finalized: HashSet<TournamentId>,
}

/// In-memory summary store, used in tests and as the reference implementation
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    state: RwLock<SummaryState>,
    default_season: i32,
}

impl InMemorySummaryStore {
    pub fn new(default_season: i32) -> Self {
        Self {
            state: RwLock::new(SummaryState::default()),
            default_season,
        }
    }

    /// All skill records appended so far (for testing)
    pub fn skill_records(&self) -> Vec<SkillRecord> {
        self.state
            .read()
            .map(|state| state.skill_records.clone())
            .unwrap_or_default()
    }

    /// All placement rows written so far (for testing)
    pub fn placements(&self) -> Vec<PersistedPlacement> {
        self.state
            .read()
            .map(|state| state.placements.clone())
            .unwrap_or_default()
    }

    /// All badge ownership rows written so far (for testing)
    pub fn badges(&self) -> Vec<BadgeOwnership> {
        self.state
            .read()
            .map(|state| state.badges.clone())
            .unwrap_or_default()
    }

    /// Membership join rows written for roster identifiers (for testing)
    pub fn roster_member_rows(&self) -> Vec<(RosterIdentifier, UserId)> {
        self.state
            .read()
            .map(|state| state.roster_members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Accumulated (wins, losses) for a user on a stage/mode
    pub fn map_result(&self, user_id: UserId, stage_id: StageId, mode: &str) -> (u32, u32) {
        self.state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .map_results
                    .get(&(user_id, stage_id, mode.to_string()))
                    .copied()
            })
            .unwrap_or((0, 0))
    }

    /// Accumulated pair totals (map wins, map losses, set wins, set losses)
    pub fn player_result(
        &self,
        owner_id: UserId,
        other_id: UserId,
        relationship: Relationship,
    ) -> (u32, u32, u32, u32) {
        self.state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .player_results
                    .get(&(owner_id, other_id, relationship))
                    .cloned()
            })
            .map(|totals| {
                (
                    totals.map_wins,
                    totals.map_losses,
                    totals.set_wins,
                    totals.set_losses,
                )
            })
            .unwrap_or((0, 0, 0, 0))
    }

    /// Current seeding row for a user and tag (for testing)
    pub fn seeding(&self, user_id: UserId, tag: SeedingTag) -> Option<SeedingSkill> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.seeding.get(&(user_id, tag)).cloned())
    }
}

impl SummaryStore for InMemorySummaryStore {
    fn add_summary(
        &self,
        tournament_id: TournamentId,
        summary: &TournamentSummary,
        season: Option<i32>,
        badge_receivers: Option<&[BadgeReceivers]>,
    ) -> crate::error::Result<()> {
        let mut state = self.state.write().map_err(|_| PodiumError::Internal {
            message: "failed to acquire summary state write lock".to_string(),
        })?;

        if state.finalized.contains(&tournament_id) {
            return Err(PodiumError::Storage {
                message: format!("tournament {} is already finalized", tournament_id),
            }
            .into());
        }

        // Stage against a copy; the live state only changes on full success
        let mut staged = state.clone();
        let season = season.unwrap_or(self.default_season);

        for row in &summary.skills {
            let prior_max = staged
                .skill_records
                .iter()
                .filter(|record| {
                    record.user_id == row.user_id && record.identifier == row.identifier
                })
                .map(|record| record.matches_count)
                .max()
                .unwrap_or(0);

            match (&row.user_id, &row.identifier) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(PodiumError::Storage {
                        message: "skill row must be keyed by exactly one of user or roster"
                            .to_string(),
                    }
                    .into());
                }
            }

            staged.skill_records.push(SkillRecord {
                user_id: row.user_id,
                identifier: row.identifier.clone(),
                tournament_id: Some(tournament_id),
                match_id: None,
                season: Some(season),
                matches_count: row.matches_count + prior_max,
                outcome: SkillOutcome::rated(row.rating),
            });

            if let Some(identifier) = &row.identifier {
                // Duplicate membership rows collapse into the existing ones
                for user_id in identifier.user_ids() {
                    staged.roster_members.insert((identifier.clone(), user_id));
                }
            }
        }

        for row in &summary.seeding_skills {
            staged.seeding.insert((row.user_id, row.tag), row.clone());
        }

        for delta in &summary.map_result_deltas {
            let totals = staged
                .map_results
                .entry((delta.user_id, delta.stage_id, delta.mode.clone()))
                .or_default();
            totals.0 += delta.wins;
            totals.1 += delta.losses;
        }

        for delta in &summary.player_result_deltas {
            let totals = staged
                .player_results
                .entry((delta.owner_id, delta.other_id, delta.relationship))
                .or_default();
            totals.map_wins += delta.map_wins;
            totals.map_losses += delta.map_losses;
            totals.set_wins += delta.set_wins;
            totals.set_losses += delta.set_losses;
        }

        if let Some(receivers) = badge_receivers {
            for receiver in receivers {
                for user_id in &receiver.user_ids {
                    staged.badges.push(BadgeOwnership {
                        tournament_id,
                        badge_id: receiver.badge_id,
                        user_id: *user_id,
                    });
                }
            }
        }

        for placement in &summary.placements {
            let entries = summary.set_results.get(&placement.user_id);
            let played = entries
                .map(|entries| entries.iter().any(Option::is_some))
                .unwrap_or(false);
            if !played {
                // Pure substitutes with no W/L get no placement row
                continue;
            }

            let serialized =
                serde_json::to_string(entries.expect("played implies entries"))?;
            staged.placements.push(PersistedPlacement {
                tournament_id,
                user_id: placement.user_id,
                team_id: placement.team_id,
                placement: placement.placement,
                division_label: placement.division_label.clone(),
                participant_count: placement.participant_count,
                sp_diff: summary.sp_diffs.get(&placement.user_id).copied(),
                set_results: serialized,
            });
        }

        staged.finalized.insert(tournament_id);
        *state = staged;

        info!(%tournament_id, skills = summary.skills.len(), "summary committed, tournament finalized");
        Ok(())
    }

    fn is_finalized(&self, tournament_id: TournamentId) -> crate::error::Result<bool> {
        let state = self.state.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire summary state read lock".to_string(),
        })?;

        Ok(state.finalized.contains(&tournament_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapResultDelta, PlacementRow, Rating, SetOutcome, SkillRow};
    use uuid::Uuid;

    fn summary_with_skills(skills: Vec<SkillRow>) -> TournamentSummary {
        TournamentSummary {
            skills,
            ..TournamentSummary::default()
        }
    }

    fn user_skill(user_id: UserId, matches_count: u32) -> SkillRow {
        SkillRow {
            user_id: Some(user_id),
            identifier: None,
            rating: Rating::default(),
            matches_count,
        }
    }

    #[test]
    fn test_matches_count_is_running_total_across_seasons() {
        let store = InMemorySummaryStore::new(0);

        let first = summary_with_skills(vec![user_skill(1, 3)]);
        store
            .add_summary(Uuid::new_v4(), &first, Some(1), None)
            .unwrap();

        // Next season starts; the count keeps climbing
        let second = summary_with_skills(vec![user_skill(1, 2)]);
        store
            .add_summary(Uuid::new_v4(), &second, Some(2), None)
            .unwrap();

        let records = store.skill_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].matches_count, 3);
        assert_eq!(records[1].matches_count, 5);
        assert_eq!(records[1].season, Some(2));
    }

    #[test]
    fn test_roster_rows_write_membership_joins() {
        let store = InMemorySummaryStore::new(0);
        let identifier = RosterIdentifier::from_users(&[1, 2, 3, 4]);

        let summary = summary_with_skills(vec![SkillRow {
            user_id: None,
            identifier: Some(identifier.clone()),
            rating: Rating::default(),
            matches_count: 1,
        }]);
        store
            .add_summary(Uuid::new_v4(), &summary, None, None)
            .unwrap();

        let mut rows = store.roster_member_rows();
        rows.sort_by_key(|(_, user_id)| *user_id);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|(id, _)| *id == identifier));

        // Re-inserting the same roster is a no-op on the join rows
        let store_state_before = store.roster_member_rows().len();
        let again = summary_with_skills(vec![SkillRow {
            user_id: None,
            identifier: Some(identifier),
            rating: Rating::default(),
            matches_count: 1,
        }]);
        store
            .add_summary(Uuid::new_v4(), &again, None, None)
            .unwrap();
        assert_eq!(store.roster_member_rows().len(), store_state_before);
    }

    #[test]
    fn test_map_results_upsert_additively() {
        let store = InMemorySummaryStore::new(0);

        let delta = |wins, losses| TournamentSummary {
            map_result_deltas: vec![MapResultDelta {
                user_id: 1,
                stage_id: 10,
                mode: "SZ".to_string(),
                wins,
                losses,
            }],
            ..TournamentSummary::default()
        };

        store
            .add_summary(Uuid::new_v4(), &delta(2, 1), None, None)
            .unwrap();
        store
            .add_summary(Uuid::new_v4(), &delta(1, 3), None, None)
            .unwrap();

        assert_eq!(store.map_result(1, 10, "SZ"), (3, 4));
    }

    #[test]
    fn test_seeding_upsert_last_write_wins() {
        let store = InMemorySummaryStore::new(0);

        let seeding = |mu: f64| TournamentSummary {
            seeding_skills: vec![SeedingSkill {
                user_id: 1,
                rating: Rating { mu, sigma: 100.0 },
                matches_count: 1,
                tag: SeedingTag::Ranked,
            }],
            ..TournamentSummary::default()
        };

        store
            .add_summary(Uuid::new_v4(), &seeding(1400.0), None, None)
            .unwrap();
        store
            .add_summary(Uuid::new_v4(), &seeding(1600.0), None, None)
            .unwrap();

        let row = store.seeding(1, SeedingTag::Ranked).unwrap();
        assert_eq!(row.rating.mu, 1600.0);
    }

    #[test]
    fn test_pure_substitute_gets_no_placement_row() {
        let store = InMemorySummaryStore::new(0);
        let team_id = Uuid::new_v4();

        let placement = |user_id| PlacementRow {
            user_id,
            team_id,
            placement: 2,
            division_label: None,
            participant_count: 8,
        };

        let mut summary = TournamentSummary {
            placements: vec![placement(1), placement(2)],
            ..TournamentSummary::default()
        };
        summary
            .set_results
            .insert(1, vec![Some(SetOutcome::Win), None]);
        // User 2 only ever sat out resolved rosters
        summary.set_results.insert(2, vec![None, None]);

        store
            .add_summary(Uuid::new_v4(), &summary, None, None)
            .unwrap();

        let placements = store.placements();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].user_id, 1);
        assert_eq!(placements[0].set_results, "[\"W\",null]");
    }

    #[test]
    fn test_placement_rows_carry_sp_diff() {
        let store = InMemorySummaryStore::new(0);
        let team_id = Uuid::new_v4();

        let mut summary = TournamentSummary {
            placements: vec![PlacementRow {
                user_id: 1,
                team_id,
                placement: 1,
                division_label: Some("Div 1".to_string()),
                participant_count: 4,
            }],
            ..TournamentSummary::default()
        };
        summary.set_results.insert(1, vec![Some(SetOutcome::Win)]);
        summary.sp_diffs.insert(1, 12);

        store
            .add_summary(Uuid::new_v4(), &summary, None, None)
            .unwrap();

        let placements = store.placements();
        assert_eq!(placements[0].sp_diff, Some(12));
        assert_eq!(placements[0].division_label.as_deref(), Some("Div 1"));
    }

    #[test]
    fn test_badges_inserted_per_user() {
        let store = InMemorySummaryStore::new(0);
        let badge_id = Uuid::new_v4();
        let tournament_id = Uuid::new_v4();

        store
            .add_summary(
                tournament_id,
                &TournamentSummary::default(),
                None,
                Some(&[BadgeReceivers {
                    badge_id,
                    user_ids: vec![1, 2],
                }]),
            )
            .unwrap();

        let badges = store.badges();
        assert_eq!(badges.len(), 2);
        assert!(badges.iter().all(|badge| badge.badge_id == badge_id));
        assert!(badges
            .iter()
            .all(|badge| badge.tournament_id == tournament_id));
    }

    #[test]
    fn test_failed_commit_leaves_nothing_behind() {
        let store = InMemorySummaryStore::new(0);
        let tournament_id = Uuid::new_v4();

        // Invalid row: keyed by neither user nor roster
        let summary = summary_with_skills(vec![
            user_skill(1, 1),
            SkillRow {
                user_id: None,
                identifier: None,
                rating: Rating::default(),
                matches_count: 1,
            },
        ]);

        assert!(store
            .add_summary(tournament_id, &summary, None, None)
            .is_err());
        assert!(store.skill_records().is_empty());
        assert!(!store.is_finalized(tournament_id).unwrap());
    }

    #[test]
    fn test_double_finalize_rejected() {
        let store = InMemorySummaryStore::new(0);
        let tournament_id = Uuid::new_v4();

        store
            .add_summary(tournament_id, &TournamentSummary::default(), None, None)
            .unwrap();
        assert!(store.is_finalized(tournament_id).unwrap());

        let result = store.add_summary(tournament_id, &TournamentSummary::default(), None, None);
        assert!(result.is_err());
    }
}
