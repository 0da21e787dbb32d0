//! Common types used throughout the ladder and tournament engine

use crate::error::{PodiumError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::WengLinRating;
use uuid::Uuid;

/// Unique identifier for users
pub type UserId = u32;

/// Unique identifier for teams/groups
pub type TeamId = Uuid;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Unique identifier for tournaments
pub type TournamentId = Uuid;

/// Unique identifier for badges
pub type BadgeId = Uuid;

/// Stage (map) identifier
pub type StageId = u32;

/// Game mode tag, opaque to the engine
pub type Mode = String;

/// Skill rating pair consumed and produced by the rating function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            mu: 1500.0,
            sigma: 200.0,
        }
    }
}

impl From<WengLinRating> for Rating {
    fn from(rating: WengLinRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<Rating> for WengLinRating {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

/// Canonical string identifying one specific team lineup.
///
/// Built by sorting the roster's user ids ascending and joining them,
/// so it is invariant under permutation of the input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterIdentifier(String);

impl RosterIdentifier {
    pub fn from_users(ids: &[UserId]) -> Self {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        Self(
            sorted
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("-"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The roster's user ids, recovered from the canonical form
    pub fn user_ids(&self) -> Vec<UserId> {
        self.0
            .split('-')
            .filter_map(|part| part.parse().ok())
            .collect()
    }
}

impl std::fmt::Display for RosterIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of a finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOpponent {
    pub team_id: TeamId,
    pub score: u32,
    pub won: bool,
    pub dropped_out: bool,
    /// Roster override for matches voided before any map completed
    pub active_roster: Option<Vec<UserId>>,
    /// Full member list, including players who never entered a map
    pub members: Vec<UserId>,
}

/// One participant entry on a played map, tagged by team
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapParticipant {
    pub user_id: UserId,
    pub team_id: TeamId,
}

/// One completed map within a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayedMap {
    pub stage_id: StageId,
    pub mode: Mode,
    pub participants: Vec<MapParticipant>,
    pub winner_team_id: TeamId,
}

/// How the round's map count is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundCountType {
    BestOf,
    PlayAll,
}

/// Round configuration, used to detect early termination
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoundConfig {
    pub count: u32,
    pub count_type: RoundCountType,
}

impl RoundConfig {
    /// Map wins required to mathematically end the set
    pub fn wins_needed(&self) -> u32 {
        match self.count_type {
            RoundCountType::BestOf => self.count / 2 + 1,
            RoundCountType::PlayAll => self.count,
        }
    }
}

/// One finished set between two opponents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub opponent_one: MatchOpponent,
    pub opponent_two: MatchOpponent,
    /// Ordered list of completed maps
    pub maps: Vec<PlayedMap>,
    pub round: RoundConfig,
    pub finished_at: DateTime<Utc>,
}

impl MatchResult {
    /// The winning side. Exactly one opponent must carry the win flag.
    pub fn winner(&self) -> Result<&MatchOpponent> {
        match (self.opponent_one.won, self.opponent_two.won) {
            (true, false) => Ok(&self.opponent_one),
            (false, true) => Ok(&self.opponent_two),
            _ => Err(PodiumError::CorruptMatchData {
                reason: format!("match {} does not have exactly one winner", self.match_id),
            }
            .into()),
        }
    }

    /// The losing side
    pub fn loser(&self) -> Result<&MatchOpponent> {
        match (self.opponent_one.won, self.opponent_two.won) {
            (true, false) => Ok(&self.opponent_two),
            (false, true) => Ok(&self.opponent_one),
            _ => Err(PodiumError::CorruptMatchData {
                reason: format!("match {} does not have exactly one winner", self.match_id),
            }
            .into()),
        }
    }

    /// Whether the set stopped before either side reached the required wins
    pub fn ended_early(&self) -> bool {
        let top_score = self.opponent_one.score.max(self.opponent_two.score);
        top_score < self.round.wins_needed()
    }

    /// Whether either side dropped out mid-set
    pub fn had_dropout(&self) -> bool {
        self.opponent_one.dropped_out || self.opponent_two.dropped_out
    }

    /// Rating inclusion rule: a set is wholly included or wholly excluded.
    /// Early-ended sets count only when caused by a dropout.
    pub fn counts_for_rating(&self) -> bool {
        !self.ended_early() || self.had_dropout()
    }
}

/// Terminal rating outcome attached to a persisted skill record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome")]
pub enum SkillOutcome {
    /// A real rating snapshot
    Rated { mu: f64, sigma: f64 },
    /// Match closed with no rating effect
    Locked,
}

impl SkillOutcome {
    pub fn rated(rating: Rating) -> Self {
        Self::Rated {
            mu: rating.mu,
            sigma: rating.sigma,
        }
    }
}

/// Persisted skill snapshot, keyed by either a user id or a roster identifier.
/// Append-only; never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    pub user_id: Option<UserId>,
    pub identifier: Option<RosterIdentifier>,
    pub tournament_id: Option<TournamentId>,
    pub match_id: Option<MatchId>,
    pub season: Option<i32>,
    /// Running total across all seasons for this key
    pub matches_count: u32,
    pub outcome: SkillOutcome,
}

impl SkillRecord {
    /// Lock record marking a match as closed with no rating effect
    pub fn lock_for_match(match_id: MatchId) -> Self {
        Self {
            user_id: None,
            identifier: None,
            tournament_id: None,
            match_id: Some(match_id),
            season: None,
            matches_count: 0,
            outcome: SkillOutcome::Locked,
        }
    }
}

/// Flat skill delta row produced by one summarization pass.
/// `matches_count` is the number of sets processed for the key in this pass;
/// persistence folds it into the running total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRow {
    pub user_id: Option<UserId>,
    pub identifier: Option<RosterIdentifier>,
    pub rating: Rating,
    pub matches_count: u32,
}

/// Seeding rating source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedingTag {
    Ranked,
    Unranked,
}

/// Per-user seeding rating, feeding seeding only, never the ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingSkill {
    pub user_id: UserId,
    pub rating: Rating,
    pub matches_count: u32,
    pub tag: SeedingTag,
}

/// Relationship between the owner and the other player of a pair counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Mate,
    Enemy,
}

/// Additive win/loss counter keyed by (user, stage, mode)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapResultDelta {
    pub user_id: UserId,
    pub stage_id: StageId,
    pub mode: Mode,
    pub wins: u32,
    pub losses: u32,
}

/// Additive pair counter keyed by (owner, other, relationship)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResultDelta {
    pub owner_id: UserId,
    pub other_id: UserId,
    pub relationship: Relationship,
    pub map_wins: u32,
    pub map_losses: u32,
    pub set_wins: u32,
    pub set_losses: u32,
}

/// Per-set outcome from one user's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOutcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

/// One ordered set-result entry; None means the user was on the team but
/// not part of the resolved playing roster for that set
pub type SetResultEntry = Option<SetOutcome>;

/// One tournament team as fed into summarization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentTeam {
    pub team_id: TeamId,
    pub name: String,
    pub members: Vec<UserId>,
    /// Index into the bracket progression the team started in, when known
    pub starting_bracket_idx: Option<usize>,
}

/// Final placement standing, one row per physical team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub placement: u32,
}

/// Ordered bracket/division metadata for a tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketMeta {
    pub name: String,
}

/// Per-player placement row with division context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRow {
    pub user_id: UserId,
    pub team_id: TeamId,
    pub placement: u32,
    pub division_label: Option<String>,
    pub participant_count: u32,
}

/// Badge grants to persist alongside a summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeReceivers {
    pub badge_id: BadgeId,
    pub user_ids: Vec<UserId>,
}

/// Weapon usage row submitted with a score report, persisted verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedWeapon {
    pub user_id: UserId,
    pub weapon_id: u32,
    pub map_number: u32,
}
