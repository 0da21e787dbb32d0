//! Tournament summarization
//!
//! Once a tournament concludes, every confirmed match result is read and
//! converted into skill deltas, head-to-head statistics, and placement rows,
//! assembled into one `TournamentSummary` and committed atomically by a
//! `SummaryStore`. The whole computation is a single synchronous pass; all
//! intermediate state is local to the call.

pub mod persist;
pub mod results;
pub mod roster;
pub mod skills;
pub mod standings;

// Re-export commonly used types
pub use persist::{InMemorySummaryStore, PersistedPlacement, SummaryStore};
pub use results::{ResultAggregates, ResultAggregator};
pub use roster::{ResolvedRosters, RosterResolver};
pub use skills::{RatingSource, SkillDeltaCalculator};
pub use standings::build_placement_rows;

use crate::config::app::SummarySettings;
use crate::error::Result;
use crate::rating::function::RatingFunction;
use crate::rating::store::RatingReader;
use crate::types::{
    BracketMeta, MapResultDelta, MatchResult, PlacementRow, PlayerResultDelta, SeedingSkill,
    SetResultEntry, SkillRow, Standing, TournamentTeam, UserId,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// The complete output of one summarization pass, computed fresh once per
/// finalize and never partially persisted
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub skills: Vec<SkillRow>,
    pub seeding_skills: Vec<SeedingSkill>,
    pub map_result_deltas: Vec<MapResultDelta>,
    pub player_result_deltas: Vec<PlayerResultDelta>,
    pub set_results: HashMap<UserId, Vec<SetResultEntry>>,
    pub sp_diffs: HashMap<UserId, i32>,
    pub placements: Vec<PlacementRow>,
}

/// Everything summarization reads about a concluded tournament
#[derive(Debug, Clone, Copy)]
pub struct SummaryInputs<'a> {
    pub matches: &'a [MatchResult],
    pub teams: &'a [TournamentTeam],
    pub standings: &'a [Standing],
    pub progression: &'a [BracketMeta],
}

/// Compute a tournament's summary from its confirmed results.
///
/// Matches are processed in chronological order. A set that ended early
/// without a dropout is excluded wholesale: no skill rows, no counters, no
/// set-result entries. The RNG only feeds the roster-identifier tie-break.
pub fn tournament_summary(
    inputs: SummaryInputs<'_>,
    reader: &dyn RatingReader,
    rating_fn: &dyn RatingFunction,
    settings: &SummarySettings,
    rng: &mut dyn RngCore,
) -> Result<TournamentSummary> {
    let mut ordered: Vec<&MatchResult> = inputs.matches.iter().collect();
    ordered.sort_by_key(|result| result.finished_at);

    let mut resolver = RosterResolver::new(rng);
    let mut ladder = SkillDeltaCalculator::new(rating_fn, reader, RatingSource::Ladder);
    let mut seeding = SkillDeltaCalculator::new(rating_fn, reader, RatingSource::Seeding);
    let mut aggregator = ResultAggregator::new();

    let mut processed = 0usize;
    for result in ordered {
        if !result.counts_for_rating() {
            debug!(match_id = %result.match_id, "set ended early without dropout, excluded");
            continue;
        }

        let resolved = resolver.resolve_match(result)?;
        ladder.process_match(&resolved)?;
        seeding.process_individuals(&resolved)?;
        aggregator.process_match(result, &resolved)?;
        processed += 1;
    }

    let sp_diffs = ladder.sp_diffs(settings.sp_visibility_threshold)?;
    let skills = ladder.into_rows();
    let seeding_skills = seeding.into_seeding_rows();
    let aggregates = aggregator.finish();
    let placements =
        build_placement_rows(inputs.standings, inputs.teams, inputs.progression)?;

    info!(
        matches = processed,
        skill_rows = skills.len(),
        placements = placements.len(),
        "tournament summary computed"
    );

    Ok(TournamentSummary {
        skills,
        seeding_skills,
        map_result_deltas: aggregates.map_result_deltas,
        player_result_deltas: aggregates.player_result_deltas,
        set_results: aggregates.set_results,
        sp_diffs,
        placements,
    })
}
