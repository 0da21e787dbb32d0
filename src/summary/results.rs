//! Map-level and set-level win/loss aggregation
//!
//! Counters accumulate in memory over the whole pass and flush as additive
//! deltas; persistence adds them onto whatever already exists, never
//! overwriting totals.

use crate::error::{PodiumError, Result};
use crate::summary::roster::ResolvedRosters;
use crate::types::{
    MapResultDelta, MatchResult, Mode, PlayerResultDelta, Relationship, SetOutcome,
    SetResultEntry, StageId, UserId,
};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
struct WinLoss {
    wins: u32,
    losses: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct PairCounts {
    map_wins: u32,
    map_losses: u32,
    set_wins: u32,
    set_losses: u32,
}

/// Everything the aggregator produced over one pass
#[derive(Debug, Default)]
pub struct ResultAggregates {
    pub map_result_deltas: Vec<MapResultDelta>,
    pub player_result_deltas: Vec<PlayerResultDelta>,
    pub set_results: HashMap<UserId, Vec<SetResultEntry>>,
}

/// Accumulates win/loss statistics per user and per pair
#[derive(Debug, Default)]
pub struct ResultAggregator {
    map_counts: HashMap<(UserId, StageId, Mode), WinLoss>,
    pair_counts: HashMap<(UserId, UserId, Relationship), PairCounts>,
    set_results: HashMap<UserId, Vec<SetResultEntry>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one confirmed match into the running counters
    pub fn process_match(
        &mut self,
        result: &MatchResult,
        resolved: &ResolvedRosters,
    ) -> Result<()> {
        self.process_maps(result)?;
        self.process_set_pairs(resolved);
        self.process_set_results(result, resolved)?;
        Ok(())
    }

    /// Per-map counters: one win/loss per participant, one map-level pair
    /// entry per co-participant, teammates included
    fn process_maps(&mut self, result: &MatchResult) -> Result<()> {
        for map in &result.maps {
            if map.winner_team_id != result.opponent_one.team_id
                && map.winner_team_id != result.opponent_two.team_id
            {
                return Err(PodiumError::CorruptMatchData {
                    reason: format!(
                        "map winner on match {} belongs to neither opponent",
                        result.match_id
                    ),
                }
                .into());
            }

            for participant in &map.participants {
                let won = participant.team_id == map.winner_team_id;
                let entry = self
                    .map_counts
                    .entry((participant.user_id, map.stage_id, map.mode.clone()))
                    .or_default();
                if won {
                    entry.wins += 1;
                } else {
                    entry.losses += 1;
                }

                for other in &map.participants {
                    if other.user_id == participant.user_id {
                        continue;
                    }
                    let relationship = if other.team_id == participant.team_id {
                        Relationship::Mate
                    } else {
                        Relationship::Enemy
                    };
                    let pair = self
                        .pair_counts
                        .entry((participant.user_id, other.user_id, relationship))
                        .or_default();
                    if won {
                        pair.map_wins += 1;
                    } else {
                        pair.map_losses += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Set-level pair counters among the members of each side's most-popular
    /// lineup identifier, so pure single-map substitutes never enter the
    /// head-to-head set totals
    fn process_set_pairs(&mut self, resolved: &ResolvedRosters) {
        let winners = resolved.winner_identifier.user_ids();
        let losers = resolved.loser_identifier.user_ids();

        for owner in &winners {
            for other in &winners {
                if other != owner {
                    self.pair_counts
                        .entry((*owner, *other, Relationship::Mate))
                        .or_default()
                        .set_wins += 1;
                }
            }
            for other in &losers {
                self.pair_counts
                    .entry((*owner, *other, Relationship::Enemy))
                    .or_default()
                    .set_wins += 1;
            }
        }

        for owner in &losers {
            for other in &losers {
                if other != owner {
                    self.pair_counts
                        .entry((*owner, *other, Relationship::Mate))
                        .or_default()
                        .set_losses += 1;
                }
            }
            for other in &winners {
                self.pair_counts
                    .entry((*owner, *other, Relationship::Enemy))
                    .or_default()
                    .set_losses += 1;
            }
        }
    }

    /// Exactly one ordered entry per full roster member per match: W or L
    /// inside the resolved roster, null outside it
    fn process_set_results(
        &mut self,
        result: &MatchResult,
        resolved: &ResolvedRosters,
    ) -> Result<()> {
        let winner = result.winner()?;
        let loser = result.loser()?;

        for member in &winner.members {
            let entry = resolved
                .winner_members
                .contains(member)
                .then_some(SetOutcome::Win);
            self.set_results.entry(*member).or_default().push(entry);
        }
        for member in &loser.members {
            let entry = resolved
                .loser_members
                .contains(member)
                .then_some(SetOutcome::Loss);
            self.set_results.entry(*member).or_default().push(entry);
        }

        Ok(())
    }

    /// Flush accumulated counters as additive delta rows
    pub fn finish(self) -> ResultAggregates {
        let mut map_result_deltas: Vec<MapResultDelta> = self
            .map_counts
            .into_iter()
            .map(|((user_id, stage_id, mode), counts)| MapResultDelta {
                user_id,
                stage_id,
                mode,
                wins: counts.wins,
                losses: counts.losses,
            })
            .collect();
        map_result_deltas.sort_by(|a, b| {
            (a.user_id, a.stage_id, &a.mode).cmp(&(b.user_id, b.stage_id, &b.mode))
        });

        let mut player_result_deltas: Vec<PlayerResultDelta> = self
            .pair_counts
            .into_iter()
            .map(|((owner_id, other_id, relationship), counts)| PlayerResultDelta {
                owner_id,
                other_id,
                relationship,
                map_wins: counts.map_wins,
                map_losses: counts.map_losses,
                set_wins: counts.set_wins,
                set_losses: counts.set_losses,
            })
            .collect();
        player_result_deltas
            .sort_by_key(|delta| (delta.owner_id, delta.other_id, delta.relationship as u8));

        ResultAggregates {
            map_result_deltas,
            player_result_deltas,
            set_results: self.set_results,
        }
    }
}
