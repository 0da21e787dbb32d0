//! Roster resolution for summarized matches
//!
//! A team's match participants rarely equal its registered roster: players
//! substitute in and out between maps. Resolution picks "who actually played"
//! by majority presence across maps, and reduces each side to the lineup
//! identifier that appeared on the most maps.

use crate::error::{PodiumError, Result};
use crate::types::{MatchOpponent, MatchResult, RosterIdentifier, UserId};
use rand::{Rng, RngCore};
use std::collections::HashMap;

/// Both sides of one match, resolved for rating purposes
#[derive(Debug, Clone)]
pub struct ResolvedRosters {
    pub winner_members: Vec<UserId>,
    pub loser_members: Vec<UserId>,
    pub winner_identifier: RosterIdentifier,
    pub loser_identifier: RosterIdentifier,
}

/// Resolves playing rosters from map participation.
///
/// The RNG only breaks ties between equally frequent lineup identifiers;
/// injecting a seeded generator makes resolution deterministic for tests
/// without changing the uniform selection policy.
pub struct RosterResolver<'r> {
    rng: &'r mut dyn RngCore,
}

impl<'r> RosterResolver<'r> {
    pub fn new(rng: &'r mut dyn RngCore) -> Self {
        Self { rng }
    }

    /// Resolve both sides of a match
    pub fn resolve_match(&mut self, result: &MatchResult) -> Result<ResolvedRosters> {
        let winner = result.winner()?;
        let loser = result.loser()?;

        Ok(ResolvedRosters {
            winner_members: self.resolve_members(result, winner)?,
            loser_members: self.resolve_members(result, loser)?,
            winner_identifier: self.resolve_identifier(result, winner)?,
            loser_identifier: self.resolve_identifier(result, loser)?,
        })
    }

    /// The users who actually played for one side.
    ///
    /// Majority presence across maps decides membership; everyone tied at the
    /// cutoff stays in, even past the target size.
    pub fn resolve_members(
        &mut self,
        result: &MatchResult,
        opponent: &MatchOpponent,
    ) -> Result<Vec<UserId>> {
        if result.maps.is_empty() {
            // Voided before any map completed
            return Ok(opponent
                .active_roster
                .clone()
                .unwrap_or_else(|| opponent.members.clone()));
        }

        let mut appearances: HashMap<UserId, usize> = HashMap::new();
        for map in &result.maps {
            for participant in &map.participants {
                if participant.team_id != result.opponent_one.team_id
                    && participant.team_id != result.opponent_two.team_id
                {
                    return Err(PodiumError::CorruptMatchData {
                        reason: format!(
                            "participant {} on match {} belongs to neither opponent",
                            participant.user_id, result.match_id
                        ),
                    }
                    .into());
                }
                if participant.team_id == opponent.team_id {
                    *appearances.entry(participant.user_id).or_default() += 1;
                }
            }
        }

        if appearances.is_empty() {
            return Err(PodiumError::CorruptMatchData {
                reason: format!(
                    "team {} has no participants on match {}",
                    opponent.team_id, result.match_id
                ),
            }
            .into());
        }

        let first_map_participants = result.maps[0].participants.len();
        if first_map_participants == 0 {
            return Err(PodiumError::CorruptMatchData {
                reason: format!("match {} has a map with no participants", result.match_id),
            }
            .into());
        }
        let target_size = first_map_participants.div_ceil(2);

        let mut tallied: Vec<(UserId, usize)> = appearances.into_iter().collect();
        tallied.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let cutoff_index = target_size.min(tallied.len());
        let cutoff_count = tallied[cutoff_index - 1].1;

        Ok(tallied
            .into_iter()
            .filter(|(_, count)| *count >= cutoff_count)
            .map(|(user_id, _)| user_id)
            .collect())
    }

    /// The lineup identifier that appeared on the most maps for one side.
    /// Ties are broken by uniform-random choice among the tied identifiers.
    pub fn resolve_identifier(
        &mut self,
        result: &MatchResult,
        opponent: &MatchOpponent,
    ) -> Result<RosterIdentifier> {
        if result.maps.is_empty() {
            let fallback = opponent
                .active_roster
                .as_ref()
                .unwrap_or(&opponent.members);
            return Ok(RosterIdentifier::from_users(fallback));
        }

        let mut map_counts: HashMap<RosterIdentifier, usize> = HashMap::new();
        for map in &result.maps {
            let lineup: Vec<UserId> = map
                .participants
                .iter()
                .filter(|participant| participant.team_id == opponent.team_id)
                .map(|participant| participant.user_id)
                .collect();

            if lineup.is_empty() {
                return Err(PodiumError::CorruptMatchData {
                    reason: format!(
                        "team {} fielded no players on a map of match {}",
                        opponent.team_id, result.match_id
                    ),
                }
                .into());
            }

            *map_counts
                .entry(RosterIdentifier::from_users(&lineup))
                .or_default() += 1;
        }

        let top_count = map_counts
            .values()
            .copied()
            .max()
            .expect("at least one map contributed a lineup");

        let mut tied: Vec<RosterIdentifier> = map_counts
            .into_iter()
            .filter(|(_, count)| *count == top_count)
            .map(|(identifier, _)| identifier)
            .collect();
        // Stable candidate order so the RNG index is the only variance
        tied.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        if tied.len() == 1 {
            return Ok(tied.pop().expect("one tied identifier"));
        }

        let pick = self.rng.gen_range(0..tied.len());
        Ok(tied.swap_remove(pick))
    }
}
