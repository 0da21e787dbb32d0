//! Placement row construction from final standings
//!
//! Standings arrive deduplicated, one row per physical team. Division context
//! only exists when more than one team finished first, which is how a
//! multi-starting-bracket event looks after its brackets conclude.

use crate::error::{PodiumError, Result};
use crate::types::{BracketMeta, PlacementRow, Standing, TeamId, TournamentTeam};
use std::collections::{HashMap, HashSet};

/// Expand team standings into one placement row per (player, team)
pub fn build_placement_rows(
    standings: &[Standing],
    teams: &[TournamentTeam],
    progression: &[BracketMeta],
) -> Result<Vec<PlacementRow>> {
    let team_by_id: HashMap<TeamId, &TournamentTeam> =
        teams.iter().map(|team| (team.team_id, team)).collect();

    let mut seen: HashSet<TeamId> = HashSet::new();
    for standing in standings {
        if !seen.insert(standing.team_id) {
            return Err(PodiumError::CorruptMatchData {
                reason: format!("team {} appears twice in standings", standing.team_id),
            }
            .into());
        }
    }

    let multi_division = standings
        .iter()
        .filter(|standing| standing.placement == 1)
        .count()
        > 1;
    let overall_count = standings.len() as u32;

    // Teams per starting bracket, counted over the standings themselves
    let mut bracket_counts: HashMap<Option<usize>, u32> = HashMap::new();
    if multi_division {
        for standing in standings {
            let team = team_by_id.get(&standing.team_id).ok_or_else(|| {
                PodiumError::CorruptMatchData {
                    reason: format!("standing references unknown team {}", standing.team_id),
                }
            })?;
            *bracket_counts.entry(team.starting_bracket_idx).or_default() += 1;
        }
    }

    let mut rows = Vec::new();
    for standing in standings {
        let team =
            team_by_id
                .get(&standing.team_id)
                .ok_or_else(|| PodiumError::CorruptMatchData {
                    reason: format!("standing references unknown team {}", standing.team_id),
                })?;

        let division_label = if multi_division {
            match team.starting_bracket_idx {
                Some(idx) => {
                    let meta =
                        progression
                            .get(idx)
                            .ok_or_else(|| PodiumError::CorruptMatchData {
                                reason: format!(
                                    "team {} starting bracket {} is outside the progression",
                                    team.team_id, idx
                                ),
                            })?;
                    Some(meta.name.clone())
                }
                None => None,
            }
        } else {
            None
        };

        let participant_count = if multi_division {
            bracket_counts[&team.starting_bracket_idx]
        } else {
            overall_count
        };

        for member in &team.members {
            rows.push(PlacementRow {
                user_id: *member,
                team_id: team.team_id,
                placement: standing.placement,
                division_label: division_label.clone(),
                participant_count,
            });
        }
    }

    Ok(rows)
}
