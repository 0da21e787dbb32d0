//! Test fixtures and mock implementations for integration testing
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use podium::error::Result;
use podium::notify::ResultNotifier;
use podium::types::{
    MapParticipant, MatchId, MatchOpponent, MatchResult, PlayedMap, RoundConfig, RoundCountType,
    TeamId, UserId,
};
use std::sync::Mutex;

/// Mock notifier that records fired hooks for testing
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    confirmed: Mutex<Vec<MatchId>>,
    cancelled: Mutex<Vec<MatchId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed_matches(&self) -> Vec<MatchId> {
        self.confirmed
            .lock()
            .map(|matches| matches.clone())
            .unwrap_or_default()
    }

    pub fn cancelled_matches(&self) -> Vec<MatchId> {
        self.cancelled
            .lock()
            .map(|matches| matches.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultNotifier for RecordingNotifier {
    async fn score_confirmed(&self, match_id: MatchId) -> Result<()> {
        if let Ok(mut matches) = self.confirmed.lock() {
            matches.push(match_id);
        }
        Ok(())
    }

    async fn match_cancelled(&self, match_id: MatchId) -> Result<()> {
        if let Ok(mut matches) = self.cancelled.lock() {
            matches.push(match_id);
        }
        Ok(())
    }
}

/// A fixed point in time so match ordering in fixtures is explicit
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T18:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn opponent(team_id: TeamId, won: bool, score: u32, members: Vec<UserId>) -> MatchOpponent {
    MatchOpponent {
        team_id,
        score,
        won,
        dropped_out: false,
        active_roster: None,
        members,
    }
}

pub fn played_map(
    stage_id: u32,
    mode: &str,
    team_a: TeamId,
    users_a: &[UserId],
    team_b: TeamId,
    users_b: &[UserId],
    winner: TeamId,
) -> PlayedMap {
    let mut participants: Vec<MapParticipant> = users_a
        .iter()
        .map(|user_id| MapParticipant {
            user_id: *user_id,
            team_id: team_a,
        })
        .collect();
    participants.extend(users_b.iter().map(|user_id| MapParticipant {
        user_id: *user_id,
        team_id: team_b,
    }));

    PlayedMap {
        stage_id,
        mode: mode.to_string(),
        participants,
        winner_team_id: winner,
    }
}

pub fn best_of(count: u32) -> RoundConfig {
    RoundConfig {
        count,
        count_type: RoundCountType::BestOf,
    }
}

/// A clean 4v4 sweep: side A wins `map_count` straight maps
pub fn sweep_match(
    team_a: TeamId,
    members_a: &[UserId],
    team_b: TeamId,
    members_b: &[UserId],
    map_count: u32,
    minutes_offset: i64,
) -> MatchResult {
    let maps = (0..map_count)
        .map(|index| {
            played_map(
                10 + index,
                "SZ",
                team_a,
                members_a,
                team_b,
                members_b,
                team_a,
            )
        })
        .collect();

    MatchResult {
        match_id: podium::utils::generate_match_id(),
        opponent_one: opponent(team_a, true, map_count, members_a.to_vec()),
        opponent_two: opponent(team_b, false, 0, members_b.to_vec()),
        maps,
        round: best_of(map_count * 2 - 1),
        finished_at: base_time() + Duration::minutes(minutes_offset),
    }
}
