//! Skill delta computation for one summarization pass
//!
//! The calculator walks confirmed matches in chronological order and applies
//! the injected rating function once per match for individuals and once for
//! team rosters. All intermediate state lives in pass-scoped caches owned by
//! the calculator instance; nothing is shared across tournaments or requests.

use crate::error::{PodiumError, Result};
use crate::rating::function::RatingFunction;
use crate::rating::store::RatingReader;
use crate::summary::roster::ResolvedRosters;
use crate::types::{Rating, RosterIdentifier, SeedingSkill, SeedingTag, SkillRow, UserId};
use crate::utils::round_sp;
use std::collections::HashMap;

/// Which current-rating source feeds the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource {
    /// The ladder ratings; individual and team passes both run
    Ladder,
    /// The seeding ratings; only the individual pass runs
    Seeding,
}

/// Pass-scoped rating caches, lazily filled from the rating reader.
///
/// `initial_users` remembers what the reader returned on first touch
/// (None = no history), which later feeds visible skill-point diffs.
#[derive(Debug, Default)]
struct RatingCaches {
    users: HashMap<UserId, Rating>,
    rosters: HashMap<RosterIdentifier, Rating>,
    initial_users: HashMap<UserId, Option<Rating>>,
    user_match_counts: HashMap<UserId, u32>,
    roster_match_counts: HashMap<RosterIdentifier, u32>,
}

/// Applies the rating function per match and accumulates skill deltas
pub struct SkillDeltaCalculator<'a> {
    rating_fn: &'a dyn RatingFunction,
    reader: &'a dyn RatingReader,
    source: RatingSource,
    caches: RatingCaches,
}

impl<'a> SkillDeltaCalculator<'a> {
    pub fn new(
        rating_fn: &'a dyn RatingFunction,
        reader: &'a dyn RatingReader,
        source: RatingSource,
    ) -> Self {
        Self {
            rating_fn,
            reader,
            source,
            caches: RatingCaches::default(),
        }
    }

    /// Run both the individual and the team pass for one match
    pub fn process_match(&mut self, resolved: &ResolvedRosters) -> Result<()> {
        self.process_individuals(resolved)?;
        self.process_teams(resolved)
    }

    /// One rating-function application covering every resolved player
    pub fn process_individuals(&mut self, resolved: &ResolvedRosters) -> Result<()> {
        let winner_ratings = self.ratings_for_users(&resolved.winner_members)?;
        let loser_ratings = self.ratings_for_users(&resolved.loser_members)?;

        let updated = self
            .rating_fn
            .rate(&[winner_ratings, loser_ratings], None)?;
        if updated.len() != 2
            || updated[0].len() != resolved.winner_members.len()
            || updated[1].len() != resolved.loser_members.len()
        {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "rating function returned mismatched shape".to_string(),
            }
            .into());
        }

        for (user_id, rating) in resolved
            .winner_members
            .iter()
            .zip(&updated[0])
            .chain(resolved.loser_members.iter().zip(&updated[1]))
        {
            self.caches.users.insert(*user_id, *rating);
            *self.caches.user_match_counts.entry(*user_id).or_default() += 1;
        }

        Ok(())
    }

    /// One rating-function application for the two roster identifiers.
    /// The player-average prior blends roster continuity with the current
    /// strength of the people actually on it.
    pub fn process_teams(&mut self, resolved: &ResolvedRosters) -> Result<()> {
        let winner_rating = self.rating_for_roster(&resolved.winner_identifier)?;
        let loser_rating = self.rating_for_roster(&resolved.loser_identifier)?;

        let winner_prior = self.player_average(&resolved.winner_members)?;
        let loser_prior = self.player_average(&resolved.loser_members)?;

        let updated = self.rating_fn.rate(
            &[vec![winner_rating], vec![loser_rating]],
            Some(&[vec![winner_prior], vec![loser_prior]]),
        )?;
        if updated.len() != 2 || updated[0].len() != 1 || updated[1].len() != 1 {
            return Err(PodiumError::RatingCalculationFailed {
                reason: "rating function returned mismatched shape".to_string(),
            }
            .into());
        }

        for (identifier, rating) in [
            (&resolved.winner_identifier, updated[0][0]),
            (&resolved.loser_identifier, updated[1][0]),
        ] {
            self.caches.rosters.insert(identifier.clone(), rating);
            *self
                .caches
                .roster_match_counts
                .entry(identifier.clone())
                .or_default() += 1;
        }

        Ok(())
    }

    /// Visible skill-point diffs for users whose prior ladder history meets
    /// the visibility threshold. Everyone else gets a silent rating update.
    pub fn sp_diffs(&self, threshold: u32) -> Result<HashMap<UserId, i32>> {
        let mut diffs = HashMap::new();

        for (user_id, new_rating) in &self.caches.users {
            let Some(Some(old_rating)) = self.caches.initial_users.get(user_id) else {
                continue;
            };
            if self.reader.user_matches_count(*user_id)? < threshold {
                continue;
            }
            diffs.insert(
                *user_id,
                round_sp(self.rating_fn.ordinal(new_rating) - self.rating_fn.ordinal(old_rating)),
            );
        }

        Ok(diffs)
    }

    /// Flat delta rows for the ladder pass, users first, then rosters
    pub fn into_rows(self) -> Vec<SkillRow> {
        let mut user_rows: Vec<SkillRow> = self
            .caches
            .user_match_counts
            .iter()
            .map(|(user_id, count)| SkillRow {
                user_id: Some(*user_id),
                identifier: None,
                rating: self.caches.users[user_id],
                matches_count: *count,
            })
            .collect();
        user_rows.sort_by_key(|row| row.user_id);

        let mut roster_rows: Vec<SkillRow> = self
            .caches
            .roster_match_counts
            .iter()
            .map(|(identifier, count)| SkillRow {
                user_id: None,
                identifier: Some(identifier.clone()),
                rating: self.caches.rosters[identifier],
                matches_count: *count,
            })
            .collect();
        roster_rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        user_rows.extend(roster_rows);
        user_rows
    }

    /// Seeding rows for the seeding pass. A user who already had a seeding
    /// rating is RANKED; one starting from the initial rating is UNRANKED.
    pub fn into_seeding_rows(self) -> Vec<SeedingSkill> {
        let mut rows: Vec<SeedingSkill> = self
            .caches
            .user_match_counts
            .iter()
            .map(|(user_id, count)| SeedingSkill {
                user_id: *user_id,
                rating: self.caches.users[user_id],
                matches_count: *count,
                tag: match self.caches.initial_users.get(user_id) {
                    Some(Some(_)) => SeedingTag::Ranked,
                    _ => SeedingTag::Unranked,
                },
            })
            .collect();
        rows.sort_by_key(|row| row.user_id);
        rows
    }

    fn ratings_for_users(&mut self, users: &[UserId]) -> Result<Vec<Rating>> {
        users.iter().map(|user_id| self.rating_for_user(*user_id)).collect()
    }

    fn rating_for_user(&mut self, user_id: UserId) -> Result<Rating> {
        if let Some(rating) = self.caches.users.get(&user_id) {
            return Ok(*rating);
        }

        let looked_up = match self.source {
            RatingSource::Ladder => self.reader.user_rating(user_id)?,
            RatingSource::Seeding => self.reader.seeding_rating(user_id)?,
        };
        self.caches.initial_users.insert(user_id, looked_up);

        let rating = looked_up.unwrap_or_else(|| self.rating_fn.initial_rating());
        self.caches.users.insert(user_id, rating);
        Ok(rating)
    }

    fn rating_for_roster(&mut self, identifier: &RosterIdentifier) -> Result<Rating> {
        if let Some(rating) = self.caches.rosters.get(identifier) {
            return Ok(*rating);
        }

        let rating = self
            .reader
            .roster_rating(identifier)?
            .unwrap_or_else(|| self.rating_fn.initial_rating());
        self.caches.rosters.insert(identifier.clone(), rating);
        Ok(rating)
    }

    fn player_average(&mut self, users: &[UserId]) -> Result<Rating> {
        if users.is_empty() {
            return Err(PodiumError::CorruptMatchData {
                reason: "cannot average ratings of an empty roster".to_string(),
            }
            .into());
        }

        let ratings = self.ratings_for_users(users)?;
        let len = ratings.len() as f64;
        Ok(Rating {
            mu: ratings.iter().map(|rating| rating.mu).sum::<f64>() / len,
            sigma: ratings.iter().map(|rating| rating.sigma).sum::<f64>() / len,
        })
    }
}
