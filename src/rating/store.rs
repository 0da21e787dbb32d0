//! Keyed current-rating lookups consumed by summarization
//!
//! Summarization never walks rating history itself; it reads the current
//! snapshot for a key through this interface and keeps its own pass-scoped
//! caches on top.

use crate::error::PodiumError;
use crate::types::{Rating, RosterIdentifier, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for current-rating lookups
pub trait RatingReader: Send + Sync {
    /// Current ladder rating for a user, if any history exists
    fn user_rating(&self, user_id: UserId) -> crate::error::Result<Option<Rating>>;

    /// Current rating for a specific roster lineup, if any history exists
    fn roster_rating(&self, identifier: &RosterIdentifier)
        -> crate::error::Result<Option<Rating>>;

    /// Current seeding rating for a user, if any history exists
    fn seeding_rating(&self, user_id: UserId) -> crate::error::Result<Option<Rating>>;

    /// Ladder matches recorded for a user before this pass
    fn user_matches_count(&self, user_id: UserId) -> crate::error::Result<u32>;
}

/// In-memory rating reader, used in tests and as the reference implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingReader {
    users: RwLock<HashMap<UserId, Rating>>,
    rosters: RwLock<HashMap<RosterIdentifier, Rating>>,
    seeding: RwLock<HashMap<UserId, Rating>>,
    match_counts: RwLock<HashMap<UserId, u32>>,
}

impl InMemoryRatingReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a user's ladder rating and prior matches count
    pub fn preset_user(&self, user_id: UserId, rating: Rating, matches_count: u32) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user_id, rating);
        }
        if let Ok(mut counts) = self.match_counts.write() {
            counts.insert(user_id, matches_count);
        }
    }

    /// Preset a roster lineup's rating
    pub fn preset_roster(&self, identifier: RosterIdentifier, rating: Rating) {
        if let Ok(mut rosters) = self.rosters.write() {
            rosters.insert(identifier, rating);
        }
    }

    /// Preset a user's seeding rating
    pub fn preset_seeding(&self, user_id: UserId, rating: Rating) {
        if let Ok(mut seeding) = self.seeding.write() {
            seeding.insert(user_id, rating);
        }
    }
}

impl RatingReader for InMemoryRatingReader {
    fn user_rating(&self, user_id: UserId) -> crate::error::Result<Option<Rating>> {
        let users = self.users.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire user ratings read lock".to_string(),
        })?;

        Ok(users.get(&user_id).copied())
    }

    fn roster_rating(
        &self,
        identifier: &RosterIdentifier,
    ) -> crate::error::Result<Option<Rating>> {
        let rosters = self.rosters.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire roster ratings read lock".to_string(),
        })?;

        Ok(rosters.get(identifier).copied())
    }

    fn seeding_rating(&self, user_id: UserId) -> crate::error::Result<Option<Rating>> {
        let seeding = self.seeding.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire seeding ratings read lock".to_string(),
        })?;

        Ok(seeding.get(&user_id).copied())
    }

    fn user_matches_count(&self, user_id: UserId) -> crate::error::Result<u32> {
        let counts = self.match_counts.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire match counts read lock".to_string(),
        })?;

        Ok(counts.get(&user_id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reader_returns_nothing() {
        let reader = InMemoryRatingReader::new();
        assert!(reader.user_rating(1).unwrap().is_none());
        assert!(reader.seeding_rating(1).unwrap().is_none());
        assert_eq!(reader.user_matches_count(1).unwrap(), 0);

        let identifier = RosterIdentifier::from_users(&[1, 2, 3, 4]);
        assert!(reader.roster_rating(&identifier).unwrap().is_none());
    }

    #[test]
    fn test_preset_lookups() {
        let reader = InMemoryRatingReader::new();
        let rating = Rating {
            mu: 1620.0,
            sigma: 140.0,
        };

        reader.preset_user(7, rating, 12);
        assert_eq!(reader.user_rating(7).unwrap(), Some(rating));
        assert_eq!(reader.user_matches_count(7).unwrap(), 12);

        let identifier = RosterIdentifier::from_users(&[7, 8, 9, 10]);
        reader.preset_roster(identifier.clone(), rating);
        assert_eq!(reader.roster_rating(&identifier).unwrap(), Some(rating));
    }
}
