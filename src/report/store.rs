//! Match row storage interface and implementations
//!
//! Protocol atomicity relies on the store's revision-checked write of the
//! per-match row, not on an application-level lock. Two racing reporters both
//! read, both try to write; exactly one write lands, the other retries.

use crate::error::PodiumError;
use crate::report::state::MatchPhase;
use crate::types::{MatchId, RoundConfig, SkillRecord, TeamId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// One side's group as stored on the match row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSide {
    pub group_id: TeamId,
    pub members: Vec<UserId>,
}

/// Per-match row driven through the report state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMatch {
    pub match_id: MatchId,
    pub alpha: GroupSide,
    pub bravo: GroupSide,
    pub round: RoundConfig,
    pub phase: MatchPhase,
    /// Bumped by the store on every successful write
    pub revision: u64,
}

impl StoredMatch {
    /// Which side a user reports for, if they are in the match at all
    pub fn side_of(&self, user_id: UserId) -> Option<crate::report::state::Side> {
        if self.alpha.members.contains(&user_id) {
            Some(crate::report::state::Side::Alpha)
        } else if self.bravo.members.contains(&user_id) {
            Some(crate::report::state::Side::Bravo)
        } else {
            None
        }
    }

    pub fn group_id_of(&self, side: crate::report::state::Side) -> TeamId {
        match side {
            crate::report::state::Side::Alpha => self.alpha.group_id,
            crate::report::state::Side::Bravo => self.bravo.group_id,
        }
    }
}

/// Trait for match row storage operations
pub trait MatchStore: Send + Sync {
    /// Insert a fresh match row
    fn insert_match(&self, row: StoredMatch) -> crate::error::Result<()>;

    /// Load the current match row
    fn load_match(&self, match_id: MatchId) -> crate::error::Result<Option<StoredMatch>>;

    /// Revision-checked write of the per-match row. Returns false when the
    /// stored revision no longer matches and the caller must re-read.
    fn store_match(&self, row: StoredMatch, expected_revision: u64)
        -> crate::error::Result<bool>;

    /// Remove a group from further matchmaking
    fn deactivate_group(&self, group_id: TeamId) -> crate::error::Result<()>;

    /// Whether a group is still active in matchmaking
    fn group_active(&self, group_id: TeamId) -> crate::error::Result<bool>;

    /// Append a skill record tied to a match
    fn insert_skill_record(&self, record: SkillRecord) -> crate::error::Result<()>;

    /// Whether any skill record exists for a match. Existence means the
    /// match is closed.
    fn has_skill_record(&self, match_id: MatchId) -> crate::error::Result<bool>;
}

/// In-memory match store implementation
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: RwLock<HashMap<MatchId, StoredMatch>>,
    inactive_groups: RwLock<HashSet<TeamId>>,
    skill_records: RwLock<Vec<SkillRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All skill records appended so far (for testing)
    pub fn skill_records(&self) -> Vec<SkillRecord> {
        self.skill_records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn insert_match(&self, row: StoredMatch) -> crate::error::Result<()> {
        let mut matches = self.matches.write().map_err(|_| PodiumError::Internal {
            message: "failed to acquire matches write lock".to_string(),
        })?;

        if matches.contains_key(&row.match_id) {
            return Err(PodiumError::Storage {
                message: format!("match {} already exists", row.match_id),
            }
            .into());
        }

        matches.insert(row.match_id, row);
        Ok(())
    }

    fn load_match(&self, match_id: MatchId) -> crate::error::Result<Option<StoredMatch>> {
        let matches = self.matches.read().map_err(|_| PodiumError::Internal {
            message: "failed to acquire matches read lock".to_string(),
        })?;

        Ok(matches.get(&match_id).cloned())
    }

    fn store_match(
        &self,
        mut row: StoredMatch,
        expected_revision: u64,
    ) -> crate::error::Result<bool> {
        let mut matches = self.matches.write().map_err(|_| PodiumError::Internal {
            message: "failed to acquire matches write lock".to_string(),
        })?;

        let current = matches.get(&row.match_id).ok_or_else(|| {
            anyhow::Error::from(PodiumError::MatchNotFound {
                match_id: row.match_id.to_string(),
            })
        })?;

        if current.revision != expected_revision {
            return Ok(false);
        }

        row.revision = expected_revision + 1;
        matches.insert(row.match_id, row);
        Ok(true)
    }

    fn deactivate_group(&self, group_id: TeamId) -> crate::error::Result<()> {
        let mut inactive = self
            .inactive_groups
            .write()
            .map_err(|_| PodiumError::Internal {
                message: "failed to acquire groups write lock".to_string(),
            })?;

        inactive.insert(group_id);
        Ok(())
    }

    fn group_active(&self, group_id: TeamId) -> crate::error::Result<bool> {
        let inactive = self
            .inactive_groups
            .read()
            .map_err(|_| PodiumError::Internal {
                message: "failed to acquire groups read lock".to_string(),
            })?;

        Ok(!inactive.contains(&group_id))
    }

    fn insert_skill_record(&self, record: SkillRecord) -> crate::error::Result<()> {
        let mut records = self
            .skill_records
            .write()
            .map_err(|_| PodiumError::Internal {
                message: "failed to acquire skill records write lock".to_string(),
            })?;

        records.push(record);
        Ok(())
    }

    fn has_skill_record(&self, match_id: MatchId) -> crate::error::Result<bool> {
        let records = self
            .skill_records
            .read()
            .map_err(|_| PodiumError::Internal {
                message: "failed to acquire skill records read lock".to_string(),
            })?;

        Ok(records
            .iter()
            .any(|record| record.match_id == Some(match_id)))
    }
}
