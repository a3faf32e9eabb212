//! Contest directory - operator-facing contest lifecycle
//!
//! Thin CRUD layer over the contests table with an explicit lifecycle:
//! state lives in the database and is read on demand, never in
//! process-wide mutable maps. Enforces the one-active-contest-per-guild
//! rule at creation time.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::ContestDefaults;
use crate::error::{Error, Result};
use crate::models::Contest;
use crate::storage::Database;

pub struct ContestDirectory {
    db: Arc<Mutex<Database>>,
    defaults: ContestDefaults,
}

impl ContestDirectory {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self::with_defaults(db, ContestDefaults::default())
    }

    /// Use configured defaults (thresholds, periods, draw sizes) for new
    /// contests instead of the built-in ones.
    pub fn with_defaults(db: Arc<Mutex<Database>>, defaults: ContestDefaults) -> Self {
        Self { db, defaults }
    }

    /// Create a contest for a guild. Fails when the guild already has an
    /// active contest or the window is inverted.
    pub fn create_contest(
        &self,
        guild_id: &str,
        title: &str,
        description: Option<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        created_by: Option<String>,
    ) -> Result<Contest> {
        if end_at <= start_at {
            return Err(Error::InvalidOperation(
                "contest end must be after its start".to_string(),
            ));
        }

        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;

        if db.contests().has_active_for_guild(guild_id)? {
            return Err(Error::InvalidOperation(format!(
                "guild {guild_id} already has an active contest"
            )));
        }

        let mut contest = Contest::new(
            guild_id.to_string(),
            title.to_string(),
            start_at,
            end_at,
        );
        contest.description = description;
        contest.created_by = created_by;
        self.defaults.apply(&mut contest);

        db.contests().create(&contest)?;
        info!(contest_id = %contest.id, guild_id = %guild_id, title = %title, "Contest created");
        Ok(contest)
    }

    /// The contest currently running for a guild, if any.
    pub fn active_contest(&self, guild_id: &str) -> Result<Option<Contest>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.contests().find_active_for_guild(guild_id, Utc::now())
    }

    /// Look up a contest by id.
    pub fn contest(&self, id: Uuid) -> Result<Contest> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.contests()
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("contest {id}")))
    }

    /// Deactivate a contest. Its records and totals stay readable.
    pub fn deactivate(&self, id: Uuid) -> Result<()> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        if !db.contests().deactivate(id)? {
            return Err(Error::NotFound(format!("contest {id}")));
        }
        info!(contest_id = %id, "Contest deactivated");
        Ok(())
    }

    /// All contests a guild has run, newest first.
    pub fn contests_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.contests().list_for_guild(guild_id)
    }
}
