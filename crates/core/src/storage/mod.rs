//! SQLite storage layer for Patrol Core

mod contests;
mod ledger;
mod migrations;
mod parse;
mod participants;
mod traits;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Contest, HoursRecord, Participant};
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

pub use contests::ContestStore;
pub use ledger::{HoursTotals, LedgerStore};
pub use participants::ParticipantStore;
pub use traits::{ContestRepository, LedgerRepository, ParticipantRepository, Storage};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get contest store
    pub fn contests(&self) -> ContestStore<'_> {
        ContestStore::new(&self.conn)
    }

    /// Get hours ledger store
    pub fn ledger(&self) -> LedgerStore<'_> {
        LedgerStore::new(&self.conn)
    }

    /// Get participant summary store
    pub fn participants(&self) -> ParticipantStore<'_> {
        ParticipantStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl ContestRepository for Database {
    fn create_contest(&self, contest: &Contest) -> Result<()> {
        self.contests().create(contest)
    }

    fn find_contest_by_id(&self, id: Uuid) -> Result<Option<Contest>> {
        self.contests().find_by_id(id)
    }

    fn find_active_contest(&self, guild_id: &str, now: DateTime<Utc>) -> Result<Option<Contest>> {
        self.contests().find_active_for_guild(guild_id, now)
    }

    fn has_active_contest(&self, guild_id: &str) -> Result<bool> {
        self.contests().has_active_for_guild(guild_id)
    }

    fn deactivate_contest(&self, id: Uuid) -> Result<bool> {
        self.contests().deactivate(id)
    }

    fn list_contests_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>> {
        self.contests().list_for_guild(guild_id)
    }
}

impl LedgerRepository for Database {
    fn insert_record(&self, record: &HoursRecord) -> Result<()> {
        self.ledger().insert(record)
    }

    fn find_record_by_id(&self, id: Uuid) -> Result<Option<HoursRecord>> {
        self.ledger().find_by_id(id)
    }

    fn find_record_by_session(
        &self,
        contest_id: Uuid,
        participant_id: &str,
        session_id: Uuid,
    ) -> Result<Option<HoursRecord>> {
        self.ledger().find_by_session(contest_id, participant_id, session_id)
    }

    fn hours_on_date(
        &self,
        contest_id: Uuid,
        participant_id: &str,
        date: NaiveDate,
    ) -> Result<f64> {
        self.ledger().hours_on_date(contest_id, participant_id, date)
    }

    fn totals_for_participant(
        &self,
        contest_id: Uuid,
        participant_id: &str,
    ) -> Result<HoursTotals> {
        self.ledger().totals_for(contest_id, participant_id)
    }

    fn invalidate_record(&self, id: Uuid) -> Result<bool> {
        self.ledger().invalidate(id)
    }
}

impl ParticipantRepository for Database {
    fn upsert_participant(&self, participant: &Participant) -> Result<()> {
        self.participants().upsert(participant)
    }

    fn find_participant(
        &self,
        contest_id: Uuid,
        participant_id: &str,
    ) -> Result<Option<Participant>> {
        self.participants().find(contest_id, participant_id)
    }

    fn list_eligible(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.participants().list_eligible(contest_id)
    }
}
