//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future alternative backend).

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::HoursTotals;
use crate::error::Result;
use crate::models::{Contest, HoursRecord, Participant};

/// Contest repository operations
pub trait ContestRepository {
    /// Create a new contest
    fn create_contest(&self, contest: &Contest) -> Result<()>;

    /// Find contest by ID
    fn find_contest_by_id(&self, id: Uuid) -> Result<Option<Contest>>;

    /// Find the contest currently running for a guild
    fn find_active_contest(&self, guild_id: &str, now: DateTime<Utc>) -> Result<Option<Contest>>;

    /// Whether a guild has any contest still flagged active
    fn has_active_contest(&self, guild_id: &str) -> Result<bool>;

    /// Clear a contest's active flag
    fn deactivate_contest(&self, id: Uuid) -> Result<bool>;

    /// List all contests for a guild
    fn list_contests_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>>;
}

/// Hours ledger operations
pub trait LedgerRepository {
    /// Append a record
    fn insert_record(&self, record: &HoursRecord) -> Result<()>;

    /// Find a record by ID
    fn find_record_by_id(&self, id: Uuid) -> Result<Option<HoursRecord>>;

    /// Find the record a session already produced for a participant
    fn find_record_by_session(
        &self,
        contest_id: Uuid,
        participant_id: &str,
        session_id: Uuid,
    ) -> Result<Option<HoursRecord>>;

    /// Sum of valid hours a participant already has on a date
    fn hours_on_date(&self, contest_id: Uuid, participant_id: &str, date: NaiveDate)
        -> Result<f64>;

    /// Sums over all valid rows of one participant
    fn totals_for_participant(&self, contest_id: Uuid, participant_id: &str)
        -> Result<HoursTotals>;

    /// Soft-delete a record
    fn invalidate_record(&self, id: Uuid) -> Result<bool>;
}

/// Participant summary operations
pub trait ParticipantRepository {
    /// Insert or replace a summary row
    fn upsert_participant(&self, participant: &Participant) -> Result<()>;

    /// Find the summary for one participant
    fn find_participant(&self, contest_id: Uuid, participant_id: &str)
        -> Result<Option<Participant>>;

    /// All eligible participants, highest total first
    fn list_eligible(&self, contest_id: Uuid) -> Result<Vec<Participant>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite or mocks.
pub trait Storage: ContestRepository + LedgerRepository + ParticipantRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: ContestRepository + LedgerRepository + ParticipantRepository {}
