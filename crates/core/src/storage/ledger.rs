//! Hours ledger storage operations
//!
//! The ledger is append-only: rows are inserted once and only ever
//! flipped to invalid, never updated or deleted.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    format_date, parse_date, parse_datetime, parse_uuid, period_from_str, OptionalExt,
};
use crate::error::Result;
use crate::models::HoursRecord;

/// Summed hours over the valid ledger rows of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoursTotals {
    pub afternoon: f64,
    pub night: f64,
    pub total: f64,
}

pub struct LedgerStore<'a> {
    conn: &'a Connection,
}

const RECORD_COLUMNS: &str = "id, contest_id, participant_id, display_name, session_id, \
     record_date, duration_hours, total_hours, afternoon_hours, night_hours, \
     primary_period, valid, created_at";

fn read_record(row: &Row<'_>) -> rusqlite::Result<HoursRecord> {
    Ok(HoursRecord {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        contest_id: parse_uuid(&row.get::<_, String>(1)?)?,
        participant_id: row.get(2)?,
        display_name: row.get(3)?,
        session_id: parse_uuid(&row.get::<_, String>(4)?)?,
        record_date: parse_date(&row.get::<_, String>(5)?)?,
        duration_hours: row.get(6)?,
        total_hours: row.get(7)?,
        afternoon_hours: row.get(8)?,
        night_hours: row.get(9)?,
        primary_period: period_from_str(&row.get::<_, String>(10)?),
        valid: row.get::<_, i32>(11)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(12)?)?,
    })
}

impl<'a> LedgerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a record
    #[instrument(skip(self, record), fields(record_id = %record.id, participant_id = %record.participant_id))]
    pub fn insert(&self, record: &HoursRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hours_records (id, contest_id, participant_id, display_name,
                 session_id, record_date, duration_hours, total_hours,
                 afternoon_hours, night_hours, primary_period, valid, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.id.to_string(),
                record.contest_id.to_string(),
                record.participant_id,
                record.display_name,
                record.session_id.to_string(),
                format_date(record.record_date),
                record.duration_hours,
                record.total_hours,
                record.afternoon_hours,
                record.night_hours,
                record.primary_period.as_str(),
                record.valid as i32,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find a record by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<HoursRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM hours_records WHERE id = ?1"
        ))?;

        let record = stmt
            .query_row(params![id.to_string()], read_record)
            .optional()?;

        Ok(record)
    }

    /// Find the record a session already produced for a participant
    /// (idempotency guard for at-least-once close events)
    #[instrument(skip(self))]
    pub fn find_by_session(
        &self,
        contest_id: Uuid,
        participant_id: &str,
        session_id: Uuid,
    ) -> Result<Option<HoursRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM hours_records
             WHERE contest_id = ?1 AND participant_id = ?2 AND session_id = ?3"
        ))?;

        let record = stmt
            .query_row(
                params![
                    contest_id.to_string(),
                    participant_id,
                    session_id.to_string()
                ],
                read_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Sum of valid hours a participant already has on a calendar date.
    /// Feeds the daily cap; reads the ledger, never the summary.
    #[instrument(skip(self))]
    pub fn hours_on_date(
        &self,
        contest_id: Uuid,
        participant_id: &str,
        date: NaiveDate,
    ) -> Result<f64> {
        let sum: Option<f64> = self.conn.query_row(
            "SELECT SUM(total_hours) FROM hours_records
             WHERE contest_id = ?1 AND participant_id = ?2 AND record_date = ?3 AND valid = 1",
            params![contest_id.to_string(), participant_id, format_date(date)],
            |row| row.get(0),
        )?;
        Ok(sum.unwrap_or(0.0))
    }

    /// Sums over all valid rows of one participant
    #[instrument(skip(self))]
    pub fn totals_for(&self, contest_id: Uuid, participant_id: &str) -> Result<HoursTotals> {
        let totals = self.conn.query_row(
            "SELECT SUM(afternoon_hours), SUM(night_hours), SUM(total_hours)
             FROM hours_records
             WHERE contest_id = ?1 AND participant_id = ?2 AND valid = 1",
            params![contest_id.to_string(), participant_id],
            |row| {
                Ok(HoursTotals {
                    afternoon: row.get::<_, Option<f64>>(0)?.unwrap_or(0.0),
                    night: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                    total: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            },
        )?;
        Ok(totals)
    }

    /// List all rows (valid and invalidated) for a participant, oldest first
    #[instrument(skip(self))]
    pub fn list_for(&self, contest_id: Uuid, participant_id: &str) -> Result<Vec<HoursRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM hours_records
             WHERE contest_id = ?1 AND participant_id = ?2
             ORDER BY record_date, created_at"
        ))?;

        let records = stmt
            .query_map(params![contest_id.to_string(), participant_id], read_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Soft-delete a record. The row stays for the audit trail but stops
    /// counting toward sums.
    #[instrument(skip(self))]
    pub fn invalidate(&self, id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE hours_records SET valid = 0 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contest, PrimaryPeriod};
    use crate::storage::Database;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Database, Contest) {
        let db = Database::open_in_memory().unwrap();
        let contest = Contest::new(
            "guild-1".to_string(),
            "Drive".to_string(),
            Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap(),
        );
        db.contests().create(&contest).unwrap();
        (db, contest)
    }

    fn make_record(contest_id: Uuid, day: u32, total: f64, afternoon: f64) -> HoursRecord {
        HoursRecord {
            id: Uuid::new_v4(),
            contest_id,
            participant_id: "user-1".to_string(),
            display_name: "User One".to_string(),
            session_id: Uuid::new_v4(),
            record_date: NaiveDate::from_ymd_opt(2024, 8, day).unwrap(),
            duration_hours: total,
            total_hours: total,
            afternoon_hours: afternoon,
            night_hours: 0.0,
            primary_period: PrimaryPeriod::classify(afternoon, 0.0),
            valid: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_find_by_session() {
        let (db, contest) = setup();
        let record = make_record(contest.id, 11, 4.5, 4.5);
        db.ledger().insert(&record).unwrap();

        let found = db
            .ledger()
            .find_by_session(contest.id, "user-1", record.session_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.record_date, record.record_date);
        assert_eq!(found.primary_period, PrimaryPeriod::Afternoon);
        assert!(found.valid);

        let missing = db
            .ledger()
            .find_by_session(contest.id, "user-1", Uuid::new_v4())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_hours_on_date_sums_only_that_date() {
        let (db, contest) = setup();
        db.ledger().insert(&make_record(contest.id, 11, 2.0, 2.0)).unwrap();
        db.ledger().insert(&make_record(contest.id, 11, 1.5, 1.0)).unwrap();
        db.ledger().insert(&make_record(contest.id, 12, 3.0, 3.0)).unwrap();

        let day11 = NaiveDate::from_ymd_opt(2024, 8, 11).unwrap();
        let sum = db.ledger().hours_on_date(contest.id, "user-1", day11).unwrap();
        assert!((sum - 3.5).abs() < 1e-9);

        let day13 = NaiveDate::from_ymd_opt(2024, 8, 13).unwrap();
        assert_eq!(db.ledger().hours_on_date(contest.id, "user-1", day13).unwrap(), 0.0);
    }

    #[test]
    fn test_totals_skip_invalidated_rows() {
        let (db, contest) = setup();
        let keep = make_record(contest.id, 11, 4.0, 4.0);
        let removed = make_record(contest.id, 12, 3.0, 3.0);
        db.ledger().insert(&keep).unwrap();
        db.ledger().insert(&removed).unwrap();

        assert!(db.ledger().invalidate(removed.id).unwrap());

        let totals = db.ledger().totals_for(contest.id, "user-1").unwrap();
        assert!((totals.total - 4.0).abs() < 1e-9);
        assert!((totals.afternoon - 4.0).abs() < 1e-9);

        // The row itself survives for the audit trail.
        let rows = db.ledger().list_for(contest.id, "user-1").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows.iter().find(|r| r.id == removed.id).unwrap().valid);
    }

    #[test]
    fn test_totals_for_unknown_participant_are_zero() {
        let (db, contest) = setup();
        let totals = db.ledger().totals_for(contest.id, "nobody").unwrap();
        assert_eq!(totals, HoursTotals::default());
    }
}
