//! Contest storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    format_time, parse_datetime, parse_time, parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::Contest;
use crate::periods::PeriodWindow;

pub struct ContestStore<'a> {
    conn: &'a Connection,
}

const CONTEST_COLUMNS: &str = "id, guild_id, title, description, start_at, end_at, \
     required_hours, max_daily_hours, afternoon_start, afternoon_end, \
     night_start, night_end, afternoon_winners, night_vip_winners, \
     active, created_at, created_by";

fn read_contest(row: &Row<'_>) -> rusqlite::Result<Contest> {
    Ok(Contest {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        guild_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        start_at: parse_datetime(&row.get::<_, String>(4)?)?,
        end_at: parse_datetime(&row.get::<_, String>(5)?)?,
        required_hours: row.get(6)?,
        max_daily_hours: row.get(7)?,
        afternoon: PeriodWindow::new(
            parse_time(&row.get::<_, String>(8)?)?,
            parse_time(&row.get::<_, String>(9)?)?,
        ),
        night: PeriodWindow::new(
            parse_time(&row.get::<_, String>(10)?)?,
            parse_time(&row.get::<_, String>(11)?)?,
        ),
        afternoon_winners: row.get(12)?,
        night_vip_winners: row.get(13)?,
        active: row.get::<_, i32>(14)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(15)?)?,
        created_by: row.get(16)?,
    })
}

impl<'a> ContestStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new contest
    #[instrument(skip(self, contest), fields(contest_id = %contest.id, guild_id = %contest.guild_id))]
    pub fn create(&self, contest: &Contest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO contests (id, guild_id, title, description, start_at, end_at,
                 required_hours, max_daily_hours, afternoon_start, afternoon_end,
                 night_start, night_end, afternoon_winners, night_vip_winners,
                 active, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                contest.id.to_string(),
                contest.guild_id,
                contest.title,
                contest.description,
                contest.start_at.to_rfc3339(),
                contest.end_at.to_rfc3339(),
                contest.required_hours,
                contest.max_daily_hours,
                format_time(contest.afternoon.start),
                format_time(contest.afternoon.end),
                format_time(contest.night.start),
                format_time(contest.night.end),
                contest.afternoon_winners,
                contest.night_vip_winners,
                contest.active as i32,
                contest.created_at.to_rfc3339(),
                contest.created_by,
            ],
        )?;
        Ok(())
    }

    /// Find contest by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Contest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests WHERE id = ?1"
        ))?;

        let contest = stmt
            .query_row(params![id.to_string()], read_contest)
            .optional()?;

        Ok(contest)
    }

    /// Find the contest currently running for a guild: active flag set and
    /// `now` inside the inclusive window
    #[instrument(skip(self))]
    pub fn find_active_for_guild(
        &self,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Contest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests
             WHERE guild_id = ?1 AND active = 1 AND start_at <= ?2 AND end_at >= ?2
             ORDER BY created_at DESC
             LIMIT 1"
        ))?;

        let contest = stmt
            .query_row(params![guild_id, now.to_rfc3339()], read_contest)
            .optional()?;

        Ok(contest)
    }

    /// Whether any contest is still flagged active for a guild, regardless
    /// of its window
    #[instrument(skip(self))]
    pub fn has_active_for_guild(&self, guild_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM contests WHERE guild_id = ?1 AND active = 1",
            params![guild_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Clear the active flag
    #[instrument(skip(self))]
    pub fn deactivate(&self, id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE contests SET active = 0 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// List all contests for a guild, newest first
    #[instrument(skip(self))]
    pub fn list_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests
             WHERE guild_id = ?1
             ORDER BY created_at DESC"
        ))?;

        let contests = stmt
            .query_map(params![guild_id], read_contest)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(contests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::TimeZone;

    fn make_contest(guild_id: &str) -> Contest {
        Contest::new(
            guild_id.to_string(),
            "August Patrol Drive".to_string(),
            Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap(),
        )
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let contest = make_contest("guild-1").with_description("Monthly drive".into());
        db.contests().create(&contest).unwrap();

        let found = db.contests().find_by_id(contest.id).unwrap().unwrap();
        assert_eq!(found.title, "August Patrol Drive");
        assert_eq!(found.description.as_deref(), Some("Monthly drive"));
        assert_eq!(found.required_hours, 18);
        assert_eq!(found.afternoon, contest.afternoon);
        assert_eq!(found.night, contest.night);
        assert!(found.active);
    }

    #[test]
    fn test_active_lookup_respects_window() {
        let db = Database::open_in_memory().unwrap();
        let contest = make_contest("guild-1");
        db.contests().create(&contest).unwrap();

        let inside = Utc.with_ymd_and_hms(2024, 8, 15, 12, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap();

        assert!(db
            .contests()
            .find_active_for_guild("guild-1", inside)
            .unwrap()
            .is_some());
        assert!(db
            .contests()
            .find_active_for_guild("guild-1", after)
            .unwrap()
            .is_none());
        assert!(db
            .contests()
            .find_active_for_guild("guild-2", inside)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_deactivate() {
        let db = Database::open_in_memory().unwrap();
        let contest = make_contest("guild-1");
        db.contests().create(&contest).unwrap();

        assert!(db.contests().has_active_for_guild("guild-1").unwrap());
        assert!(db.contests().deactivate(contest.id).unwrap());
        assert!(!db.contests().has_active_for_guild("guild-1").unwrap());

        let inside = Utc.with_ymd_and_hms(2024, 8, 15, 12, 0, 0).unwrap();
        assert!(db
            .contests()
            .find_active_for_guild("guild-1", inside)
            .unwrap()
            .is_none());
    }
}
