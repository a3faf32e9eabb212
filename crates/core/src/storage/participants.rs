//! Participant summary storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::Participant;

pub struct ParticipantStore<'a> {
    conn: &'a Connection,
}

const PARTICIPANT_COLUMNS: &str = "id, contest_id, participant_id, display_name, \
     total_afternoon_hours, total_night_hours, total_hours, \
     eligible, afternoon_eligible, night_eligible, \
     afternoon_winner, night_vip_winner, last_updated";

fn read_participant(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        contest_id: parse_uuid(&row.get::<_, String>(1)?)?,
        participant_id: row.get(2)?,
        display_name: row.get(3)?,
        total_afternoon_hours: row.get(4)?,
        total_night_hours: row.get(5)?,
        total_hours: row.get(6)?,
        eligible: row.get::<_, i32>(7)? != 0,
        afternoon_eligible: row.get::<_, i32>(8)? != 0,
        night_eligible: row.get::<_, i32>(9)? != 0,
        afternoon_winner: row.get::<_, i32>(10)? != 0,
        night_vip_winner: row.get::<_, i32>(11)? != 0,
        last_updated: parse_datetime(&row.get::<_, String>(12)?)?,
    })
}

impl<'a> ParticipantStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace the summary row for (contest, participant)
    #[instrument(skip(self, participant), fields(participant_id = %participant.participant_id))]
    pub fn upsert(&self, participant: &Participant) -> Result<()> {
        self.conn.execute(
            "INSERT INTO participants (id, contest_id, participant_id, display_name,
                 total_afternoon_hours, total_night_hours, total_hours,
                 eligible, afternoon_eligible, night_eligible,
                 afternoon_winner, night_vip_winner, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(contest_id, participant_id) DO UPDATE SET
                 display_name = ?4,
                 total_afternoon_hours = ?5,
                 total_night_hours = ?6,
                 total_hours = ?7,
                 eligible = ?8,
                 afternoon_eligible = ?9,
                 night_eligible = ?10,
                 afternoon_winner = ?11,
                 night_vip_winner = ?12,
                 last_updated = ?13",
            params![
                participant.id.to_string(),
                participant.contest_id.to_string(),
                participant.participant_id,
                participant.display_name,
                participant.total_afternoon_hours,
                participant.total_night_hours,
                participant.total_hours,
                participant.eligible as i32,
                participant.afternoon_eligible as i32,
                participant.night_eligible as i32,
                participant.afternoon_winner as i32,
                participant.night_vip_winner as i32,
                participant.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find the summary for one participant
    #[instrument(skip(self))]
    pub fn find(&self, contest_id: Uuid, participant_id: &str) -> Result<Option<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE contest_id = ?1 AND participant_id = ?2"
        ))?;

        let participant = stmt
            .query_row(params![contest_id.to_string(), participant_id], read_participant)
            .optional()?;

        Ok(participant)
    }

    fn list_where(&self, filter: &str, contest_id: Uuid) -> Result<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE contest_id = ?1 AND {filter}
             ORDER BY total_hours DESC, participant_id"
        ))?;

        let participants = stmt
            .query_map(params![contest_id.to_string()], read_participant)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }

    /// All eligible participants, highest total first (leaderboard order)
    #[instrument(skip(self))]
    pub fn list_eligible(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("eligible = 1", contest_id)
    }

    /// Pool for the afternoon draw
    #[instrument(skip(self))]
    pub fn list_afternoon_eligible(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("afternoon_eligible = 1", contest_id)
    }

    /// Afternoon-eligible participants the afternoon draw passed over;
    /// they get a second chance in the night VIP draw
    #[instrument(skip(self))]
    pub fn list_afternoon_eligible_non_winners(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("afternoon_eligible = 1 AND afternoon_winner = 0", contest_id)
    }

    /// Pool seed for the night VIP draw
    #[instrument(skip(self))]
    pub fn list_night_eligible(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("night_eligible = 1", contest_id)
    }

    /// Winners of the latest afternoon draw
    #[instrument(skip(self))]
    pub fn list_afternoon_winners(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("afternoon_winner = 1", contest_id)
    }

    /// Winners of the latest night VIP draw
    #[instrument(skip(self))]
    pub fn list_night_vip_winners(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        self.list_where("night_vip_winner = 1", contest_id)
    }

    /// Reset a whole contest's afternoon winner flags before a re-draw
    #[instrument(skip(self))]
    pub fn clear_afternoon_winners(&self, contest_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE participants SET afternoon_winner = 0 WHERE contest_id = ?1",
            params![contest_id.to_string()],
        )?;
        Ok(())
    }

    /// Reset a whole contest's night VIP winner flags before a re-draw
    #[instrument(skip(self))]
    pub fn clear_night_vip_winners(&self, contest_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE participants SET night_vip_winner = 0 WHERE contest_id = ?1",
            params![contest_id.to_string()],
        )?;
        Ok(())
    }

    /// Flag one summary row as an afternoon winner
    #[instrument(skip(self))]
    pub fn mark_afternoon_winner(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE participants SET afternoon_winner = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Flag one summary row as a night VIP winner
    #[instrument(skip(self))]
    pub fn mark_night_vip_winner(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE participants SET night_vip_winner = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }
}
