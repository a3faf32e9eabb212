//! Hours accounting engine
//!
//! The single write path into the hours ledger: classifies a closed
//! session against the contest's daily periods, clips it to the per-day
//! cap, appends the ledger record, and rebuilds the participant summary.

mod locks;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{Contest, HoursRecord, Participant, PrimaryPeriod, SessionClosed};
use crate::storage::Database;

pub use locks::KeyLocks;

/// What recording a close event did.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// A ledger row was appended (possibly with zero hours when the daily
    /// cap was already exhausted) and the summary refreshed.
    Recorded(HoursRecord),
    /// The session was already recorded; nothing changed.
    Duplicate,
    /// The session started outside the contest window; ignored.
    OutsideWindow,
    /// The guild has no running contest; ignored.
    NoActiveContest,
}

/// Scale raw period hours down to what the daily cap still allows.
///
/// `already` is the participant's valid ledger sum for the date. When the
/// session's period hours exceed the remaining allowance, both components
/// shrink by the same ratio, preserving the afternoon:night split.
pub fn apply_daily_cap(
    max_daily_hours: f64,
    already: f64,
    raw_afternoon: f64,
    raw_night: f64,
) -> (f64, f64) {
    let remaining = (max_daily_hours - already).max(0.0);
    let raw_total = raw_afternoon + raw_night;
    if raw_total <= remaining {
        return (raw_afternoon, raw_night);
    }
    if raw_total <= 0.0 {
        return (0.0, 0.0);
    }
    let ratio = remaining / raw_total;
    (raw_afternoon * ratio, raw_night * ratio)
}

/// Hours accounting engine over a shared database handle.
pub struct HoursEngine {
    db: Arc<Mutex<Database>>,
    locks: KeyLocks,
}

impl HoursEngine {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self {
            db,
            locks: KeyLocks::new(),
        }
    }

    /// Record a close event against the guild's currently running contest.
    /// Events for guilds without one are ignored, not failed.
    pub fn process_session(&self, event: &SessionClosed) -> Result<RecordOutcome> {
        let contest = {
            let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
            db.contests().find_active_for_guild(&event.guild_id, Utc::now())?
        };

        match contest {
            Some(contest) => self.record_session(&contest, event),
            None => {
                debug!(guild_id = %event.guild_id, session_id = %event.session_id,
                    "No running contest; session ignored");
                Ok(RecordOutcome::NoActiveContest)
            }
        }
    }

    /// Record a close event against a specific contest.
    ///
    /// Holds the (contest, participant) lock across the cap read, the
    /// ledger append, and the summary refresh, so concurrent closures for
    /// the same participant on the same date serialize.
    pub fn record_session(&self, contest: &Contest, event: &SessionClosed) -> Result<RecordOutcome> {
        if event.ended_at <= event.started_at {
            return Err(Error::InvalidOperation(format!(
                "session {} ends at or before its start",
                event.session_id
            )));
        }

        if !contest.contains(event.started_at) {
            debug!(session_id = %event.session_id, contest_id = %contest.id,
                "Session started outside the contest window; ignored");
            return Ok(RecordOutcome::OutsideWindow);
        }

        let key = self.locks.acquire(contest.id, &event.participant_id)?;
        let _serialized = key.lock().map_err(|_| Error::LockPoisoned)?;
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;

        if db
            .ledger()
            .find_by_session(contest.id, &event.participant_id, event.session_id)?
            .is_some()
        {
            debug!(session_id = %event.session_id, participant_id = %event.participant_id,
                "Session already recorded; skipping");
            return Ok(RecordOutcome::Duplicate);
        }

        let date = event.start_date();
        let session_start = event.started_at.naive_utc();
        let session_end = event.ended_at.naive_utc();

        let raw_afternoon = contest
            .afternoon
            .overlap_hours(date, session_start, session_end);
        let raw_night = contest.night.overlap_hours(date, session_start, session_end);
        let duration = event.duration_hours();

        let already = db
            .ledger()
            .hours_on_date(contest.id, &event.participant_id, date)?;
        let remaining = (contest.max_daily_hours - already).max(0.0);
        let (afternoon, night) =
            apply_daily_cap(contest.max_daily_hours, already, raw_afternoon, raw_night);
        // Cap the credited total as well so same-day cap reads stay exact.
        let total = duration.min(remaining);

        let record = HoursRecord {
            id: Uuid::new_v4(),
            contest_id: contest.id,
            participant_id: event.participant_id.clone(),
            display_name: event.display_name.clone(),
            session_id: event.session_id,
            record_date: date,
            duration_hours: duration,
            total_hours: total,
            afternoon_hours: afternoon,
            night_hours: night,
            primary_period: PrimaryPeriod::classify(afternoon, night),
            valid: true,
            created_at: Utc::now(),
        };
        invariants::assert_record_invariants(&record);

        db.ledger().insert(&record)?;
        let participant = refresh_in(&db, contest, &event.participant_id, &event.display_name)?;
        invariants::assert_participant_invariants(&participant, contest.required_hours);

        info!(
            participant_id = %event.participant_id,
            session_id = %event.session_id,
            total = record.total_hours,
            afternoon = record.afternoon_hours,
            night = record.night_hours,
            period = %record.primary_period,
            "Recorded patrol session hours"
        );

        Ok(RecordOutcome::Recorded(record))
    }

    /// Rebuild one participant's summary from the valid ledger rows.
    pub fn refresh_participant(
        &self,
        contest: &Contest,
        participant_id: &str,
        display_name: &str,
    ) -> Result<Participant> {
        let key = self.locks.acquire(contest.id, participant_id)?;
        let _serialized = key.lock().map_err(|_| Error::LockPoisoned)?;
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        refresh_in(&db, contest, participant_id, display_name)
    }

    /// Soft-delete a ledger record and rebuild the owning participant's
    /// summary. The row stays visible in the ledger as an audit trail.
    pub fn invalidate_record(&self, record_id: Uuid) -> Result<Participant> {
        let (record, contest) = {
            let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
            let record = db
                .ledger()
                .find_by_id(record_id)?
                .ok_or_else(|| Error::NotFound(format!("hours record {record_id}")))?;
            let contest = db
                .contests()
                .find_by_id(record.contest_id)?
                .ok_or_else(|| Error::NotFound(format!("contest {}", record.contest_id)))?;
            (record, contest)
        };

        let key = self.locks.acquire(contest.id, &record.participant_id)?;
        let _serialized = key.lock().map_err(|_| Error::LockPoisoned)?;
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;

        db.ledger().invalidate(record_id)?;
        let participant = refresh_in(&db, &contest, &record.participant_id, &record.display_name)?;

        info!(record_id = %record_id, participant_id = %record.participant_id,
            "Invalidated hours record and refreshed totals");

        Ok(participant)
    }

    /// Look up one participant's summary.
    pub fn participant(&self, contest_id: Uuid, participant_id: &str) -> Result<Option<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.participants().find(contest_id, participant_id)
    }

    /// Eligible participants, highest total first (leaderboard order).
    pub fn eligible_participants(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.participants().list_eligible(contest_id)
    }
}

/// Full re-sum of the valid ledger rows for one pair. A re-sum rather than
/// an incremental delta keeps the summary correct under invalidation.
fn refresh_in(
    db: &Database,
    contest: &Contest,
    participant_id: &str,
    display_name: &str,
) -> Result<Participant> {
    let totals = db.ledger().totals_for(contest.id, participant_id)?;

    let mut participant = db
        .participants()
        .find(contest.id, participant_id)?
        .unwrap_or_else(|| {
            Participant::new(
                contest.id,
                participant_id.to_string(),
                display_name.to_string(),
            )
        });

    participant.display_name = display_name.to_string();
    participant.total_afternoon_hours = totals.afternoon;
    participant.total_night_hours = totals.night;
    participant.total_hours = totals.total;
    participant.recompute_eligibility(contest.required_hours);
    participant.last_updated = Utc::now();

    db.participants().upsert(&participant)?;
    Ok(participant)
}
