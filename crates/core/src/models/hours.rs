//! Hours ledger entry - one record per closed session per participant

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which reward period a session mostly fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryPeriod {
    Afternoon,
    Night,
    /// Nonzero hours in both periods, evenly split.
    Mixed,
    /// No hours in either period; still counts toward the total.
    Other,
}

impl PrimaryPeriod {
    /// Classify by comparing post-cap period hours.
    pub fn classify(afternoon_hours: f64, night_hours: f64) -> Self {
        if afternoon_hours > night_hours && afternoon_hours > 0.0 {
            PrimaryPeriod::Afternoon
        } else if night_hours > afternoon_hours && night_hours > 0.0 {
            PrimaryPeriod::Night
        } else if afternoon_hours > 0.0 && night_hours > 0.0 {
            PrimaryPeriod::Mixed
        } else {
            PrimaryPeriod::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryPeriod::Afternoon => "afternoon",
            PrimaryPeriod::Night => "night",
            PrimaryPeriod::Mixed => "mixed",
            PrimaryPeriod::Other => "other",
        }
    }
}

impl std::fmt::Display for PrimaryPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only ledger entry holding the hours one closed session earned a
/// participant. Never deleted; `valid` is cleared to drop it from the
/// aggregates while keeping the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursRecord {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub participant_id: String,
    pub display_name: String,
    /// Source session, used to keep reprocessed close events idempotent.
    pub session_id: Uuid,
    /// Calendar date of the session start; the daily cap is per date.
    pub record_date: NaiveDate,
    /// Raw session length before any cap.
    pub duration_hours: f64,
    /// Post-cap hours credited to the participant.
    pub total_hours: f64,
    pub afternoon_hours: f64,
    pub night_hours: f64,
    pub primary_period: PrimaryPeriod,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
}
