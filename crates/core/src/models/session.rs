//! Session-closed event consumed from the scheduling collaborator

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed patrol session for one participant. Delivery is
/// at-least-once; the ledger deduplicates on `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClosed {
    pub guild_id: String,
    pub session_id: Uuid,
    pub participant_id: String,
    pub display_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionClosed {
    /// Raw session length in hours; never negative.
    pub fn duration_hours(&self) -> f64 {
        let seconds = (self.ended_at - self.started_at).num_seconds().max(0);
        seconds as f64 / 3600.0
    }

    /// Calendar date the session started on; anchors the daily periods
    /// and the per-day cap.
    pub fn start_date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}
