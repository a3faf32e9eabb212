//! Contest model - the configuration a guild's patrol drive runs under

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::periods::PeriodWindow;

/// A patrol contest: a bounded window during which patrol hours accumulate
/// toward reward eligibility, with two daily periods feeding the two
/// reward tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub id: Uuid,
    /// Community the contest belongs to (platform guild identifier).
    pub guild_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Inclusive contest window.
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Total hours needed for reward eligibility.
    pub required_hours: u32,
    /// Per-participant cap per calendar date.
    pub max_daily_hours: f64,
    pub afternoon: PeriodWindow,
    pub night: PeriodWindow,
    /// Draw sizes for the two reward tiers.
    pub afternoon_winners: u32,
    pub night_vip_winners: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl Contest {
    pub fn new(
        guild_id: String,
        title: String,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id,
            title,
            description: None,
            start_at,
            end_at,
            required_hours: 18,
            max_daily_hours: 4.5,
            afternoon: PeriodWindow::from_hm(13, 0, 18, 0),
            night: PeriodWindow::from_hm(19, 0, 0, 0),
            afternoon_winners: 3,
            night_vip_winners: 2,
            active: true,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Whether an instant falls inside the inclusive contest window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_at <= instant && instant <= self.end_at
    }
}
