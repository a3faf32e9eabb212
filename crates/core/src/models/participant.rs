//! Participant summary - materialized totals per (contest, participant)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One summary row per contest participant. Totals are always rebuilt from
/// the valid ledger rows; this struct is never an independent source of
/// truth. Winner flags are owned by the lottery engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub participant_id: String,
    pub display_name: String,
    pub total_afternoon_hours: f64,
    pub total_night_hours: f64,
    pub total_hours: f64,
    pub eligible: bool,
    pub afternoon_eligible: bool,
    pub night_eligible: bool,
    pub afternoon_winner: bool,
    pub night_vip_winner: bool,
    pub last_updated: DateTime<Utc>,
}

impl Participant {
    pub fn new(contest_id: Uuid, participant_id: String, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            contest_id,
            participant_id,
            display_name,
            total_afternoon_hours: 0.0,
            total_night_hours: 0.0,
            total_hours: 0.0,
            eligible: false,
            afternoon_eligible: false,
            night_eligible: false,
            afternoon_winner: false,
            night_vip_winner: false,
            last_updated: Utc::now(),
        }
    }

    /// Rederive the eligibility flags from the current totals. Period
    /// eligibility requires overall eligibility plus any hours in that
    /// period.
    pub fn recompute_eligibility(&mut self, required_hours: u32) {
        self.eligible = self.total_hours >= f64::from(required_hours);
        self.afternoon_eligible = self.eligible && self.total_afternoon_hours > 0.0;
        self.night_eligible = self.eligible && self.total_night_hours > 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_threshold_is_inclusive() {
        let mut p = Participant::new(Uuid::new_v4(), "u1".into(), "User One".into());
        p.total_hours = 18.0;
        p.total_afternoon_hours = 18.0;
        p.recompute_eligibility(18);
        assert!(p.eligible);
        assert!(p.afternoon_eligible);
        assert!(!p.night_eligible);
    }

    #[test]
    fn test_period_eligibility_requires_overall_eligibility() {
        let mut p = Participant::new(Uuid::new_v4(), "u1".into(), "User One".into());
        p.total_hours = 10.0;
        p.total_afternoon_hours = 10.0;
        p.total_night_hours = 2.0;
        p.recompute_eligibility(18);
        assert!(!p.eligible);
        assert!(!p.afternoon_eligible);
        assert!(!p.night_eligible);
    }
}
