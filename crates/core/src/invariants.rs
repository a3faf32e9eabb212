//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{HoursRecord, Participant};

/// Slack for floating-point hour sums.
const EPSILON: f64 = 1e-9;

/// Validate that a ledger record's hour fields are internally consistent
pub fn assert_record_invariants(record: &HoursRecord) {
    debug_assert!(
        record.afternoon_hours >= 0.0
            && record.night_hours >= 0.0
            && record.total_hours >= 0.0
            && record.duration_hours >= 0.0,
        "Record {} has negative hours",
        record.id
    );

    debug_assert!(
        record.afternoon_hours + record.night_hours <= record.total_hours + EPSILON,
        "Record {} period hours {} exceed total {}",
        record.id,
        record.afternoon_hours + record.night_hours,
        record.total_hours
    );

    debug_assert!(
        record.total_hours <= record.duration_hours + EPSILON,
        "Record {} total {} exceeds session duration {}",
        record.id,
        record.total_hours,
        record.duration_hours
    );
}

/// Validate that a participant summary's flags match its totals
pub fn assert_participant_invariants(participant: &Participant, required_hours: u32) {
    debug_assert!(
        participant.total_afternoon_hours >= 0.0
            && participant.total_night_hours >= 0.0
            && participant.total_hours >= 0.0,
        "Participant {} has negative totals",
        participant.participant_id
    );

    debug_assert_eq!(
        participant.eligible,
        participant.total_hours >= f64::from(required_hours),
        "Participant {} eligibility does not match totals",
        participant.participant_id
    );

    debug_assert!(
        !(participant.afternoon_eligible && !participant.eligible),
        "Participant {} is afternoon-eligible without being eligible",
        participant.participant_id
    );

    debug_assert!(
        !(participant.night_eligible && !participant.eligible),
        "Participant {} is night-eligible without being eligible",
        participant.participant_id
    );
}

/// Validate a draw result against its pool
pub fn assert_draw_invariants(winners: &[Participant], pool_size: usize, configured: usize) {
    debug_assert_eq!(
        winners.len(),
        configured.min(pool_size),
        "Draw produced {} winners from a pool of {} with {} configured",
        winners.len(),
        pool_size,
        configured
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::models::PrimaryPeriod;

    fn make_record() -> HoursRecord {
        HoursRecord {
            id: Uuid::new_v4(),
            contest_id: Uuid::new_v4(),
            participant_id: "user-1".to_string(),
            display_name: "User One".to_string(),
            session_id: Uuid::new_v4(),
            record_date: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
            duration_hours: 5.0,
            total_hours: 4.5,
            afternoon_hours: 4.5,
            night_hours: 0.0,
            primary_period: PrimaryPeriod::Afternoon,
            valid: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_record() {
        assert_record_invariants(&make_record());
    }

    #[test]
    #[should_panic(expected = "exceed total")]
    fn test_period_hours_above_total_panic() {
        let mut record = make_record();
        record.afternoon_hours = 6.0;
        assert_record_invariants(&record);
    }

    #[test]
    #[should_panic(expected = "exceeds session duration")]
    fn test_total_above_duration_panics() {
        let mut record = make_record();
        record.total_hours = 9.0;
        record.afternoon_hours = 0.0;
        assert_record_invariants(&record);
    }

    #[test]
    fn test_valid_participant() {
        let mut p = Participant::new(Uuid::new_v4(), "user-1".into(), "User One".into());
        p.total_hours = 20.0;
        p.total_afternoon_hours = 20.0;
        p.recompute_eligibility(18);
        assert_participant_invariants(&p, 18);
    }

    #[test]
    #[should_panic(expected = "eligibility does not match")]
    fn test_stale_eligibility_panics() {
        let mut p = Participant::new(Uuid::new_v4(), "user-1".into(), "User One".into());
        p.total_hours = 20.0;
        // recompute_eligibility never ran; the flag is stale.
        assert_participant_invariants(&p, 18);
    }

    #[test]
    fn test_draw_sizes() {
        assert_draw_invariants(&[], 0, 3);
        let p = Participant::new(Uuid::new_v4(), "user-1".into(), "User One".into());
        assert_draw_invariants(&[p], 5, 1);
    }
}
