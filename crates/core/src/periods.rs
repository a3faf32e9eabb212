//! Daily reward periods and session overlap math
//!
//! A contest names two daily windows (afternoon and night). Sessions are
//! classified by how much of their span falls inside each window, anchored
//! to the session's start date. A window whose end precedes its start
//! crosses midnight into the next day.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// A named daily time window, e.g. 13:00-18:00 or 19:00-00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PeriodWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build a window from hour/minute literals.
    ///
    /// Panics on out-of-range components; callers pass constants.
    pub fn from_hm(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Self {
        let start = NaiveTime::from_hms_opt(start_hour, start_min, 0)
            .expect("window start must be a valid time of day");
        let end = NaiveTime::from_hms_opt(end_hour, end_min, 0)
            .expect("window end must be a valid time of day");
        Self { start, end }
    }

    /// An end strictly before the start wraps into the next day.
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Equal endpoints degenerate to a zero-width window, not a full day.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Hours of overlap between a session span and this window anchored to
    /// `date`. Returns 0 when the spans are disjoint or the window is empty.
    pub fn overlap_hours(
        &self,
        date: NaiveDate,
        session_start: NaiveDateTime,
        session_end: NaiveDateTime,
    ) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let window_start = date.and_time(self.start);
        let window_end = if self.crosses_midnight() {
            (date + Days::new(1)).and_time(self.end)
        } else {
            date.and_time(self.end)
        };

        let overlap_start = session_start.max(window_start);
        let overlap_end = session_end.min(window_end);

        if overlap_start < overlap_end {
            (overlap_end - overlap_start).num_seconds() as f64 / SECONDS_PER_HOUR
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 11).unwrap()
    }

    fn at(day_offset: u64, h: u32, m: u32) -> NaiveDateTime {
        (date() + Days::new(day_offset)).and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_session_fully_inside_window() {
        let window = PeriodWindow::from_hm(13, 0, 18, 0);
        let hours = window.overlap_hours(date(), at(0, 14, 0), at(0, 16, 30));
        assert!((hours - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_session_fully_outside_window() {
        let window = PeriodWindow::from_hm(13, 0, 18, 0);
        assert_eq!(window.overlap_hours(date(), at(0, 8, 0), at(0, 12, 0)), 0.0);
        assert_eq!(window.overlap_hours(date(), at(0, 18, 0), at(0, 22, 0)), 0.0);
    }

    #[test]
    fn test_partial_overlap_clamps_to_window() {
        let window = PeriodWindow::from_hm(13, 0, 18, 0);
        // 11:00-15:00 only counts from 13:00.
        let hours = window.overlap_hours(date(), at(0, 11, 0), at(0, 15, 0));
        assert!((hours - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_midnight_crossing_window_counts_until_midnight() {
        // 19:00-00:00 runs to midnight of the next day; a 23:00-01:00
        // session overlaps exactly one hour with the anchored instance.
        let window = PeriodWindow::from_hm(19, 0, 0, 0);
        assert!(window.crosses_midnight());
        let hours = window.overlap_hours(date(), at(0, 23, 0), at(1, 1, 0));
        assert!((hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_midnight_crossing_window_spans_both_sides() {
        let window = PeriodWindow::from_hm(22, 0, 2, 0);
        let hours = window.overlap_hours(date(), at(0, 21, 0), at(1, 3, 0));
        assert!((hours - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_never_matches() {
        let window = PeriodWindow::from_hm(13, 0, 13, 0);
        assert!(window.is_empty());
        assert!(!window.crosses_midnight());
        // Even a session covering the whole day yields nothing.
        assert_eq!(window.overlap_hours(date(), at(0, 0, 0), at(1, 0, 0)), 0.0);
    }

    #[test]
    fn test_session_inside_non_crossing_window_equals_duration() {
        let window = PeriodWindow::from_hm(13, 0, 18, 0);
        let hours = window.overlap_hours(date(), at(0, 13, 0), at(0, 18, 0));
        assert!((hours - 5.0).abs() < 1e-9);
    }
}
