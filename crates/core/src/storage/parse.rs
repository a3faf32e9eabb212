//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Error as SqlError;
use uuid::Uuid;

use crate::models::PrimaryPeriod;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

fn conversion_error<E>(err: E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(conversion_error)
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

/// Parse a calendar date from a `YYYY-MM-DD` string
pub fn parse_date(s: &str) -> Result<NaiveDate, SqlError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(conversion_error)
}

/// Parse a time-of-day from an `HH:MM:SS` string
pub fn parse_time(s: &str) -> Result<NaiveTime, SqlError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(conversion_error)
}

/// Format a calendar date the way `parse_date` reads it
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Format a time-of-day the way `parse_time` reads it
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Convert a stored tag to a PrimaryPeriod; unknown tags fall back to Other
pub fn period_from_str(value: &str) -> PrimaryPeriod {
    match value {
        "afternoon" => PrimaryPeriod::Afternoon,
        "night" => PrimaryPeriod::Night,
        "mixed" => PrimaryPeriod::Mixed,
        _ => PrimaryPeriod::Other,
    }
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
