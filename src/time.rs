use chrono::{Duration, NaiveDateTime, Utc};

use crate::error::TimeError;

/// Timestamp layout shared by the sort key, query bounds and responses.
/// The fraction is printed only when non-zero, in 3/6/9-digit groups, so
/// lexical order over the stored strings matches chronological order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn now_iso() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

/// Re-serializes `datetime` minus `offset` hours. Pure hour arithmetic,
/// no timezone-name awareness.
pub fn shift_hours(datetime: &str, offset: i64) -> Result<String, TimeError> {
    let parsed = NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT)?;
    let delta = Duration::try_hours(offset).ok_or(TimeError::OffsetOutOfRange(offset))?;
    let shifted = parsed
        .checked_sub_signed(delta)
        .ok_or(TimeError::OffsetOutOfRange(offset))?;
    Ok(shifted.format(DATETIME_FORMAT).to_string())
}
