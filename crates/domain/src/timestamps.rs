// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Textual date and timestamp formats shared by storage and the API.
//!
//! Timestamps are always rendered in UTC with second precision so their
//! text form sorts chronologically.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::error::DomainError;

/// Returns the current UTC time truncated to whole seconds.
///
/// Stored timestamps have second precision; truncating up front keeps
/// in-memory records equal to what a later read returns.
#[must_use]
pub fn current_timestamp() -> OffsetDateTime {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond()))
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SSZ` in UTC.
#[must_use]
pub fn format_timestamp(value: OffsetDateTime) -> String {
    let utc: OffsetDateTime = value.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| DomainError::DateParseError {
        date_string: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(value: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the text is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}
