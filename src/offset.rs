//! UTC offset used when rendering timestamp literals.
//!
//! The offset is captured once (from the host clock or the command line) and
//! handed to the row renderer, so output never depends on when a row happens
//! to be written.

use std::{fmt, str::FromStr};

use chrono::{FixedOffset, Local, Offset, Utc};

use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetStyle {
    /// `+0530`
    Compact,
    /// `+05:30`
    Colon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset(FixedOffset);

impl UtcOffset {
    pub fn local() -> Self {
        UtcOffset(Local::now().offset().fix())
    }

    pub fn utc() -> Self {
        UtcOffset(Utc.fix())
    }

    pub fn from_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(UtcOffset)
    }

    pub fn fixed(&self) -> FixedOffset {
        self.0
    }

    pub fn seconds(&self) -> i32 {
        self.0.local_minus_utc()
    }

    pub fn format(&self, style: OffsetStyle) -> String {
        let total = self.seconds();
        let sign = if total < 0 { '-' } else { '+' };
        let minutes = total.unsigned_abs() / 60;
        let (hours, minutes) = (minutes / 60, minutes % 60);
        match style {
            OffsetStyle::Compact => format!("{sign}{hours:02}{minutes:02}"),
            OffsetStyle::Colon => format!("{sign}{hours:02}:{minutes:02}"),
        }
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(OffsetStyle::Colon))
    }
}

impl FromStr for UtcOffset {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConvertError::InvalidOffset(value.to_string());
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(UtcOffset::utc());
        }

        let (sign, body) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let digits: String = match body.len() {
            2 | 4 => body.to_string(),
            5 if body.as_bytes()[2] == b':' => body.replacen(':', "", 1),
            _ => return Err(invalid()),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = match digits.get(2..) {
            Some(rest) if !rest.is_empty() => rest.parse().map_err(|_| invalid())?,
            _ => 0,
        };
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        UtcOffset::from_seconds(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
    }
}
