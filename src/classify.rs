//! Per-value type classification.
//!
//! [`classify()`] looks at a single raw string and decides which SQL-facing
//! class it belongs to. Checks run in a fixed priority order and the first
//! match wins:
//!
//! 1. integer (`[+-]?[0-9]+`)
//! 2. float (any decimal literal `f64` accepts)
//! 3. UUID (hyphenated 8-4-4-4-12 hex)
//! 4. timestamp (`YYYY-MM-DD HH:MM:SS`, nothing else)
//! 5. text
//!
//! The function is pure and is called independently by the column unifier and
//! by the row renderer.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_LEN: usize = 19;
const HYPHENATED_UUID_LEN: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueClass {
    Integer,
    Float,
    Uuid,
    Timestamp,
    Text,
}

impl ValueClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueClass::Integer => "integer",
            ValueClass::Float => "float",
            ValueClass::Uuid => "uuid",
            ValueClass::Timestamp => "timestamp",
            ValueClass::Text => "text",
        }
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(value: &str) -> ValueClass {
    if is_integer(value) {
        ValueClass::Integer
    } else if is_float(value) {
        ValueClass::Float
    } else if is_uuid(value) {
        ValueClass::Uuid
    } else if is_timestamp(value) {
        ValueClass::Timestamp
    } else {
        ValueClass::Text
    }
}

pub fn is_integer(value: &str) -> bool {
    let digits = value
        .strip_prefix('+')
        .or_else(|| value.strip_prefix('-'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `f64::from_str` also accepts `inf`, `infinity` and `NaN`; those are not
/// decimal numbers and would render as bare identifiers in SQL.
pub fn is_float(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().any(|b| b.is_ascii_digit())
        && value.parse::<f64>().is_ok()
}

pub fn is_uuid(value: &str) -> bool {
    value.len() == HYPHENATED_UUID_LEN && Uuid::parse_str(value).is_ok()
}

/// chrono's `%Y`/`%m` specifiers tolerate signs and short fields, so the
/// fixed shape is checked before handing over for calendar validation.
pub fn is_timestamp(value: &str) -> bool {
    if value.len() != TIMESTAMP_LEN {
        return false;
    }
    let shape_ok = value.bytes().enumerate().all(|(idx, b)| match idx {
        4 | 7 => b == b'-',
        10 => b == b' ',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    });
    shape_ok && NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
}
