//! Target SQL dialects.
//!
//! Each dialect is a [`DialectProfile`]: a fixed table of type tokens plus the
//! rule for rendering a UTC offset inside a timestamp literal. The schema
//! builder and the row renderer only ever consult the profile, so adding a
//! dialect means adding a table entry rather than another code path.

use std::{fmt, str::FromStr};

use crate::{classify::ValueClass, error::ConvertError, offset::OffsetStyle, unify::InferredType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    SqlServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    pub name: &'static str,
    pub integer: &'static str,
    pub float: &'static str,
    pub uuid: &'static str,
    pub timestamp: &'static str,
    pub unbounded_text: &'static str,
    /// Keyword between the column name and the new type in `ALTER COLUMN`.
    pub alter_type_keyword: Option<&'static str>,
    pub offset_style: OffsetStyle,
}

pub const POSTGRES: DialectProfile = DialectProfile {
    name: "postgres",
    integer: "INTEGER",
    float: "FLOAT",
    uuid: "UUID",
    timestamp: "TIMESTAMP WITH TIME ZONE",
    unbounded_text: "TEXT",
    alter_type_keyword: Some("TYPE"),
    offset_style: OffsetStyle::Compact,
};

pub const SQL_SERVER: DialectProfile = DialectProfile {
    name: "sqlserver",
    integer: "INTEGER",
    float: "FLOAT",
    uuid: "UNIQUEIDENTIFIER",
    timestamp: "DATETIMEOFFSET",
    unbounded_text: "NVARCHAR(MAX)",
    alter_type_keyword: None,
    offset_style: OffsetStyle::Colon,
};

impl Dialect {
    pub fn profile(&self) -> &'static DialectProfile {
        match self {
            Dialect::Postgres => &POSTGRES,
            Dialect::SqlServer => &SQL_SERVER,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for Dialect {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlserver" | "mssql" | "sql-server" => Ok(Dialect::SqlServer),
            _ => Err(ConvertError::UnknownDialect(value.to_string())),
        }
    }
}

impl DialectProfile {
    /// Token for a non-text class. Text has no fixed token because its
    /// rendering depends on the observed width.
    pub fn type_token(&self, class: ValueClass) -> Option<&'static str> {
        match class {
            ValueClass::Integer => Some(self.integer),
            ValueClass::Float => Some(self.float),
            ValueClass::Uuid => Some(self.uuid),
            ValueClass::Timestamp => Some(self.timestamp),
            ValueClass::Text => None,
        }
    }

    pub fn column_type(&self, inferred: InferredType, unbounded_text: bool) -> String {
        match inferred {
            InferredType::Text(_) if unbounded_text => self.unbounded_text.to_string(),
            InferredType::Text(width) => format!("VARCHAR({})", width.max(1)),
            other => self
                .type_token(other.class())
                .unwrap_or(self.unbounded_text)
                .to_string(),
        }
    }
}
