//! INSERT statement rendering.
//!
//! Every value is classified again on its own rather than looked up in the
//! inferred schema: a column declared as text because of one odd row still
//! renders its numeric-looking values unquoted.

use std::borrow::Cow;

use itertools::Itertools;

use crate::{
    classify::{ValueClass, classify},
    dialect::DialectProfile,
    offset::UtcOffset,
};

#[derive(Debug, Clone)]
pub struct RowRenderer<'a> {
    profile: &'a DialectProfile,
    offset_suffix: String,
}

impl<'a> RowRenderer<'a> {
    pub fn new(profile: &'a DialectProfile, offset: UtcOffset) -> Self {
        Self {
            profile,
            offset_suffix: offset.format(profile.offset_style),
        }
    }

    /// Embedded single quotes are emitted as-is; values are never escaped.
    pub fn render_literal<'v>(&self, value: &'v str) -> Cow<'v, str> {
        match classify(value) {
            ValueClass::Integer | ValueClass::Float => Cow::Borrowed(value),
            ValueClass::Timestamp => Cow::Owned(format!("'{value} {}'", self.offset_suffix)),
            ValueClass::Text if value.is_empty() => Cow::Borrowed("NULL"),
            ValueClass::Text | ValueClass::Uuid => Cow::Owned(format!("'{value}'")),
        }
    }

    pub fn build_insert_statement(&self, table_name: &str, row: &[String]) -> String {
        let fields = row.iter().map(|value| self.render_literal(value)).join(", ");
        format!("INSERT INTO {table_name} VALUES({fields});\n")
    }
}

pub fn build_insert_statement(
    table_name: &str,
    row: &[String],
    profile: &DialectProfile,
    offset: UtcOffset,
) -> String {
    RowRenderer::new(profile, offset).build_insert_statement(table_name, row)
}
