//! Table schema inference and DDL rendering.
//!
//! [`SchemaBuilder`] runs one [`ColumnAccumulator`] per column over every data
//! row and produces a [`TableSchema`]. The schema renders as a `CREATE TABLE`
//! statement (or `ALTER TABLE ... ALTER COLUMN` lines) for a chosen
//! [`DialectProfile`].
//!
//! Identifiers are not quoted or validated. Column names only have `.`
//! replaced by `_`; the table name is used as given.
//!
//! Rows longer than the header still feed width tracking for the surplus
//! positions, but those positions have no name and are never declared. Rows
//! shorter than the header simply leave the missing columns untouched.

use serde::{Deserialize, Serialize};

use crate::{
    dialect::DialectProfile,
    unify::{ColumnAccumulator, InferredType},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DdlOptions {
    pub if_not_exists: bool,
    pub unbounded_text: bool,
    pub alter: bool,
    pub truncate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub inferred: InferredType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    pub rows: usize,
    pub ragged_rows: usize,
}

pub fn sanitize_column_name(name: &str) -> String {
    name.replace('.', "_")
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    names: Vec<String>,
    accumulators: Vec<ColumnAccumulator>,
    rows: usize,
    ragged_rows: usize,
}

impl SchemaBuilder {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        let names = header
            .iter()
            .map(|name| sanitize_column_name(name.as_ref()))
            .collect::<Vec<_>>();
        let accumulators = vec![ColumnAccumulator::new(); names.len()];
        Self {
            names,
            accumulators,
            rows: 0,
            ragged_rows: 0,
        }
    }

    pub fn observe_row(&mut self, row: &[String]) {
        if row.len() != self.names.len() {
            self.ragged_rows += 1;
        }
        if row.len() > self.accumulators.len() {
            self.accumulators.resize_with(row.len(), ColumnAccumulator::new);
        }
        for (accumulator, value) in self.accumulators.iter_mut().zip(row) {
            accumulator.fold(value);
        }
        self.rows += 1;
    }

    /// Positions tracked beyond the header because of ragged rows.
    pub fn undeclared_columns(&self) -> usize {
        self.accumulators.len().saturating_sub(self.names.len())
    }

    pub fn accumulator(&self, idx: usize) -> Option<&ColumnAccumulator> {
        self.accumulators.get(idx)
    }

    pub fn finish(self, table_name: &str) -> TableSchema {
        let columns = self
            .names
            .into_iter()
            .zip(&self.accumulators)
            .map(|(name, accumulator)| ColumnSpec {
                name,
                inferred: accumulator.finish(),
            })
            .collect();
        TableSchema {
            table_name: table_name.to_string(),
            columns,
            rows: self.rows,
            ragged_rows: self.ragged_rows,
        }
    }
}

impl TableSchema {
    pub fn infer<H, R>(table_name: &str, header: &[H], rows: impl IntoIterator<Item = R>) -> Self
    where
        H: AsRef<str>,
        R: AsRef<[String]>,
    {
        let mut builder = SchemaBuilder::new(header);
        for row in rows {
            builder.observe_row(row.as_ref());
        }
        builder.finish(table_name)
    }

    pub fn create_statement(&self, profile: &DialectProfile, options: &DdlOptions) -> String {
        let opening = if options.if_not_exists {
            format!("CREATE TABLE IF NOT EXISTS {} (", self.table_name)
        } else {
            format!("CREATE TABLE {} (", self.table_name)
        };
        let mut lines = Vec::with_capacity(self.columns.len() + 2);
        lines.push(opening);
        for column in &self.columns {
            let sql_type = profile.column_type(column.inferred, options.unbounded_text);
            lines.push(format!("\t{} {},", column.name, sql_type));
        }
        if let Some(last) = lines.last_mut()
            && last.ends_with(',')
        {
            last.pop();
        }
        lines.push(");".to_string());
        lines.join("\n")
    }

    pub fn alter_statements(&self, profile: &DialectProfile, options: &DdlOptions) -> String {
        self.columns
            .iter()
            .map(|column| {
                let sql_type = profile.column_type(column.inferred, options.unbounded_text);
                match profile.alter_type_keyword {
                    Some(keyword) => format!(
                        "ALTER TABLE {} ALTER COLUMN {} {keyword} {sql_type};",
                        self.table_name, column.name
                    ),
                    None => format!(
                        "ALTER TABLE {} ALTER COLUMN {} {sql_type};",
                        self.table_name, column.name
                    ),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn truncate_statement(&self) -> String {
        format!("TRUNCATE TABLE {};", self.table_name)
    }

    /// The full DDL block written ahead of the INSERT statements, without a
    /// trailing newline.
    pub fn ddl(&self, profile: &DialectProfile, options: &DdlOptions) -> String {
        let mut ddl = if options.alter {
            self.alter_statements(profile, options)
        } else {
            self.create_statement(profile, options)
        };
        if options.truncate {
            if !ddl.is_empty() {
                ddl.push('\n');
            }
            ddl.push_str(&self.truncate_statement());
        }
        ddl
    }
}

pub fn build_create_statement<H, R>(
    table_name: &str,
    header: &[H],
    rows: impl IntoIterator<Item = R>,
    profile: &DialectProfile,
) -> String
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    TableSchema::infer(table_name, header, rows).create_statement(profile, &DdlOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{POSTGRES, SQL_SERVER};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn create_statement_matches_expected_layout() {
        let data = rows(&[
            &["1", "Alice", "2024-01-01 12:00:00"],
            &["2", "Bob", ""],
        ]);
        let ddl = build_create_statement("people", &["id", "name", "created_at"], &data, &POSTGRES);
        assert_eq!(
            ddl,
            "CREATE TABLE people (\n\tid INTEGER,\n\tname VARCHAR(5),\n\tcreated_at VARCHAR(19)\n);"
        );
    }

    #[test]
    fn dotted_headers_become_underscored() {
        let data = rows(&[&["abc", "1.5"]]);
        let schema = TableSchema::infer("events", &["data.session_id", "data.value"], &data);
        assert_eq!(schema.columns[0].name, "data_session_id");
        assert_eq!(schema.columns[1].name, "data_value");
        assert_eq!(schema.columns[1].inferred, InferredType::Float);
    }

    #[test]
    fn empty_column_declares_varchar_one() {
        let data = rows(&[&["1", ""], &["2", ""]]);
        let ddl = build_create_statement("t", &["id", "notes"], &data, &POSTGRES);
        assert!(ddl.contains("\tnotes VARCHAR(1)\n"));
        assert!(!ddl.contains("VARCHAR(0)"));
    }

    #[test]
    fn uuid_and_timestamp_use_dialect_tokens() {
        let data = rows(&[&["a1b2c3d4-e5f6-4789-a123-b1c2d3e4f5a6", "2024-03-04 05:06:07"]]);
        let pg = build_create_statement("t", &["id", "seen"], &data, &POSTGRES);
        let ms = build_create_statement("t", &["id", "seen"], &data, &SQL_SERVER);
        assert!(pg.contains("\tid UUID,"));
        assert!(pg.contains("\tseen TIMESTAMP WITH TIME ZONE\n"));
        assert!(ms.contains("\tid UNIQUEIDENTIFIER,"));
        assert!(ms.contains("\tseen DATETIMEOFFSET\n"));
    }

    #[test]
    fn ragged_rows_are_tracked_but_not_declared() {
        let data = rows(&[&["1", "x", "surplus-value"], &["2"]]);
        let mut builder = SchemaBuilder::new(&["id", "label"]);
        for row in &data {
            builder.observe_row(row);
        }
        assert_eq!(builder.undeclared_columns(), 1);
        assert_eq!(builder.accumulator(2).map(|acc| acc.max_len()), Some(13));
        let schema = builder.finish("t");
        assert_eq!(schema.ragged_rows, 2);
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.columns[1].inferred, InferredType::Text(1));
        let ddl = schema.create_statement(&POSTGRES, &DdlOptions::default());
        assert!(!ddl.contains("surplus"));
    }

    #[test]
    fn header_only_source_declares_text_columns() {
        let data: Vec<Vec<String>> = Vec::new();
        let ddl = build_create_statement("t", &["a", "b"], &data, &POSTGRES);
        assert_eq!(ddl, "CREATE TABLE t (\n\ta VARCHAR(1),\n\tb VARCHAR(1)\n);");
    }

    #[test]
    fn options_shape_the_ddl_block() {
        let data = rows(&[&["1", "hello"]]);
        let schema = TableSchema::infer("greetings", &["id", "word"], &data);

        let options = DdlOptions {
            if_not_exists: true,
            unbounded_text: true,
            truncate: true,
            ..DdlOptions::default()
        };
        assert_eq!(
            schema.ddl(&POSTGRES, &options),
            "CREATE TABLE IF NOT EXISTS greetings (\n\tid INTEGER,\n\tword TEXT\n);\nTRUNCATE TABLE greetings;"
        );

        let alter = DdlOptions {
            alter: true,
            ..DdlOptions::default()
        };
        assert_eq!(
            schema.ddl(&POSTGRES, &alter),
            "ALTER TABLE greetings ALTER COLUMN id TYPE INTEGER;\nALTER TABLE greetings ALTER COLUMN word TYPE VARCHAR(5);"
        );
        assert_eq!(
            schema.ddl(&SQL_SERVER, &alter),
            "ALTER TABLE greetings ALTER COLUMN id INTEGER;\nALTER TABLE greetings ALTER COLUMN word VARCHAR(5);"
        );
    }

    #[test]
    fn schema_serializes_column_types() {
        let data = rows(&[&["1", "abc"]]);
        let schema = TableSchema::infer("t", &["id", "code"], &data);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["columns"][0]["inferred"]["type"], "integer");
        assert_eq!(json["columns"][1]["inferred"]["type"], "text");
        assert_eq!(json["columns"][1]["inferred"]["width"], 3);
        assert_eq!(json["rows"], 1);
    }
}
