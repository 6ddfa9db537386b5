//! Plain-text column listing used by `probe`.

use std::fmt::Write as _;

use crate::{dialect::DialectProfile, schema::TableSchema};

const GAP: &str = "  ";

pub fn schema_rows(schema: &TableSchema, profile: &DialectProfile) -> Vec<Vec<String>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column.inferred.to_string(),
                profile.column_type(column.inferred, false),
            ]
        })
        .collect()
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(flatten_cell(cell).chars().count());
        }
    }

    let mut output = String::new();
    let header = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    push_line(&mut output, &header, &widths);
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    push_line(&mut output, &rule, &widths);
    for row in rows {
        push_line(&mut output, row, &widths);
    }
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(GAP);
        }
        let cell = flatten_cell(cell);
        let _ = write!(line, "{cell:<width$}");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn flatten_cell(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
