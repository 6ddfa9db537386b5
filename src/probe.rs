use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ProbeArgs,
    convert::{Converter, CsvSource, MemorySource, RowSource, default_table_name},
    dialect::{Dialect, DialectProfile},
    io_utils,
    offset::UtcOffset,
    schema::TableSchema,
    table,
};

const HEADERS: [&str; 4] = ["#", "column", "inferred", "sql type"];

pub fn execute(args: &ProbeArgs) -> Result<()> {
    let dialect: Dialect = args.dialect.parse()?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    io_utils::ensure_source_exists(&args.input)?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Probing '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );

    let profile = dialect.profile();
    let converter = Converter::new(default_table_name(&args.input), profile, UtcOffset::utc());
    let schema = if io_utils::is_dash(&args.input) {
        let rows = CsvSource::new(Path::new("-"), delimiter, encoding)
            .rows()?
            .collect::<Result<Vec<_>>>()?;
        converter.infer(&MemorySource::from_rows(rows))?
    } else {
        converter.infer(&CsvSource::new(&args.input, delimiter, encoding))?
    };

    let rendered = render(&schema, profile, args.json)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Writing probe output")?;
    info!(
        "Inferred {} column(s) from {} row(s)",
        schema.columns.len(),
        schema.rows
    );
    Ok(())
}

pub fn render(schema: &TableSchema, profile: &DialectProfile, json: bool) -> Result<String> {
    if json {
        let mut text =
            serde_json::to_string_pretty(schema).context("Serializing inferred schema")?;
        text.push('\n');
        Ok(text)
    } else {
        let rows = table::schema_rows(schema, profile);
        Ok(table::render_table(&HEADERS, &rows))
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SQL_SERVER;

    fn people() -> TableSchema {
        let rows = vec![
            vec!["1".to_string(), "Alice".to_string()],
            vec!["2".to_string(), "Bob".to_string()],
        ];
        TableSchema::infer("people", &["id", "user.name"], &rows)
    }

    #[test]
    fn table_lists_inferred_and_sql_types() {
        let rendered = render(&people(), &SQL_SERVER, false).unwrap();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("#    column"));
        assert!(lines[2].contains("id"));
        assert!(lines[2].ends_with("INTEGER"));
        assert!(lines[3].contains("user_name"));
        assert!(lines[3].contains("text(5)"));
        assert!(lines[3].ends_with("VARCHAR(5)"));
    }

    #[test]
    fn json_output_parses_back() {
        let rendered = render(&people(), &SQL_SERVER, true).unwrap();
        let parsed: TableSchema = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, people());
    }

    #[test]
    fn tab_delimiter_is_printable() {
        assert_eq!(printable_delimiter(b'\t'), "\\t");
        assert_eq!(printable_delimiter(b';'), ";");
    }
}
