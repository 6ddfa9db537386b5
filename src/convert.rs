//! Two-pass CSV → SQL conversion.
//!
//! Pass one folds every data row into a [`TableSchema`] and writes the DDL.
//! Pass two restarts the [`RowSource`] and writes one INSERT per data row. No
//! rows are buffered between passes, so sources must be restartable.

use std::{io::Write, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    cli::ConvertArgs,
    dialect::{Dialect, DialectProfile},
    error::ConvertError,
    io_utils,
    offset::UtcOffset,
    render::RowRenderer,
    schema::{DdlOptions, SchemaBuilder, TableSchema},
};

pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Vec<String>>> + 'a>;

/// A finite sequence of string rows whose first row is the header. Every call
/// to [`RowSource::rows`] starts again from the header.
pub trait RowSource {
    fn rows(&self) -> Result<RowIter<'_>>;
}

#[derive(Debug, Clone)]
pub struct CsvSource<'p> {
    path: &'p Path,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl<'p> CsvSource<'p> {
    pub fn new(path: &'p Path, delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            path,
            delimiter,
            encoding,
        }
    }
}

impl RowSource for CsvSource<'_> {
    fn rows(&self) -> Result<RowIter<'_>> {
        let reader = io_utils::open_csv_reader_from_path(self.path, self.delimiter)?;
        let encoding = self.encoding;
        let path = self.path;
        let iter = reader
            .into_byte_records()
            .enumerate()
            .map(move |(idx, record)| {
                let record = record
                    .map_err(|err| anyhow!("Reading row {} in {:?}: {err}", idx + 1, path))?;
                let mut row = io_utils::decode_record(&record, encoding).map_err(|_| {
                    anyhow!(
                        "Failed to decode row {} in {:?} as {}",
                        idx + 1,
                        path,
                        encoding.name()
                    )
                })?;
                if idx == 0 {
                    io_utils::strip_bom(&mut row);
                }
                Ok(row)
            });
        Ok(Box::new(iter))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Vec<String>>,
}

impl MemorySource {
    pub fn new<S: AsRef<str>>(header: &[S], data: &[Vec<String>]) -> Self {
        let mut rows = Vec::with_capacity(data.len() + 1);
        rows.push(header.iter().map(|h| h.as_ref().to_string()).collect());
        rows.extend(data.iter().cloned());
        Self { rows }
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

impl RowSource for MemorySource {
    fn rows(&self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    pub columns: usize,
    pub rows: usize,
    pub ragged_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Converter<'a> {
    pub table_name: String,
    pub profile: &'a DialectProfile,
    pub offset: UtcOffset,
    pub ddl: DdlOptions,
}

impl<'a> Converter<'a> {
    pub fn new(
        table_name: impl Into<String>,
        profile: &'a DialectProfile,
        offset: UtcOffset,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            profile,
            offset,
            ddl: DdlOptions::default(),
        }
    }

    pub fn with_ddl(mut self, ddl: DdlOptions) -> Self {
        self.ddl = ddl;
        self
    }

    /// Pass one: header plus every data row folded into a schema.
    pub fn infer(&self, source: &dyn RowSource) -> Result<TableSchema> {
        let mut rows = source.rows()?;
        let header = rows.next().ok_or(ConvertError::EmptySource)??;
        let mut builder = SchemaBuilder::new(header.as_slice());
        for row in rows {
            builder.observe_row(&row?);
        }
        if builder.undeclared_columns() > 0 {
            warn!(
                "{} value position(s) beyond the {} header column(s) will not be declared",
                builder.undeclared_columns(),
                header.len()
            );
            for idx in header.len()..header.len() + builder.undeclared_columns() {
                if let Some(accumulator) = builder.accumulator(idx) {
                    debug!(
                        "Undeclared position {} holds values up to {} character(s)",
                        idx + 1,
                        accumulator.max_len()
                    );
                }
            }
        }
        let schema = builder.finish(&self.table_name);
        for column in &schema.columns {
            debug!("Column '{}' inferred as {}", column.name, column.inferred);
        }
        Ok(schema)
    }

    pub fn run<W: Write + ?Sized>(
        &self,
        source: &dyn RowSource,
        sink: &mut W,
    ) -> Result<ConvertSummary> {
        let schema = self.infer(source)?;
        self.write(&schema, source, sink)
    }

    /// Pass two: the DDL for `schema` followed by one INSERT per data row.
    pub fn write<W: Write + ?Sized>(
        &self,
        schema: &TableSchema,
        source: &dyn RowSource,
        sink: &mut W,
    ) -> Result<ConvertSummary> {
        if schema.ragged_rows > 0 {
            warn!(
                "{} row(s) do not match the header's {} column(s)",
                schema.ragged_rows,
                schema.columns.len()
            );
        }
        writeln!(sink, "{}", schema.ddl(self.profile, &self.ddl)).context("Writing DDL")?;

        let renderer = RowRenderer::new(self.profile, self.offset);
        let mut written = 0usize;
        for row in source.rows()?.skip(1) {
            let row = row?;
            let statement = renderer.build_insert_statement(&self.table_name, &row);
            sink
                .write_all(statement.as_bytes())
                .with_context(|| format!("Writing INSERT for data row {}", written + 1))?;
            written += 1;
        }
        sink.flush().context("Flushing output")?;

        Ok(ConvertSummary {
            columns: schema.columns.len(),
            rows: written,
            ragged_rows: schema.ragged_rows,
        })
    }
}

pub fn default_table_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty() && *stem != "-")
        .unwrap_or("data")
        .to_string()
}

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let dialect: Dialect = args.dialect.parse()?;
    let offset = match args.utc_offset.as_deref() {
        Some(raw) => raw.parse::<UtcOffset>()?,
        None => UtcOffset::local(),
    };
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    io_utils::ensure_source_exists(&args.input)?;

    let base_name = args
        .table
        .clone()
        .unwrap_or_else(|| default_table_name(&args.input));
    let table_name = format!("{}{}", args.table_prefix, base_name);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| format!("{base_name}.sql").into());
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);

    info!(
        "Converting '{}' into table '{}' for {} (offset {})",
        args.input.display(),
        table_name,
        dialect,
        offset
    );
    if io_utils::is_dash(&args.input) {
        // stdin cannot be rewound for the second pass
        let rows = collect_stdin(delimiter, encoding)?;
        let source = MemorySource::from_rows(rows);
        return run_to_output(&table_name, dialect, offset, args, &source, &output);
    }
    let source = CsvSource::new(&args.input, delimiter, encoding);
    run_to_output(&table_name, dialect, offset, args, &source, &output)
}

fn collect_stdin(delimiter: u8, encoding: &'static Encoding) -> Result<Vec<Vec<String>>> {
    let source = CsvSource::new(Path::new("-"), delimiter, encoding);
    source.rows()?.collect()
}

fn run_to_output(
    table_name: &str,
    dialect: Dialect,
    offset: UtcOffset,
    args: &ConvertArgs,
    source: &dyn RowSource,
    output: &Path,
) -> Result<()> {
    let ddl = DdlOptions {
        if_not_exists: args.if_not_exists,
        unbounded_text: args.text_as_text,
        alter: args.alter,
        truncate: args.truncate,
    };
    let converter = Converter::new(table_name, dialect.profile(), offset).with_ddl(ddl);
    // the sink is only created once the source has been read in full
    let schema = converter.infer(source)?;
    let mut sink = io_utils::open_text_writer(Some(output))?;
    let summary = converter.write(&schema, source, &mut sink)?;
    info!(
        "Wrote {} column(s) and {} INSERT statement(s) to {:?}",
        summary.columns, summary.rows, output
    );
    Ok(())
}
