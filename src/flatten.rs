//! Event log flattening.
//!
//! Turns a newline-delimited JSON event log into one CSV file per event
//! category. Each category has a fixed [`EventLayout`]: an ordered list of
//! dotted paths into the event object. The resulting files are ordinary row
//! sources for `convert`.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::DateTime;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;

use crate::{cli::FlattenArgs, error::ConvertError, io_utils, offset::UtcOffset};

const COMMON_COLUMNS: &[&str] = &[
    "data.session_id",
    "data.session_num",
    "data.user_id",
    "data.platform",
    "data.os_version",
    "data.sdk_version",
    "data.device",
    "data.manufacturer",
    "data.*_app_version",
    "data.connection_type",
    "country_code",
    "arrival_ts",
    "game_id",
    "user_meta.install_ts",
    "user_meta.cohort_week",
];

const SDK_ERROR_COLUMNS: &[&str] = &[
    "data.os_version",
    "data.manufacturer",
    "data.device",
    "data.platform",
    "data.type",
    "country_code",
    "arrival_ts",
    "game_id",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
enum KeyMatcher {
    Exact(String),
    /// The first key matching the pattern is remembered and tried first on
    /// later events.
    Wildcard {
        pattern: Regex,
        last_match: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ColumnPath {
    path: String,
    parents: Vec<String>,
    key: KeyMatcher,
}

impl ColumnPath {
    pub fn parse(path: &str) -> Result<Self> {
        let mut parts = path.split('.').map(str::to_string).collect::<Vec<_>>();
        let last = parts.pop().unwrap_or_default();
        let key = if last.contains('*') {
            let escaped = regex::escape(&last).replace(r"\*", ".*");
            let pattern = Regex::new(&format!("^{escaped}$"))
                .with_context(|| format!("Compiling wildcard column '{path}'"))?;
            KeyMatcher::Wildcard {
                pattern,
                last_match: None,
            }
        } else {
            KeyMatcher::Exact(last)
        };
        Ok(Self {
            path: path.to_string(),
            parents: parts,
            key,
        })
    }

    /// Header label: the path with wildcard fragments dropped, so
    /// `data.*_app_version` becomes `data.app_version`.
    pub fn label(&self) -> String {
        self.path.replace("*_", "").replace('*', "")
    }

    pub fn is_timestamp(&self) -> bool {
        self.path.ends_with("_ts") || self.path.starts_with("user_meta.cohort")
    }

    fn extract<'e>(&mut self, event: &'e Value) -> Option<&'e Value> {
        let mut current = event;
        for part in &self.parents {
            current = current.get(part)?;
        }
        let object = current.as_object()?;
        match &mut self.key {
            KeyMatcher::Exact(key) => object.get(key.as_str()),
            KeyMatcher::Wildcard {
                pattern,
                last_match,
            } => {
                if let Some(previous) = last_match.as_deref()
                    && let Some(value) = object.get(previous)
                {
                    return Some(value);
                }
                let (key, value) = object.iter().find(|(key, _)| pattern.is_match(key))?;
                *last_match = Some(key.clone());
                Some(value)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLayout {
    category: String,
    columns: Vec<ColumnPath>,
}

impl EventLayout {
    pub fn new(category: &str, paths: &[&str]) -> Result<Self> {
        let columns = paths
            .iter()
            .map(|path| ColumnPath::parse(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            category: category.to_string(),
            columns,
        })
    }

    fn with_common(category: &str, extra: &[&str]) -> Result<Self> {
        let paths = COMMON_COLUMNS
            .iter()
            .chain(extra)
            .copied()
            .collect::<Vec<_>>();
        Self::new(category, &paths)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(ColumnPath::label).collect()
    }

    pub fn builtin() -> Result<Vec<EventLayout>> {
        Ok(vec![
            Self::with_common("design", &["data.event_id", "data.value"])?,
            Self::with_common("error", &["data.severity", "data.message"])?,
            Self::with_common("user", &["data.install"])?,
            Self::with_common("progression", &["data.event_id"])?,
            Self::with_common("session_end", &["data.length"])?,
            Self::new("sdk_error", SDK_ERROR_COLUMNS)?,
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions {
    pub convert_timestamps: bool,
    pub offset: UtcOffset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenOutcome {
    Row { category: String, values: Vec<String> },
    UnknownCategory(String),
    MissingCategory,
}

#[derive(Debug, Clone)]
pub struct EventFlattener {
    layouts: BTreeMap<String, EventLayout>,
    options: FlattenOptions,
}

impl EventFlattener {
    pub fn new(layouts: Vec<EventLayout>, options: FlattenOptions) -> Self {
        let layouts = layouts
            .into_iter()
            .map(|layout| (layout.category().to_string(), layout))
            .collect();
        Self { layouts, options }
    }

    pub fn with_builtin_layouts(options: FlattenOptions) -> Result<Self> {
        Ok(Self::new(EventLayout::builtin()?, options))
    }

    pub fn layout(&self, category: &str) -> Option<&EventLayout> {
        self.layouts.get(category)
    }

    pub fn flatten(&mut self, event: &Value) -> FlattenOutcome {
        let Some(category) = event
            .get("data")
            .and_then(|data| data.get("category"))
            .and_then(Value::as_str)
        else {
            return FlattenOutcome::MissingCategory;
        };
        let options = self.options;
        let Some(layout) = self.layouts.get_mut(category) else {
            return FlattenOutcome::UnknownCategory(category.to_string());
        };
        let values = layout
            .columns
            .iter_mut()
            .map(|column| {
                let raw = column.extract(event).map(value_to_string).unwrap_or_default();
                if options.convert_timestamps && column.is_timestamp() {
                    convert_epoch(&raw, options.offset).unwrap_or(raw)
                } else {
                    raw
                }
            })
            .collect();
        FlattenOutcome::Row {
            category: category.to_string(),
            values,
        }
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Epoch seconds (floored to whole seconds) rendered as wall-clock time at
/// `offset`. `None` when the value is not a usable epoch.
pub fn convert_epoch(raw: &str, offset: UtcOffset) -> Option<String> {
    let seconds = raw.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    let utc = DateTime::from_timestamp(seconds.floor() as i64, 0)?;
    Some(
        utc.with_timezone(&offset.fixed())
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenSummary {
    pub rows: BTreeMap<String, usize>,
    pub skipped: usize,
    pub files: Vec<PathBuf>,
}

pub fn flatten_lines<R: BufRead>(
    reader: R,
    flattener: &mut EventFlattener,
    output_dir: &Path,
    prefix: &str,
) -> Result<FlattenSummary> {
    let mut writers: BTreeMap<String, csv::Writer<BufWriter<File>>> = BTreeMap::new();
    let mut summary = FlattenSummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.with_context(|| format!("Reading line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Value = serde_json::from_str(&line).map_err(|err| {
            ConvertError::MalformedEvent {
                line: line_number,
                reason: err.to_string(),
            }
        })?;

        match flattener.flatten(&event) {
            FlattenOutcome::Row { category, values } => {
                if !writers.contains_key(&category) {
                    let path = output_dir.join(format!("{prefix}{category}.csv"));
                    let mut writer = io_utils::open_csv_writer(&path)?;
                    if let Some(layout) = flattener.layout(&category) {
                        writer
                            .write_record(layout.header())
                            .with_context(|| format!("Writing header to {path:?}"))?;
                    }
                    debug!("Created {:?} for '{}' events", path, category);
                    summary.files.push(path);
                    writers.insert(category.clone(), writer);
                }
                if let Some(writer) = writers.get_mut(&category) {
                    writer.write_record(&values).with_context(|| {
                        format!("Writing '{category}' row from line {line_number}")
                    })?;
                }
                *summary.rows.entry(category).or_insert(0) += 1;
            }
            FlattenOutcome::UnknownCategory(category) => {
                warn!("Unknown event type '{category}' on line {line_number}, skipping");
                summary.skipped += 1;
            }
            FlattenOutcome::MissingCategory => {
                warn!("Event on line {line_number} has no data.category, skipping");
                summary.skipped += 1;
            }
        }
    }

    for (category, mut writer) in writers {
        writer
            .flush()
            .with_context(|| format!("Flushing '{category}' output"))?;
    }
    Ok(summary)
}

pub fn execute(args: &FlattenArgs) -> Result<()> {
    let offset = match args.utc_offset.as_deref() {
        Some(raw) => raw.parse::<UtcOffset>()?,
        None => UtcOffset::local(),
    };
    io_utils::ensure_source_exists(&args.input)?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Creating output directory {:?}", args.output_dir))?;

    let options = FlattenOptions {
        convert_timestamps: !args.raw_timestamps,
        offset,
    };
    let mut flattener = EventFlattener::with_builtin_layouts(options)?;
    info!(
        "Flattening events from '{}' into {:?}",
        args.input.display(),
        args.output_dir
    );

    let summary = if io_utils::is_dash(&args.input) {
        flatten_lines(
            std::io::stdin().lock(),
            &mut flattener,
            &args.output_dir,
            &args.prefix,
        )?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Opening input file {:?}", args.input))?;
        flatten_lines(
            BufReader::new(file),
            &mut flattener,
            &args.output_dir,
            &args.prefix,
        )?
    };

    for (category, rows) in &summary.rows {
        info!("✓ {rows} '{category}' event(s)");
    }
    if summary.skipped > 0 {
        warn!("Skipped {} event(s) with unknown categories", summary.skipped);
    }
    info!("Wrote {} file(s) to {:?}", summary.files.len(), args.output_dir);
    Ok(())
}
