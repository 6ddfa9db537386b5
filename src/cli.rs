use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate SQL DDL and INSERT scripts from CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a CSV file into a CREATE TABLE statement followed by INSERTs
    Convert(ConvertArgs),
    /// Infer and display column types without writing any SQL
    Probe(ProbeArgs),
    /// Split a JSON event log into one CSV file per event category
    Flatten(FlattenArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input CSV file (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output SQL file (defaults to <table>.sql; use '-' for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Target SQL dialect (postgres, sqlserver)
    #[arg(long, default_value = "postgres")]
    pub dialect: String,
    /// Table name (defaults to the input file stem)
    #[arg(short = 't', long)]
    pub table: Option<String>,
    /// Prefix prepended to the table name
    #[arg(long = "table-prefix", default_value = "")]
    pub table_prefix: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// UTC offset attached to timestamp literals, e.g. +05:30 or Z (defaults to local)
    #[arg(long = "utc-offset", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
    /// Emit CREATE TABLE IF NOT EXISTS
    #[arg(long = "if-not-exists")]
    pub if_not_exists: bool,
    /// Emit TRUNCATE TABLE after the DDL
    #[arg(long)]
    pub truncate: bool,
    /// Declare text columns with the dialect's unbounded text type instead of VARCHAR(n)
    #[arg(long = "text-as-text")]
    pub text_as_text: bool,
    /// Emit ALTER TABLE ... ALTER COLUMN statements instead of CREATE TABLE
    #[arg(long, conflicts_with = "if_not_exists")]
    pub alter: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV file to inspect (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Dialect used for the SQL type column (postgres, sqlserver)
    #[arg(long, default_value = "postgres")]
    pub dialect: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the inferred schema as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FlattenArgs {
    /// Newline-delimited JSON event log (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Directory receiving one CSV file per event category
    #[arg(short = 'd', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// Prefix prepended to every output file name
    #[arg(long, default_value = "")]
    pub prefix: String,
    /// UTC offset used when rendering epoch timestamps (defaults to local)
    #[arg(long = "utc-offset", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
    /// Keep epoch timestamps as they appear in the log
    #[arg(long = "raw-timestamps")]
    pub raw_timestamps: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
