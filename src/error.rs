use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unknown SQL dialect '{0}'. Supported dialects: postgres, sqlserver")]
    UnknownDialect(String),
    #[error("Input file {0:?} does not exist")]
    SourceNotFound(PathBuf),
    #[error("Invalid UTC offset '{0}'. Expected a value such as +05:30, -0800 or Z")]
    InvalidOffset(String),
    #[error("Input has no header row")]
    EmptySource,
    #[error("Line {line}: {reason}")]
    MalformedEvent { line: usize, reason: String },
}
