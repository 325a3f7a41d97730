pub mod config;
pub mod dialect;
pub use config::{CollectConfig, Config, InputConfig, OutputConfig};
pub use dialect::{Dialect, Encoding};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CntblankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("reader is empty")]
    EmptySource,
    #[error("header record has no elements")]
    EmptyHeader,
    #[error("line {line}: {reason}")]
    RowParse { line: u64, reason: String },
    #[error("too many error lines ({count})")]
    TooManyErrors { count: usize },
    #[error("invalid dialect: {0}")]
    Dialect(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("render error: {0}")]
    Render(String),
    #[error("{0}")]
    Other(String),
}

impl CntblankError {
    /// a malformed row is skipped; everything else aborts the source
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CntblankError::RowParse { .. })
    }
}

pub type Result<T> = std::result::Result<T, CntblankError>;

/// Identifies where a report came from. Filled in by the caller, never by the profiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl SourceInfo {
    pub fn from_path(path: &std::path::Path) -> Self {
        Self {
            path: Some(path.to_string_lossy().into_owned()),
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: Option<String>) -> Self {
        self.checksum = checksum;
        self
    }
}
