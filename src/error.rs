//! Error types for the hit-resolution core.
//!
//! Parsing and configuration failures are fatal: the run aborts before any
//! output file is put in place.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SiftError>;

#[derive(Error, Debug)]
pub enum SiftError {
    /// A row of the raw search table could not be turned into a hit record.
    #[error("malformed record at line {line_no}: {reason}\n  > {line}")]
    MalformedRecord {
        line_no: usize,
        line: String,
        reason: String,
    },

    /// A threshold is missing or outside its valid range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external annotation/search program exited unsuccessfully.
    #[error("{tool} failed (exit status: {status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    /// An external program finished but its expected output is absent.
    #[error("{tool} did not produce expected output {}", .path.display())]
    MissingOutput { tool: String, path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SiftError {
    pub(crate) fn malformed(line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        SiftError::MalformedRecord {
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
