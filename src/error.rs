//! Error types for loading and indexing trajectory data.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: any of these aborts startup before a view is built.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path} has no usable rows ({dropped} dropped)")]
    NoRecords { path: PathBuf, dropped: usize },
}

/// Per-row problems. The row is dropped and the load continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("missing timestamp")]
    MissingTimestamp,

    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),

    #[error("'{0}' does not exist in time zone {1}")]
    NonexistentLocalTime(String, String),

    #[error("bad field: {0}")]
    Field(String),
}

/// Anything that ends the program with a non-zero status
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("bad time label: {0}")]
    Label(#[from] ParseError),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("cannot write scene to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
