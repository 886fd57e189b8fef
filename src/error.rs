use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed table in {path}: {source}")]
    Frame {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("table shape mismatch: {0}")]
    Shape(String),

    #[error("missing expected column: {column}")]
    MissingColumn { column: String },

    #[error("{path} has no header row")]
    EmptySource { path: PathBuf },

    #[error("{path} holds {available} rows, {requested} requested")]
    InsufficientRows {
        path: PathBuf,
        requested: usize,
        available: usize,
    },

    #[error("row {row}, column {column}: cannot parse {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid confusion matrix: {0}")]
    InvalidMatrix(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PrepError>;
