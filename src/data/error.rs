//! Validation errors raised while reading dataset files.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for dataset loading
pub type DataResult<T> = std::result::Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    /// Header row lacks one or more expected columns
    #[error("CSV '{path}' must contain columns {expected:?}, found {found:?}")]
    MissingColumns {
        path:     PathBuf,
        expected: Vec<String>,
        found:    Vec<String>,
    },

    /// A JSON-lines record lacks a field
    #[error("{path}:{line}: missing field '{field}'")]
    MissingField {
        path:  PathBuf,
        line:  usize,
        field: String,
    },

    /// A field holds an object, array or null instead of a scalar
    #[error("{path}:{line}: field '{field}' is not a string, number or boolean")]
    InvalidField {
        path:  PathBuf,
        line:  usize,
        field: String,
    },

    /// A line is not valid JSON
    #[error("{path}:{line}: invalid JSON: {source}")]
    Json {
        path:   PathBuf,
        line:   usize,
        #[source]
        source: serde_json::Error,
    },

    /// The CSV reader failed (bad quoting, ragged rows, ...)
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    /// File extension is neither JSON-lines nor CSV
    #[error("unsupported dataset format '{0}' (expected .json, .jsonl or .csv)")]
    UnsupportedFormat(PathBuf),

    /// Dataset spec string could not be parsed
    #[error("invalid dataset spec '{0}': expected a preset name or 'path,text_field,label_field[,positive_label]'")]
    InvalidSpec(String),

    /// Worker pool could not be created
    #[error("cannot build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// IO error
    #[error("IO error reading '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}
