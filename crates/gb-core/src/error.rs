//! Error types for gb-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gb-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A coding sheet is structurally unusable
    #[error("failed to parse sheet '{path}': {message}")]
    SheetParse { path: PathBuf, message: String },

    /// A sheet file name does not follow `CODER_languageid.ext`
    #[error("sheet file name '{0}' does not match CODER_languageid")]
    InvalidSheetName(PathBuf),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A markdown table line is not delimited by `|`
    #[error("malformed markdown table line: {line:?}")]
    MalformedTableLine { line: String },

    /// A markdown table separator contains characters other than `|:- `
    #[error("invalid markdown table separator: {line:?}")]
    BadSeparator { line: String },

    /// A sheet codes a feature missing from the registry
    #[error("unknown feature '{feature}' coded for language '{language}'")]
    UnknownFeature { feature: String, language: String },

    /// A coded value lies outside the feature's domain
    #[error("value '{value}' for feature '{feature}' (language '{language}') is not in the feature's domain")]
    ValueOutsideDomain {
        feature: String,
        value: String,
        language: String,
    },

    /// A feature domain code is not an integer
    #[error("domain code '{code}' of feature '{feature}' is not numeric")]
    InvalidDomainCode { feature: String, code: String },

    /// A table row references an ID that does not exist
    #[error("{table}.{column} references missing ID '{id}'")]
    DanglingReference {
        table: &'static str,
        column: &'static str,
        id: String,
    },

    /// Two distinct bibliography keys normalize to the same identifier
    #[error("citation keys '{first}' and '{second}' both normalize to '{id}'")]
    CitationKeyCollision {
        id: String,
        first: String,
        second: String,
    },

    /// An ID occurs more than once within a table
    #[error("duplicate ID '{id}' in {table}")]
    DuplicateId { table: &'static str, id: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}
