//! Core sheet types for representing one contributor's coding of a language

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value marker for "coded, but the answer is unknown"
pub const UNKNOWN_VALUE: &str = "?";

/// A coding sheet for a single language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingSheet {
    /// Canonical language identifier (Glottocode)
    pub language_id: String,
    /// Language name
    pub language_name: String,
    /// ISO 639-3 code, if the language has one
    pub iso: Option<String>,
    /// Coder name(s), taken from the file name
    pub coder: String,
    /// Coded rows, in file order
    pub rows: Vec<Row>,
    /// Source file path
    pub path: PathBuf,
    /// Modification time of the source file
    pub modified: DateTime<Utc>,
}

impl CodingSheet {
    /// Get the number of coded rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the sheet codes nothing
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// File name component of the source path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Provenance string: `"{file name} {modification time}"`
    pub fn provenance(&self) -> String {
        format!(
            "{} {}",
            self.file_name(),
            self.modified.format("%a %b %e %H:%M:%S %Y")
        )
    }
}

/// A single coded feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Feature ID (e.g. "GB020")
    pub feature_id: String,
    /// Coded value, a domain code or [`UNKNOWN_VALUE`]
    pub value: String,
    /// Free-text comment
    pub comment: Option<String>,
    /// Free-text source citation field
    pub source: Option<String>,
    /// Bibliography keys resolved from `source`
    pub source_keys: Vec<String>,
}

impl Row {
    /// Create a new row with no comment or source
    pub fn new(feature_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            feature_id: feature_id.into(),
            value: value.into(),
            comment: None,
            source: None,
            source_keys: Vec::new(),
        }
    }

    /// Set the free-text source field
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Check whether the value is the unknown marker
    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_VALUE
    }
}
