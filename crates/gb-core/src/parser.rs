//! Reader for coding sheets (tab-separated, or comma-separated for `.csv`)

use crate::error::{Error, Result};
use crate::features::normalized_feature_id;
use crate::languages::LanguageIndex;
use crate::scanner::SheetFile;
use crate::sheet::{CodingSheet, Row};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

const FEATURE_COLUMN: &str = "Feature_ID";
const VALUE_COLUMN: &str = "Value";
const COMMENT_COLUMN: &str = "Comment";
const SOURCE_COLUMN: &str = "Source";

/// Read a sheet file from disk, resolving its language through the index
pub fn read_sheet(file: &SheetFile, languages: &LanguageIndex) -> Result<CodingSheet> {
    let path = &file.path;
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.clone(),
        source: e,
    })?;
    let modified: DateTime<Utc> = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?
        .into();

    let rows = parse_rows(content.as_bytes(), path)?;

    let (language_id, language_name, iso) = match languages.lookup(&file.language_id) {
        Some(l) => (l.id.clone(), l.name.clone(), l.iso.clone()),
        None => {
            warn!(
                language = %file.language_id,
                path = %path.display(),
                "language not found in taxonomy, keeping identifier as given"
            );
            (file.language_id.clone(), file.language_id.clone(), None)
        }
    };

    Ok(CodingSheet {
        language_id,
        language_name,
        iso,
        coder: file.coder.clone(),
        rows,
        path: path.clone(),
        modified,
    })
}

/// Field delimiter for a sheet file: `,` for `.csv`, tab otherwise
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Parse coded rows from sheet content, with the delimiter taken from
/// the file extension of `path`.
///
/// Rows with an empty value are not coded and are skipped.
pub fn parse_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<Row>> {
    let delimiter = delimiter_for(path);
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .quoting(delimiter == b',')
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
    };
    let feature_idx = column(FEATURE_COLUMN).ok_or_else(|| Error::SheetParse {
        path: path.to_path_buf(),
        message: format!("missing required column '{}'", FEATURE_COLUMN),
    })?;
    let value_idx = column(VALUE_COLUMN).ok_or_else(|| Error::SheetParse {
        path: path.to_path_buf(),
        message: format!("missing required column '{}'", VALUE_COLUMN),
    })?;
    let comment_idx = column(COMMENT_COLUMN);
    let source_idx = column(SOURCE_COLUMN);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let Some(feature_id) = cell(Some(feature_idx)) else {
            continue;
        };
        let Some(value) = cell(Some(value_idx)) else {
            continue;
        };

        rows.push(Row {
            feature_id: normalized_feature_id(&feature_id),
            value,
            comment: cell(comment_idx),
            source: cell(source_idx),
            source_keys: Vec::new(),
        });
    }

    Ok(rows)
}
