//! Directory scanner for discovering coding sheet files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File extensions recognized as coding sheets
const SHEET_EXTENSIONS: &[&str] = &["tsv", "csv"];

/// A coding sheet file found on disk, before parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Coder abbreviation(s), e.g. "JLA" or "JLA-HS"
    pub coder: String,
    /// Language identifier as written in the file name
    pub language_id: String,
}

impl SheetFile {
    /// Derive coder and language from a `CODER_languageid.ext` path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidSheetName(path.to_path_buf()))?;

        match stem.rsplit_once('_') {
            Some((coder, language_id)) if !coder.is_empty() && !language_id.is_empty() => {
                Ok(Self {
                    path: path.to_path_buf(),
                    coder: coder.to_string(),
                    language_id: language_id.to_string(),
                })
            }
            _ => Err(Error::InvalidSheetName(path.to_path_buf())),
        }
    }
}

/// Scan a directory for coding sheet files, sorted by path.
///
/// Files that don't follow the naming convention are skipped with a warning.
pub fn scan_sheets<P: AsRef<Path>>(root: P) -> Result<Vec<SheetFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root.as_ref()).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        let is_sheet = entry.file_type().is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SHEET_EXTENSIONS.contains(&ext));
        if !is_sheet {
            continue;
        }

        match SheetFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => warn!("skipping {}", e),
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_path() {
        let file = SheetFile::from_path("sheets/JLA_abcd1234.tsv").unwrap();
        assert_eq!(file.coder, "JLA");
        assert_eq!(file.language_id, "abcd1234");
    }

    #[test]
    fn test_from_path_splits_on_last_underscore() {
        let file = SheetFile::from_path("JLA_HS_abc.tsv").unwrap();
        assert_eq!(file.coder, "JLA_HS");
        assert_eq!(file.language_id, "abc");
    }

    #[test]
    fn test_from_path_rejects_missing_coder() {
        assert!(matches!(
            SheetFile::from_path("abcd1234.tsv"),
            Err(Error::InvalidSheetName(_))
        ));
        assert!(SheetFile::from_path("_abcd1234.tsv").is_err());
    }

    #[test]
    fn test_scan_sheets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("B_bbbb2222.tsv"), "").unwrap();
        fs::write(dir.path().join("A_aaaa1111.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("misnamed.tsv"), "").unwrap();

        let files = scan_sheets(dir.path()).unwrap();
        let langs: Vec<&str> = files.iter().map(|f| f.language_id.as_str()).collect();
        assert_eq!(langs, vec!["aaaa1111", "bbbb2222"]);
    }
}
