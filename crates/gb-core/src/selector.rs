//! Selection of one canonical sheet per language
//!
//! When a language has been coded more than once, the sheet with the most
//! coded rows wins. Ties keep the input order. Coder identity and file
//! recency are not considered.

use crate::sheet::CodingSheet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Whether a candidate sheet was kept or discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Chosen,
    Skipped,
}

/// One candidate in a duplicate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub coder: String,
    pub rows: usize,
    pub outcome: Outcome,
}

/// The decision taken for a language with several sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub language_id: String,
    pub winner_rows: usize,
    /// Candidates in ranking order, winner first
    pub candidates: Vec<Candidate>,
}

/// Canonical sheets plus the decisions made for duplicate groups
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    /// One sheet per language, ordered by language ID
    pub sheets: Vec<CodingSheet>,
    pub selections: Vec<Selection>,
}

/// Pick one canonical sheet per language ID
pub fn select_canonical(sheets: Vec<CodingSheet>) -> SelectionResult {
    let mut groups: BTreeMap<String, Vec<CodingSheet>> = BTreeMap::new();
    for sheet in sheets {
        groups.entry(sheet.language_id.clone()).or_default().push(sheet);
    }

    let mut result = SelectionResult::default();
    for (language_id, mut group) in groups {
        if group.len() == 1 {
            result.sheets.extend(group);
            continue;
        }

        // Vec::sort_by is stable: equal counts keep their input order
        group.sort_by(|a, b| b.row_count().cmp(&a.row_count()));

        let winner_rows = group[0].row_count();
        info!(language = %language_id, rows = winner_rows, "selecting best sheet");
        let candidates: Vec<Candidate> = group
            .iter()
            .enumerate()
            .map(|(i, sheet)| {
                let outcome = if i == 0 { Outcome::Chosen } else { Outcome::Skipped };
                info!(
                    language = %language_id,
                    rows = sheet.row_count(),
                    sheet = %sheet.path.display(),
                    "{}",
                    if i == 0 { "choosing" } else { "skipping" }
                );
                Candidate {
                    path: sheet.path.clone(),
                    coder: sheet.coder.clone(),
                    rows: sheet.row_count(),
                    outcome,
                }
            })
            .collect();

        result.selections.push(Selection {
            language_id,
            winner_rows,
            candidates,
        });
        result.sheets.extend(group.into_iter().next());
    }

    result
}
