//! Assembly of the normalized four-table dataset

use crate::bib::BibEntry;
use crate::error::{Error, Result};
use crate::features::FeatureRegistry;
use crate::languages::LanguageIndex;
use crate::sheet::CodingSheet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::error;

/// LanguageTable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LanguageRow {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub glottocode: String,
    #[serde(rename = "ISO639P3code")]
    pub iso639p3code: Option<String>,
    pub macroarea: Option<String>,
    #[serde(rename = "contributed_datapoints")]
    pub contributed_datapoints: String,
    #[serde(rename = "provenance")]
    pub provenance: String,
}

/// ParameterTable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterRow {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub description: String,
}

/// CodeTable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Parameter_ID")]
    pub parameter_id: String,
    pub name: String,
    pub description: String,
}

/// ValueTable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Language_ID")]
    pub language_id: String,
    #[serde(rename = "Parameter_ID")]
    pub parameter_id: String,
    /// Absent when the value is the unknown marker
    #[serde(rename = "Code_ID")]
    pub code_id: Option<String>,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Comment")]
    pub comment: Option<String>,
    #[serde(rename = "Source")]
    pub source: Vec<String>,
}

/// The output of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedDataset {
    pub languages: Vec<LanguageRow>,
    pub parameters: Vec<ParameterRow>,
    pub codes: Vec<CodeRow>,
    pub values: Vec<ValueRow>,
    pub bibliography: Vec<BibEntry>,
}

impl ResolvedDataset {
    pub fn find_language(&self, id: &str) -> Option<&LanguageRow> {
        self.languages.iter().find(|l| l.id == id)
    }

    pub fn find_value(&self, id: &str) -> Option<&ValueRow> {
        self.values.iter().find(|v| v.id == id)
    }

    /// Verify that every ID is unique within its table and that every
    /// ValueTable reference resolves.
    pub fn check_integrity(&self) -> Result<()> {
        let languages = unique_ids("LanguageTable", self.languages.iter().map(|r| r.id.as_str()))?;
        let parameters = unique_ids("ParameterTable", self.parameters.iter().map(|r| r.id.as_str()))?;
        let codes = unique_ids("CodeTable", self.codes.iter().map(|r| r.id.as_str()))?;
        unique_ids("ValueTable", self.values.iter().map(|r| r.id.as_str()))?;
        unique_ids("Bibliography", self.bibliography.iter().map(|e| e.id.as_str()))?;

        for code in &self.codes {
            if !parameters.contains(code.parameter_id.as_str()) {
                return Err(dangling("CodeTable", "Parameter_ID", &code.parameter_id));
            }
        }

        let sources: HashSet<&str> = self.bibliography.iter().map(|e| e.id.as_str()).collect();
        for value in &self.values {
            if !parameters.contains(value.parameter_id.as_str()) {
                return Err(dangling("ValueTable", "Parameter_ID", &value.parameter_id));
            }
            if !languages.contains(value.language_id.as_str()) {
                return Err(dangling("ValueTable", "Language_ID", &value.language_id));
            }
            if let Some(code_id) = &value.code_id {
                if !codes.contains(code_id.as_str()) {
                    return Err(dangling("ValueTable", "Code_ID", code_id));
                }
            }
            if let Some(key) = value.source.iter().find(|k| !sources.contains(k.as_str())) {
                return Err(dangling("ValueTable", "Source", key));
            }
        }
        Ok(())
    }
}

fn unique_ids<'a>(
    table: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateId {
                table,
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

fn dangling(table: &'static str, column: &'static str, id: &str) -> Error {
    Error::DanglingReference {
        table,
        column,
        id: id.to_string(),
    }
}

/// Build the dataset from the feature registry and the canonical sheets.
///
/// Sheets must already have their citations resolved; `bibliography` is
/// the deduplicated set of entries those citations produced.
pub fn assemble(
    features: &FeatureRegistry,
    languages: &LanguageIndex,
    sheets: &[CodingSheet],
    bibliography: Vec<BibEntry>,
) -> Result<ResolvedDataset> {
    let mut dataset = ResolvedDataset {
        bibliography,
        ..Default::default()
    };

    for feature in features.iter() {
        dataset.parameters.push(ParameterRow {
            id: feature.id.clone(),
            name: feature.name.clone(),
            description: feature.description.clone(),
        });
        for (code, description) in feature.ordered_domain() {
            dataset.codes.push(CodeRow {
                id: format!("{}-{}", feature.id, code),
                parameter_id: feature.id.clone(),
                name: code.to_string(),
                description: description.to_string(),
            });
        }
    }

    for sheet in sheets {
        if sheet.is_empty() {
            error!(path = %sheet.path.display(), "empty sheet");
        }
        dataset.languages.push(LanguageRow {
            id: sheet.language_id.clone(),
            name: sheet.language_name.clone(),
            glottocode: sheet.language_id.clone(),
            iso639p3code: sheet.iso.clone(),
            macroarea: languages.macroarea(&sheet.language_id).map(str::to_string),
            contributed_datapoints: sheet.coder.clone(),
            provenance: sheet.provenance(),
        });

        for row in &sheet.rows {
            let feature = features
                .get(&row.feature_id)
                .ok_or_else(|| Error::UnknownFeature {
                    feature: row.feature_id.clone(),
                    language: sheet.language_id.clone(),
                })?;

            let code_id = if row.is_unknown() {
                None
            } else if feature.accepts(&row.value) {
                Some(format!("{}-{}", feature.id, row.value))
            } else {
                return Err(Error::ValueOutsideDomain {
                    feature: feature.id.clone(),
                    value: row.value.clone(),
                    language: sheet.language_id.clone(),
                });
            };

            dataset.values.push(ValueRow {
                id: format!("{}-{}", feature.id, sheet.language_id),
                language_id: sheet.language_id.clone(),
                parameter_id: feature.id.clone(),
                code_id,
                value: row.value.clone(),
                comment: row.comment.clone(),
                source: row.source_keys.clone(),
            });
        }
    }

    Ok(dataset)
}
