//! Materialization of a resolved dataset as CSV tables plus a BibTeX file

use crate::dataset::ResolvedDataset;
use crate::error::{Error, Result};
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const LANGUAGES_FILE: &str = "languages.csv";
pub const PARAMETERS_FILE: &str = "parameters.csv";
pub const CODES_FILE: &str = "codes.csv";
pub const VALUES_FILE: &str = "values.csv";
pub const SOURCES_FILE: &str = "sources.bib";
pub const METADATA_FILE: &str = "StructureDataset-metadata.json";

/// Separator for multi-valued cells
const LIST_SEPARATOR: &str = ";";

/// Files written for a dataset
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub files_written: Vec<PathBuf>,
}

/// Write the dataset into `output_dir`.
///
/// Referential integrity is checked first; nothing is written when it fails.
pub fn write_dataset<P: AsRef<Path>>(dataset: &ResolvedDataset, output_dir: P) -> Result<WriteResult> {
    dataset.check_integrity()?;

    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut files_written = Vec::new();

    let path = output_dir.join(LANGUAGES_FILE);
    write_table(
        &path,
        &["ID", "Name", "Glottocode", "ISO639P3code", "Macroarea", "contributed_datapoints", "provenance"],
        dataset.languages.iter().map(|l| {
            vec![
                l.id.clone(),
                l.name.clone(),
                l.glottocode.clone(),
                l.iso639p3code.clone().unwrap_or_default(),
                l.macroarea.clone().unwrap_or_default(),
                l.contributed_datapoints.clone(),
                l.provenance.clone(),
            ]
        }),
    )?;
    files_written.push(path);

    let path = output_dir.join(PARAMETERS_FILE);
    write_table(
        &path,
        &["ID", "Name", "Description"],
        dataset
            .parameters
            .iter()
            .map(|p| vec![p.id.clone(), p.name.clone(), p.description.clone()]),
    )?;
    files_written.push(path);

    let path = output_dir.join(CODES_FILE);
    write_table(
        &path,
        &["ID", "Parameter_ID", "Name", "Description"],
        dataset.codes.iter().map(|c| {
            vec![
                c.id.clone(),
                c.parameter_id.clone(),
                c.name.clone(),
                c.description.clone(),
            ]
        }),
    )?;
    files_written.push(path);

    let path = output_dir.join(VALUES_FILE);
    write_table(
        &path,
        &["ID", "Language_ID", "Parameter_ID", "Value", "Code_ID", "Comment", "Source"],
        dataset.values.iter().map(|v| {
            vec![
                v.id.clone(),
                v.language_id.clone(),
                v.parameter_id.clone(),
                v.value.clone(),
                v.code_id.clone().unwrap_or_default(),
                v.comment.clone().unwrap_or_default(),
                v.source.join(LIST_SEPARATOR),
            ]
        }),
    )?;
    files_written.push(path);

    let path = output_dir.join(SOURCES_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    for entry in &dataset.bibliography {
        writeln!(writer, "{}", entry.to_bibtex())?;
    }
    writer.flush()?;
    files_written.push(path);

    let path = output_dir.join(METADATA_FILE);
    fs::write(&path, serde_json::to_string_pretty(&metadata())?)?;
    files_written.push(path);

    info!(
        dir = %output_dir.display(),
        languages = dataset.languages.len(),
        values = dataset.values.len(),
        sources = dataset.bibliography.len(),
        "dataset written"
    );

    Ok(WriteResult { files_written })
}

fn write_table<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(header).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn metadata() -> serde_json::Value {
    let table = |component: &str, url: &str| json!({ "dc:conformsTo": component, "url": url });
    json!({
        "@context": "http://www.w3.org/ns/csvw",
        "dc:conformsTo": "http://cldf.clld.org/v1.0/terms.rdf#StructureDataset",
        "dc:source": SOURCES_FILE,
        "tables": [
            table("http://cldf.clld.org/v1.0/terms.rdf#LanguageTable", LANGUAGES_FILE),
            table("http://cldf.clld.org/v1.0/terms.rdf#ParameterTable", PARAMETERS_FILE),
            table("http://cldf.clld.org/v1.0/terms.rdf#CodeTable", CODES_FILE),
            table("http://cldf.clld.org/v1.0/terms.rdf#ValueTable", VALUES_FILE),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::BibEntry;
    use crate::dataset::{LanguageRow, ParameterRow, ValueRow};

    fn dataset() -> ResolvedDataset {
        ResolvedDataset {
            languages: vec![LanguageRow {
                id: "abcd1234".to_string(),
                name: "Abcd".to_string(),
                glottocode: "abcd1234".to_string(),
                iso639p3code: None,
                macroarea: Some("Papunesia".to_string()),
                contributed_datapoints: "JLA".to_string(),
                provenance: "JLA_abcd1234.tsv Thu Mar  5 14:07:09 2020".to_string(),
            }],
            parameters: vec![ParameterRow {
                id: "GB020".to_string(),
                name: "Articles".to_string(),
                description: String::new(),
            }],
            codes: Vec::new(),
            values: vec![ValueRow {
                id: "GB020-abcd1234".to_string(),
                language_id: "abcd1234".to_string(),
                parameter_id: "GB020".to_string(),
                code_id: None,
                value: "?".to_string(),
                comment: Some("unclear, see notes".to_string()),
                source: vec!["A2001".to_string(), "B1999".to_string()],
            }],
            bibliography: vec![
                BibEntry {
                    id: "A2001".to_string(),
                    entry_type: "book".to_string(),
                    fields: Default::default(),
                },
                BibEntry {
                    id: "B1999".to_string(),
                    entry_type: "article".to_string(),
                    fields: Default::default(),
                },
            ],
        }
    }

    #[test]
    fn test_write_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_dataset(&dataset(), dir.path()).unwrap();
        assert_eq!(result.files_written.len(), 6);

        let values = fs::read_to_string(dir.path().join(VALUES_FILE)).unwrap();
        assert_eq!(
            values,
            "ID,Language_ID,Parameter_ID,Value,Code_ID,Comment,Source\n\
             GB020-abcd1234,abcd1234,GB020,?,,\"unclear, see notes\",A2001;B1999\n"
        );

        let bib = fs::read_to_string(dir.path().join(SOURCES_FILE)).unwrap();
        assert!(bib.contains("@book{A2001\n}"));
        assert!(bib.contains("@article{B1999\n}"));

        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap()).unwrap();
        assert_eq!(meta["tables"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_inconsistent_dataset_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = dataset();
        dataset.values[0].language_id = "missing".to_string();

        assert!(write_dataset(&dataset, dir.path().join("out")).is_err());
        assert!(!dir.path().join("out").exists());
    }
}
