//! Bibliographic index merged from several bibliography sources

use crate::error::{Error, Result};
use crate::languages::LanguageIndex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Entry type and fields of one bibliography record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibRecord {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl BibRecord {
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A bibliography entry as emitted into the output dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibEntry {
    /// Normalized citation key
    pub id: String,
    pub entry_type: String,
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    /// Render as a BibTeX record
    pub fn to_bibtex(&self) -> String {
        let mut out = format!("@{}{{{}", self.entry_type, self.id);
        for (name, value) in &self.fields {
            out.push_str(&format!(",\n  {} = {{{}}}", name, value));
        }
        out.push_str("\n}\n");
        out
    }
}

/// Citation key -> record, merged from several sources
#[derive(Debug, Clone, Default)]
pub struct BibIndex {
    entries: HashMap<String, BibRecord>,
}

impl BibIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge sources in order; later sources overwrite earlier ones on key collision
    pub fn merge<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = HashMap<String, BibRecord>>,
    {
        let mut index = Self::new();
        for source in sources {
            index.entries.extend(source);
        }
        index
    }

    /// Load and merge bibliography files (JSON objects of key -> record)
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            let source: HashMap<String, BibRecord> = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), entries = source.len(), "loaded bibliography");
            sources.push(source);
        }
        Ok(Self::merge(sources))
    }

    pub fn insert(&mut self, key: impl Into<String>, record: BibRecord) {
        self.entries.insert(key.into(), record);
    }

    pub fn get(&self, key: &str) -> Option<&BibRecord> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BibRecord)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Glottocode -> citation keys of entries tagged with that language
#[derive(Debug, Clone, Default)]
pub struct LanguageKeyMap {
    keys: HashMap<String, BTreeSet<String>>,
}

impl LanguageKeyMap {
    /// Scan every entry's `lgcode` field and index its key under each
    /// language the field resolves to.
    pub fn build(bib: &BibIndex, languages: &LanguageIndex) -> Self {
        let mut keys: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (key, record) in bib.iter() {
            let Some(lgcode) = record.field("lgcode") else {
                continue;
            };
            for code in lgcodes(lgcode) {
                if let Some(languoid) = languages.lookup(&code) {
                    keys.entry(languoid.id.clone())
                        .or_default()
                        .insert(key.clone());
                }
            }
        }
        Self { keys }
    }

    /// Candidate keys for a language, in key order
    pub fn candidates(&self, glottocode: &str) -> impl Iterator<Item = &String> {
        self.keys.get(glottocode).into_iter().flatten()
    }

    pub fn insert(&mut self, glottocode: impl Into<String>, key: impl Into<String>) {
        self.keys
            .entry(glottocode.into())
            .or_default()
            .insert(key.into());
    }
}

/// Extract language codes from an `lgcode` field.
///
/// Bracketed codes win when present (`"Abc [abc], Def [def]"`); otherwise
/// the field is split on commas, semicolons and whitespace.
pub fn lgcodes(field: &str) -> Vec<String> {
    static BRACKETED: OnceLock<Regex> = OnceLock::new();
    let bracketed = BRACKETED.get_or_init(|| Regex::new(r"\[([^\]]*)\]").expect("valid regex"));

    let split = |s: &str| -> Vec<String> {
        s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    };

    if bracketed.is_match(field) {
        bracketed
            .captures_iter(field)
            .flat_map(|cap| split(&cap[1]))
            .collect()
    } else {
        split(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{Languoid, Level};

    fn source(entries: &[(&str, &str)]) -> HashMap<String, BibRecord> {
        entries
            .iter()
            .map(|(k, t)| (k.to_string(), BibRecord::new(*t)))
            .collect()
    }

    #[test]
    fn test_merge_later_sources_win() {
        let index = BibIndex::merge(vec![
            source(&[("a", "book"), ("b", "article")]),
            source(&[("b", "misc")]),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a").unwrap().entry_type, "book");
        assert_eq!(index.get("b").unwrap().entry_type, "misc");
    }

    #[test]
    fn test_lgcodes_bracketed() {
        assert_eq!(lgcodes("Abc [abc], Def [def]"), vec!["abc", "def"]);
        assert_eq!(lgcodes("[abc, xyz]"), vec!["abc", "xyz"]);
    }

    #[test]
    fn test_lgcodes_plain() {
        assert_eq!(lgcodes("abc, def;ghi jkl"), vec!["abc", "def", "ghi", "jkl"]);
        assert!(lgcodes("  ").is_empty());
    }

    #[test]
    fn test_language_key_map() {
        let languages = LanguageIndex::build(vec![Languoid {
            id: "abcd1234".to_string(),
            name: "Abcd".to_string(),
            level: Level::Language,
            iso: Some("abc".to_string()),
            hid: None,
            macroareas: Vec::new(),
            lineage: Vec::new(),
        }]);
        let mut bib = BibIndex::new();
        bib.insert("hh:s:Smith:Abc", BibRecord::new("book").with_field("lgcode", "Abc [abc]"));
        bib.insert("other", BibRecord::new("book").with_field("lgcode", "[zzz]"));
        bib.insert("untagged", BibRecord::new("book"));

        let map = LanguageKeyMap::build(&bib, &languages);
        let keys: Vec<&String> = map.candidates("abcd1234").collect();
        assert_eq!(keys, vec!["hh:s:Smith:Abc"]);
        assert_eq!(map.candidates("zzzz9999").count(), 0);
    }

    #[test]
    fn test_to_bibtex() {
        let entry = BibEntry {
            id: "Smith2001".to_string(),
            entry_type: "book".to_string(),
            fields: [("author", "Smith, John"), ("year", "2001")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        assert_eq!(
            entry.to_bibtex(),
            "@book{Smith2001,\n  author = {Smith, John},\n  year = {2001}\n}\n"
        );
    }
}
