//! Language index built from the taxonomy authority's languoid records

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Classification level of a languoid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Family,
    Language,
    Dialect,
}

/// One ancestor in a languoid's lineage: (name, glottocode, level)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ancestor(pub String, pub String, pub Level);

/// A languoid record from the taxonomy authority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Languoid {
    /// Glottocode
    pub id: String,
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub iso: Option<String>,
    /// Historical (hid) code
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub macroareas: Vec<String>,
    /// Ancestors from the top-level family down to the direct parent
    #[serde(default)]
    pub lineage: Vec<Ancestor>,
}

/// Immutable lookup tables over the languoid records
#[derive(Debug, Clone, Default)]
pub struct LanguageIndex {
    by_glottocode: HashMap<String, Languoid>,
    /// Any identifier (glottocode, ISO, hid) -> glottocode
    by_any_id: HashMap<String, String>,
    /// Glottocode -> derived macroarea
    macroareas: HashMap<String, String>,
}

impl LanguageIndex {
    /// Build the index from languoid records.
    ///
    /// Glottocode and ISO entries are registered first; hid entries are
    /// applied in a second pass so they win on collision.
    pub fn build(languoids: Vec<Languoid>) -> Self {
        let mut by_any_id = HashMap::new();
        for l in &languoids {
            by_any_id.insert(l.id.clone(), l.id.clone());
            if let Some(iso) = &l.iso {
                by_any_id.insert(iso.clone(), l.id.clone());
            }
        }
        for l in &languoids {
            if let Some(hid) = &l.hid {
                by_any_id.insert(hid.clone(), l.id.clone());
            }
        }

        let by_glottocode: HashMap<String, Languoid> =
            languoids.into_iter().map(|l| (l.id.clone(), l)).collect();

        let macroareas = by_glottocode
            .values()
            .filter_map(|l| derive_macroarea(l, &by_glottocode).map(|m| (l.id.clone(), m)))
            .collect();

        Self {
            by_glottocode,
            by_any_id,
            macroareas,
        }
    }

    /// Load languoid records from a JSON array file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let languoids: Vec<Languoid> = serde_json::from_str(&content)?;
        Ok(Self::build(languoids))
    }

    /// Look up a languoid by glottocode, ISO code or hid
    pub fn lookup(&self, id: &str) -> Option<&Languoid> {
        self.by_any_id
            .get(id)
            .and_then(|gc| self.by_glottocode.get(gc))
    }

    /// Macroarea of a languoid, inherited from its nearest classified
    /// ancestor when it has none of its own
    pub fn macroarea(&self, glottocode: &str) -> Option<&str> {
        self.macroareas.get(glottocode).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_glottocode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_glottocode.is_empty()
    }
}

fn derive_macroarea(l: &Languoid, by_glottocode: &HashMap<String, Languoid>) -> Option<String> {
    if let Some(m) = l.macroareas.first() {
        return Some(m.clone());
    }
    if l.level != Level::Dialect {
        return None;
    }
    l.lineage
        .iter()
        .rev()
        .filter_map(|Ancestor(_, id, _)| by_glottocode.get(id))
        .find_map(|a| a.macroareas.first().cloned())
}
