//! Feature registry: the questions coders answer and their value domains

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// A feature with its domain of valid answer codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Domain code -> description
    pub domain: HashMap<String, String>,
}

impl Feature {
    /// Domain entries ordered by numeric code value
    pub fn ordered_domain(&self) -> Vec<(&str, &str)> {
        let mut codes: Vec<(i64, &str, &str)> = self
            .domain
            .iter()
            .filter_map(|(code, desc)| {
                code.trim()
                    .parse::<i64>()
                    .ok()
                    .map(|n| (n, code.as_str(), desc.as_str()))
            })
            .collect();
        codes.sort_by_key(|(n, _, _)| *n);
        codes.into_iter().map(|(_, c, d)| (c, d)).collect()
    }

    /// Check whether a value is one of the domain codes
    pub fn accepts(&self, value: &str) -> bool {
        self.domain.contains_key(value)
    }
}

/// All features, keyed and ordered by normalized feature ID
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, Feature>,
}

impl FeatureRegistry {
    /// Build a registry, normalizing IDs and validating domain codes
    pub fn build(features: Vec<Feature>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for mut feature in features {
            feature.id = normalized_feature_id(&feature.id);
            if let Some(code) = feature
                .domain
                .keys()
                .find(|c| c.trim().parse::<i64>().is_err())
            {
                return Err(Error::InvalidDomainCode {
                    feature: feature.id.clone(),
                    code: code.clone(),
                });
            }
            map.insert(feature.id.clone(), feature);
        }
        Ok(Self { features: map })
    }

    /// Load features from a JSON array file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let features: Vec<Feature> = serde_json::from_str(&content)?;
        Self::build(features)
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Features in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Normalize a feature ID to `GB` plus three digits ("GB20" -> "GB020").
/// IDs that don't fit the pattern are returned trimmed but otherwise unchanged.
pub fn normalized_feature_id(id: &str) -> String {
    let id = id.trim();
    let digits = id
        .strip_prefix("GB")
        .or_else(|| id.strip_prefix("gb"))
        .unwrap_or(id);
    match digits.parse::<u32>() {
        Ok(n) if digits.chars().all(|c| c.is_ascii_digit()) => format!("GB{:03}", n),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str, codes: &[&str]) -> Feature {
        Feature {
            id: id.to_string(),
            name: format!("Feature {}", id),
            description: String::new(),
            domain: codes
                .iter()
                .map(|c| (c.to_string(), format!("code {}", c)))
                .collect(),
        }
    }

    #[test]
    fn test_normalized_feature_id() {
        assert_eq!(normalized_feature_id("GB20"), "GB020");
        assert_eq!(normalized_feature_id(" GB020 "), "GB020");
        assert_eq!(normalized_feature_id("20"), "GB020");
        assert_eq!(normalized_feature_id("GB131"), "GB131");
        assert_eq!(normalized_feature_id("TE001"), "TE001");
    }

    #[test]
    fn test_ordered_domain_is_numeric() {
        let f = feature("GB020", &["10", "2", "0", "1"]);
        let codes: Vec<&str> = f.ordered_domain().into_iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["0", "1", "2", "10"]);
    }

    #[test]
    fn test_registry_orders_and_normalizes() {
        let registry =
            FeatureRegistry::build(vec![feature("GB21", &["0", "1"]), feature("GB020", &["0"])])
                .unwrap();
        let ids: Vec<&str> = registry.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["GB020", "GB021"]);
        assert!(registry.get("GB021").unwrap().accepts("1"));
        assert!(!registry.get("GB021").unwrap().accepts("?"));
    }

    #[test]
    fn test_non_numeric_domain_code_rejected() {
        let err = FeatureRegistry::build(vec![feature("GB020", &["0", "x"])]).unwrap_err();
        assert!(matches!(err, Error::InvalidDomainCode { .. }));
    }
}
