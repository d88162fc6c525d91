//! Resolution of free-text source citations into bibliography keys
//!
//! A row's source field may mention several works. Each mention is tried
//! as an exact citation key first, then matched heuristically (author
//! surnames + year) against the entries tagged with the sheet's language.
//! Mentions that resolve to nothing are counted and dropped.

use crate::bib::{BibEntry, BibIndex, LanguageKeyMap};
use crate::error::{Error, Result};
use crate::sheet::CodingSheet;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// A citation key as found in the bibliography and as stored in the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCitation {
    pub raw: String,
    pub key: String,
}

/// Outcome of resolving one source field
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub citations: Vec<ResolvedCitation>,
    /// Entries for keys not emitted earlier in the run
    pub new_entries: Vec<BibEntry>,
}

/// Counts of mentions that could not be resolved
#[derive(Debug, Clone, Default)]
pub struct UnresolvedTally {
    counts: HashMap<String, usize>,
}

impl UnresolvedTally {
    pub fn increment(&mut self, mention: &str) {
        *self.counts.entry(mention.to_string()).or_default() += 1;
    }

    pub fn count(&self, mention: &str) -> usize {
        self.counts.get(mention).copied().unwrap_or(0)
    }

    /// Number of distinct unresolved mentions
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// (mention, count) pairs ascending by count, so the largest counts come last
    pub fn report(&self) -> Vec<(&str, usize)> {
        let mut items: Vec<(&str, usize)> =
            self.counts.iter().map(|(m, c)| (m.as_str(), *c)).collect();
        items.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        items
    }
}

/// Cross-row state of one run
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    pub unresolved: UnresolvedTally,
    /// Normalized id -> the raw bibliography key it was emitted for
    owners: HashMap<String, String>,
    bibliography: Vec<BibEntry>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_parts(self) -> (Vec<BibEntry>, UnresolvedTally) {
        (self.bibliography, self.unresolved)
    }
}

/// Resolves source fields against the bibliographic index
#[derive(Debug, Clone, Copy)]
pub struct CitationResolver<'a> {
    bib: &'a BibIndex,
    language_keys: &'a LanguageKeyMap,
}

impl<'a> CitationResolver<'a> {
    pub fn new(bib: &'a BibIndex, language_keys: &'a LanguageKeyMap) -> Self {
        Self { bib, language_keys }
    }

    /// Resolve every mention in `text` for the given language.
    ///
    /// Fails if a key normalizes to an id already emitted for a different key.
    pub fn resolve(
        &self,
        text: &str,
        language_id: &str,
        state: &mut ResolutionState,
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();

        for mention in split_mentions(text) {
            let Some(raw) = self.lookup(&mention, language_id) else {
                debug!(language = %language_id, mention = %mention, "unresolved citation");
                state.unresolved.increment(&mention);
                continue;
            };

            let key = normalize_key(&raw);
            match state.owners.get(&key) {
                Some(owner) if *owner != raw => {
                    return Err(Error::CitationKeyCollision {
                        id: key,
                        first: owner.clone(),
                        second: raw,
                    });
                }
                Some(_) => {}
                None => {
                    state.owners.insert(key.clone(), raw.clone());
                    if let Some(record) = self.bib.get(&raw) {
                        resolution.new_entries.push(BibEntry {
                            id: key.clone(),
                            entry_type: record.entry_type.clone(),
                            fields: record.fields.clone(),
                        });
                    }
                }
            }
            if !resolution.citations.iter().any(|c| c.key == key) {
                resolution.citations.push(ResolvedCitation { raw, key });
            }
        }

        Ok(resolution)
    }

    /// Resolve the source field of every row in a sheet, storing the
    /// normalized keys back on the rows
    pub fn resolve_sheet(&self, sheet: &mut CodingSheet, state: &mut ResolutionState) -> Result<()> {
        for row in &mut sheet.rows {
            let Some(source) = row.source.as_deref().filter(|s| !s.trim().is_empty()) else {
                continue;
            };
            let resolution = self.resolve(source, &sheet.language_id, state)?;
            row.source_keys = resolution.citations.into_iter().map(|c| c.key).collect();
            state.bibliography.extend(resolution.new_entries);
        }
        Ok(())
    }

    fn lookup(&self, mention: &str, language_id: &str) -> Option<String> {
        if self.bib.contains(mention) {
            return Some(mention.to_string());
        }

        let parsed = parse_mention(mention)?;
        self.language_keys
            .candidates(language_id)
            .find(|key| {
                self.bib
                    .get(key.as_str())
                    .is_some_and(|record| parsed.matches(record.field("author"), record.field("editor"), record.field("year")))
            })
            .cloned()
    }
}

/// Strip characters that are illegal in dataset identifiers
pub fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| *c != ':' && *c != '\'').collect()
}

/// Split a source field into individual mentions.
///
/// Mentions are separated by `;`. A comma starts a new mention only when
/// the text before it already carries a year and the text after it starts
/// with an uppercase letter, so page lists stay attached.
pub fn split_mentions(text: &str) -> Vec<String> {
    let mut mentions = Vec::new();
    for piece in text.split(';') {
        let mut current = String::new();
        for part in piece.split(',') {
            let starts_upper = part.trim_start().chars().next().is_some_and(char::is_uppercase);
            if !current.is_empty() && starts_upper && year_regex().is_match(&current) {
                mentions.push(current.trim().to_string());
                current.clear();
            }
            if !current.is_empty() {
                current.push(',');
            }
            current.push_str(part);
        }
        if !current.trim().is_empty() {
            mentions.push(current.trim().to_string());
        }
    }
    mentions
}

fn year_regex() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(1[5-9]\d\d|20\d\d)[a-z]?\b").expect("valid regex"))
}

/// Author surnames and year extracted from a mention
#[derive(Debug, Clone, PartialEq)]
struct MentionRef {
    surnames: Vec<String>,
    year: String,
}

impl MentionRef {
    fn matches(&self, author: Option<&str>, editor: Option<&str>, year: Option<&str>) -> bool {
        if !year.is_some_and(|y| y.contains(&self.year)) {
            return false;
        }
        let names = format!("{} {}", author.unwrap_or(""), editor.unwrap_or("")).to_lowercase();
        self.surnames.iter().all(|s| names.contains(s.as_str()))
    }
}

fn parse_mention(mention: &str) -> Option<MentionRef> {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    static AUTHOR_SEP: OnceLock<Regex> = OnceLock::new();
    let mention_re = MENTION.get_or_init(|| {
        Regex::new(r"^(?P<authors>[^\d()]+?)\s*\(?(?P<year>1[5-9]\d\d|20\d\d)[a-z]?\)?(?:\s*[:,.]?\s*.*)?$")
            .expect("valid regex")
    });
    let sep_re = AUTHOR_SEP
        .get_or_init(|| Regex::new(r"\s+and\s+|\s*&\s*|\s*/\s*").expect("valid regex"));

    let caps = mention_re.captures(mention.trim())?;
    let authors = caps["authors"]
        .replace("et al.", "")
        .replace("et al", "");

    let surnames: Vec<String> = sep_re
        .split(&authors)
        .filter_map(|name| {
            let name = name.trim();
            let surname = match name.split_once(',') {
                Some((last, _)) => last.trim(),
                None => name.split_whitespace().last()?,
            };
            let surname = surname.trim_matches('.').to_lowercase();
            (!surname.is_empty()).then_some(surname)
        })
        .collect();

    if surnames.is_empty() {
        return None;
    }
    Some(MentionRef {
        surnames,
        year: caps["year"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::BibRecord;
    use crate::sheet::Row;
    use chrono::Utc;
    use std::path::PathBuf;

    fn fixture() -> (BibIndex, LanguageKeyMap) {
        let mut bib = BibIndex::new();
        bib.insert(
            "hh:s:Smith:Abc",
            BibRecord::new("book")
                .with_field("author", "Smith, John")
                .with_field("year", "2001"),
        );
        bib.insert(
            "hh:g:Jones:Abc",
            BibRecord::new("article")
                .with_field("author", "Jones, Mary and Brown, Tim")
                .with_field("year", "1999"),
        );
        bib.insert(
            "O'Neil2010",
            BibRecord::new("misc").with_field("year", "2010"),
        );
        bib.insert(
            "Smith2001other",
            BibRecord::new("book")
                .with_field("author", "Smith, Jane")
                .with_field("year", "2001"),
        );

        let mut keys = LanguageKeyMap::default();
        keys.insert("abcd1234", "hh:s:Smith:Abc");
        keys.insert("abcd1234", "hh:g:Jones:Abc");
        keys.insert("wxyz9876", "Smith2001other");
        (bib, keys)
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("hh:s:Smith:Abc"), "hhsSmithAbc");
        assert_eq!(normalize_key("O'Neil2010"), "ONeil2010");
        assert_eq!(normalize_key("plain"), "plain");
    }

    #[test]
    fn test_split_mentions() {
        assert_eq!(
            split_mentions("Smith 2001: 12, 15; Jones and Brown 1999"),
            vec!["Smith 2001: 12, 15", "Jones and Brown 1999"]
        );
        assert_eq!(
            split_mentions("Smith 2001, Jones 1999"),
            vec!["Smith 2001", "Jones 1999"]
        );
        assert_eq!(split_mentions("Smith, J. 2001"), vec!["Smith, J. 2001"]);
        assert!(split_mentions(" ; ").is_empty());
    }

    #[test]
    fn test_parse_mention() {
        let m = parse_mention("Jones & Brown (1999): 4").unwrap();
        assert_eq!(m.surnames, vec!["jones", "brown"]);
        assert_eq!(m.year, "1999");

        let m = parse_mention("Smith et al. 2001a").unwrap();
        assert_eq!(m.surnames, vec!["smith"]);
        assert_eq!(m.year, "2001");

        assert!(parse_mention("p.c. with speaker").is_none());
    }

    #[test]
    fn test_exact_key_match() {
        let (bib, keys) = fixture();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();

        let res = resolver.resolve("O'Neil2010", "abcd1234", &mut state).unwrap();
        assert_eq!(
            res.citations,
            vec![ResolvedCitation {
                raw: "O'Neil2010".to_string(),
                key: "ONeil2010".to_string()
            }]
        );
        assert_eq!(res.new_entries.len(), 1);
        assert_eq!(res.new_entries[0].id, "ONeil2010");
    }

    #[test]
    fn test_heuristic_match_is_restricted_to_language() {
        let (bib, keys) = fixture();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();

        let res = resolver
            .resolve("Smith 2001: 33; Jones and Brown 1999", "abcd1234", &mut state)
            .unwrap();
        let found: Vec<&str> = res.citations.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(found, vec!["hhsSmithAbc", "hhgJonesAbc"]);

        let res = resolver.resolve("Smith 2001", "wxyz9876", &mut state).unwrap();
        assert_eq!(res.citations[0].raw, "Smith2001other");
    }

    #[test]
    fn test_unresolved_mentions_are_counted_and_dropped() {
        let (bib, keys) = fixture();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();

        let res = resolver
            .resolve("Nobody 1950; Smith 2001", "abcd1234", &mut state)
            .unwrap();
        assert_eq!(res.citations.len(), 1);
        resolver.resolve("Nobody 1950", "abcd1234", &mut state).unwrap();
        resolver.resolve("fieldnotes", "abcd1234", &mut state).unwrap();

        assert_eq!(state.unresolved.count("Nobody 1950"), 2);
        assert_eq!(
            state.unresolved.report(),
            vec![("fieldnotes", 1), ("Nobody 1950", 2)]
        );
    }

    #[test]
    fn test_same_key_emits_one_entry() {
        let (bib, keys) = fixture();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();

        let first = resolver.resolve("Smith 2001", "abcd1234", &mut state).unwrap();
        let second = resolver.resolve("hh:s:Smith:Abc", "abcd1234", &mut state).unwrap();
        assert_eq!(first.new_entries.len(), 1);
        assert!(second.new_entries.is_empty());
        assert_eq!(second.citations[0].key, "hhsSmithAbc");
    }

    #[test]
    fn test_resolve_sheet_stores_normalized_keys() {
        let (bib, keys) = fixture();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();
        let mut sheet = CodingSheet {
            language_id: "abcd1234".to_string(),
            language_name: "Abcd".to_string(),
            iso: None,
            coder: "JLA".to_string(),
            rows: vec![
                Row::new("GB020", "1").with_source("Smith 2001"),
                Row::new("GB021", "0").with_source("Smith 2001: 5; O'Neil2010"),
                Row::new("GB022", "0"),
            ],
            path: PathBuf::from("JLA_abcd1234.tsv"),
            modified: Utc::now(),
        };

        resolver.resolve_sheet(&mut sheet, &mut state).unwrap();

        assert_eq!(sheet.rows[0].source_keys, vec!["hhsSmithAbc"]);
        assert_eq!(sheet.rows[1].source_keys, vec!["hhsSmithAbc", "ONeil2010"]);
        assert!(sheet.rows[2].source_keys.is_empty());
        let (bibliography, unresolved) = state.into_parts();
        let ids: Vec<&str> = bibliography.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["hhsSmithAbc", "ONeil2010"]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_colliding_normalized_keys_are_not_conflated() {
        let mut bib = BibIndex::new();
        bib.insert(
            "hh:Smith2001",
            BibRecord::new("book").with_field("title", "Grammar A"),
        );
        bib.insert(
            "hhSmith2001",
            BibRecord::new("article").with_field("title", "Paper B"),
        );
        let keys = LanguageKeyMap::default();
        let resolver = CitationResolver::new(&bib, &keys);
        let mut state = ResolutionState::new();

        let first = resolver.resolve("hh:Smith2001", "abcd1234", &mut state).unwrap();
        assert_eq!(first.new_entries[0].id, "hhSmith2001");
        assert_eq!(first.new_entries[0].entry_type, "book");

        // Citing the first key again is fine
        resolver.resolve("hh:Smith2001", "efgh1234", &mut state).unwrap();

        let err = resolver.resolve("hhSmith2001", "efgh1234", &mut state).unwrap_err();
        match err {
            Error::CitationKeyCollision { id, first, second } => {
                assert_eq!(id, "hhSmith2001");
                assert_eq!(first, "hh:Smith2001");
                assert_eq!(second, "hhSmith2001");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
