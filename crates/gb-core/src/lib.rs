//! gb-core: Core library for curating a crowd-sourced feature coding dataset
//!
//! This library provides functionality to:
//! - Scan a directory for per-language coding sheets
//! - Pick one canonical sheet per language when a language was coded twice
//! - Resolve free-text source citations against a merged bibliography
//! - Assemble the normalized language/parameter/code/value tables
//! - Keep the collaborative tracking document in sync with the coded languages

pub mod bib;
pub mod citation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod languages;
pub mod markdown;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod selector;
pub mod sheet;
pub mod tracking;
pub mod writer;

pub use bib::{BibEntry, BibIndex, BibRecord, LanguageKeyMap};
pub use citation::{CitationResolver, ResolutionState, ResolvedCitation, UnresolvedTally};
pub use config::RunConfig;
pub use dataset::{assemble, ResolvedDataset};
pub use error::{Error, Result};
pub use features::{Feature, FeatureRegistry};
pub use languages::{LanguageIndex, Languoid};
pub use pipeline::{curate, run, sync_tracking_doc, Authorities, RunReport};
pub use scanner::{scan_sheets, SheetFile};
pub use selector::{select_canonical, Outcome, Selection};
pub use sheet::{CodingSheet, Row};
pub use tracking::{CodedLanguage, TrackingDocSync};
pub use writer::write_dataset;
