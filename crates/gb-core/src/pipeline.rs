//! The curation run: select, resolve, assemble, persist, sync

use crate::bib::{BibIndex, LanguageKeyMap};
use crate::citation::{CitationResolver, ResolutionState, UnresolvedTally};
use crate::config::RunConfig;
use crate::dataset::{assemble, ResolvedDataset};
use crate::error::Result;
use crate::features::FeatureRegistry;
use crate::languages::LanguageIndex;
use crate::parser::read_sheet;
use crate::scanner::scan_sheets;
use crate::selector::{select_canonical, Selection};
use crate::sheet::CodingSheet;
use crate::tracking::{CodedLanguage, SyncOutcome, TrackingDocSync};
use crate::writer::{write_dataset, WriteResult};
use std::path::PathBuf;
use tracing::info;

/// Read-only lookup tables, built once per run
#[derive(Debug, Clone, Default)]
pub struct Authorities {
    pub bib: BibIndex,
    pub languages: LanguageIndex,
    pub features: FeatureRegistry,
    pub language_keys: LanguageKeyMap,
}

impl Authorities {
    pub fn new(bib: BibIndex, languages: LanguageIndex, features: FeatureRegistry) -> Self {
        let language_keys = LanguageKeyMap::build(&bib, &languages);
        Self {
            bib,
            languages,
            features,
            language_keys,
        }
    }

    /// Load all authorities named in the config
    pub fn load(config: &RunConfig) -> Result<Self> {
        let languages = LanguageIndex::load(&config.languoids)?;
        let features = FeatureRegistry::load(&config.features)?;
        let bib = BibIndex::load(&config.bibliographies)?;
        info!(
            languoids = languages.len(),
            features = features.len(),
            references = bib.len(),
            "authorities loaded"
        );
        Ok(Self::new(bib, languages, features))
    }
}

/// Everything a run produced, including its diagnostics
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub dataset: ResolvedDataset,
    /// Languages with a canonical sheet
    pub coded: Vec<CodedLanguage>,
    pub selections: Vec<Selection>,
    pub unresolved: UnresolvedTally,
    pub empty_sheets: Vec<PathBuf>,
    pub written: Option<WriteResult>,
    pub tracking: Option<SyncOutcome>,
}

/// Read every sheet under the sheets directory
pub fn read_sheets(config: &RunConfig, languages: &LanguageIndex) -> Result<Vec<CodingSheet>> {
    let files = scan_sheets(&config.sheets_dir)?;
    info!(dir = %config.sheets_dir.display(), files = files.len(), "reading sheets");
    files.iter().map(|f| read_sheet(f, languages)).collect()
}

/// Select canonical sheets, resolve citations and assemble the dataset
pub fn curate(authorities: &Authorities, sheets: Vec<CodingSheet>) -> Result<RunReport> {
    let selection = select_canonical(sheets);
    let mut canonical = selection.sheets;

    let resolver = CitationResolver::new(&authorities.bib, &authorities.language_keys);
    let mut state = ResolutionState::new();
    for sheet in &mut canonical {
        resolver.resolve_sheet(sheet, &mut state)?;
    }
    let (bibliography, unresolved) = state.into_parts();

    let dataset = assemble(
        &authorities.features,
        &authorities.languages,
        &canonical,
        bibliography,
    )?;

    Ok(RunReport {
        dataset,
        coded: canonical.iter().map(CodedLanguage::from).collect(),
        selections: selection.selections,
        unresolved,
        empty_sheets: canonical
            .iter()
            .filter(|s| s.is_empty())
            .map(|s| s.path.clone())
            .collect(),
        written: None,
        tracking: None,
    })
}

/// Full run: load, read, curate, write the dataset and sync the tracking document
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let authorities = Authorities::load(config)?;
    let sheets = read_sheets(config, &authorities.languages)?;
    let mut report = curate(&authorities, sheets)?;

    report.written = Some(write_dataset(&report.dataset, &config.output_dir)?);

    if let Some(doc) = &config.tracking_doc {
        let sync = TrackingDocSync::new(&report.coded, &authorities.languages);
        report.tracking = Some(sync.sync_file(doc)?);
    }

    Ok(report)
}

/// Rewrite only the tracking document from the current sheets
pub fn sync_tracking_doc(config: &RunConfig) -> Result<Option<SyncOutcome>> {
    let Some(doc) = &config.tracking_doc else {
        return Ok(None);
    };
    let languages = LanguageIndex::load(&config.languoids)?;
    let sheets = read_sheets(config, &languages)?;
    let selection = select_canonical(sheets);
    let coded: Vec<CodedLanguage> = selection.sheets.iter().map(CodedLanguage::from).collect();
    TrackingDocSync::new(&coded, &languages).sync_file(doc).map(Some)
}
