//! Run configuration: where the inputs live and where outputs go

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths for one curation run, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding the coding sheets
    pub sheets_dir: PathBuf,
    /// Bibliography files, merged in order (later files win)
    pub bibliographies: Vec<PathBuf>,
    /// Languoid records of the taxonomy authority
    pub languoids: PathBuf,
    /// Feature registry
    pub features: PathBuf,
    /// Tracking document to rewrite, if any
    #[serde(default)]
    pub tracking_doc: Option<PathBuf>,
    /// Output directory for the dataset
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// Load a config file; relative paths are resolved against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config.relative_to(path.parent().unwrap_or_else(|| Path::new(""))))
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// A template with the conventional repository layout
    pub fn template() -> Self {
        Self {
            sheets_dir: PathBuf::from("original_sheets"),
            bibliographies: vec![
                PathBuf::from("glottolog/mpieva.json"),
                PathBuf::from("glottolog/hh.json"),
                PathBuf::from("sources.json"),
            ],
            languoids: PathBuf::from("glottolog/languoids.json"),
            features: PathBuf::from("features.json"),
            tracking_doc: Some(PathBuf::from("wiki/Languages-to-code.md")),
            output_dir: PathBuf::from("cldf"),
        }
    }

    fn relative_to(self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        Self {
            sheets_dir: resolve(self.sheets_dir),
            bibliographies: self.bibliographies.into_iter().map(resolve).collect(),
            languoids: resolve(self.languoids),
            features: resolve(self.features),
            tracking_doc: self.tracking_doc.map(resolve),
            output_dir: resolve(self.output_dir),
        }
    }
}
