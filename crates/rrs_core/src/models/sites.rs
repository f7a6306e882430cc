//! Radar site metadata and per-run site selection.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata for one radar site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMeta {
    /// Four-letter site code, e.g. `KGRR`.
    pub code: String,
    /// Site latitude in decimal degrees.
    pub lat: f64,
    /// Site longitude in decimal degrees.
    pub lon: f64,
    /// Primary paired ground-observation station.
    pub asos_one: String,
    /// Backup paired ground-observation station.
    pub asos_two: String,
}

/// Errors loading the site catalog.
#[derive(Error, Debug)]
pub enum SiteCatalogError {
    #[error("failed to read site catalog: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse site catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// On-disk catalog layout: an array of `[[sites]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    sites: Vec<SiteMeta>,
}

/// Catalog of known radar sites, keyed by uppercase site code.
#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: HashMap<String, SiteMeta>,
}

impl SiteCatalog {
    /// Load the catalog from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SiteCatalogError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: CatalogFile = toml::from_str(&content)?;
        Ok(Self::from_sites(file.sites))
    }

    /// Build a catalog from already-parsed entries.
    pub fn from_sites(entries: Vec<SiteMeta>) -> Self {
        let sites = entries
            .into_iter()
            .map(|s| (s.code.to_uppercase(), s))
            .collect();
        Self { sites }
    }

    /// Look up a site by code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<&SiteMeta> {
        self.sites.get(&code.to_uppercase())
    }

    /// Number of known sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// The user's radar selection for one run.
///
/// Holds the requested site count and the ordered list of chosen sites.
/// Selecting more sites than requested drops the oldest picks, so the
/// list always holds the most recent `requested` choices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadarSelection {
    /// How many sites the user asked to simulate.
    pub requested: usize,
    /// Ordered chosen site codes (uppercase).
    pub sites: Vec<String>,
    /// Optional site the data is relocated to.
    pub transpose_to: Option<String>,
}

impl RadarSelection {
    /// Create an empty selection for the requested site count.
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            sites: Vec::new(),
            transpose_to: None,
        }
    }

    /// Record a site pick, keeping only the most recent `requested` picks.
    pub fn push_site(&mut self, code: &str) {
        self.sites.push(code.to_uppercase());
        if self.requested > 0 && self.sites.len() > self.requested {
            let excess = self.sites.len() - self.requested;
            self.sites.drain(..excess);
        }
    }

    /// Set or clear the transpose target site.
    pub fn set_transpose(&mut self, code: Option<&str>) {
        self.transpose_to = code.map(|c| c.to_uppercase());
    }

    /// Whether the pipeline may start with this selection.
    ///
    /// True when the chosen count matches the requested count, or when
    /// the requested count is zero ("original site only" mode).
    pub fn is_complete(&self) -> bool {
        self.requested == 0 || self.sites.len() == self.requested
    }

    /// Resolve the selection against the catalog.
    ///
    /// Unknown site codes are logged and skipped; a missing site never
    /// aborts the run.
    pub fn site_table(&self, catalog: &SiteCatalog) -> BTreeMap<String, SiteMeta> {
        let mut table = BTreeMap::new();
        for code in &self.sites {
            match catalog.get(code) {
                Some(meta) => {
                    table.insert(code.clone(), meta.clone());
                }
                None => {
                    tracing::warn!("unknown site code {}, skipping", code);
                }
            }
        }
        table
    }

    /// Metadata for the transpose target, if one is set and known.
    pub fn transpose_meta(&self, catalog: &SiteCatalog) -> Option<SiteMeta> {
        self.transpose_to
            .as_deref()
            .and_then(|code| catalog.get(code))
            .cloned()
    }
}
