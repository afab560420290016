use crate::analyzers::analyzer::analyze;
use crate::analyzers::error::AnalysisError;
use crate::analyzers::types::YearlyAnalysis;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Per-year memo of computed analyses, alive for the whole process.
///
/// The first successful result stored for a year wins and is never
/// invalidated; updated files on disk are only seen after a restart.
/// Failures are not stored, so a failed year is retried on the next request.
/// Two first requests for the same year may both compute; the later insert
/// keeps the earlier bundle.
pub struct AnalysisCache {
    data_root: PathBuf,
    entries: RwLock<HashMap<String, Arc<YearlyAnalysis>>>,
}

impl AnalysisCache {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Returns the cached analysis for `year`, if any.
    pub fn get(&self, year: &str) -> Option<Arc<YearlyAnalysis>> {
        self.entries.read().get(year).cloned()
    }

    /// Returns the cached analysis for `year`, computing it on first use.
    pub fn get_or_analyze(&self, year: &str) -> Result<Arc<YearlyAnalysis>, AnalysisError> {
        if let Some(hit) = self.get(year) {
            debug!(year, "Analysis cache hit");
            return Ok(hit);
        }

        let computed = Arc::new(analyze(&self.data_root, year)?);

        let mut entries = self.entries.write();
        let stored = entries.entry(year.to_string()).or_insert(computed);
        Ok(Arc::clone(stored))
    }

    pub fn is_cached(&self, year: &str) -> bool {
        self.entries.read().contains_key(year)
    }

    /// Years with a stored analysis, sorted.
    pub fn cached_years(&self) -> Vec<String> {
        let mut years: Vec<String> = self.entries.read().keys().cloned().collect();
        years.sort();
        years
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
