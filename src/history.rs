//! Historical series store for chart consumers.
//!
//! Loads a pre-flattened JSON file of `{date, value}` points per metric name
//! once at startup; immutable after load. The file is produced out of band
//! (a crawler collaborator); the engine treats it as an opaque external
//! input and runs fine without one.

use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// One observed historical point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryPoint {
    /// Observation date, `YYYY-MM-DD` or a bare year.
    pub date: String,
    pub value: f64,
}

/// Immutable per-metric historical series, keyed by metric name.
#[derive(Debug, Default)]
pub struct HistoryStore {
    series: FxHashMap<String, Vec<HistoryPoint>>,
}

impl HistoryStore {
    /// Empty store: every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read history file {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse history file {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let series: FxHashMap<String, Vec<HistoryPoint>> = serde_json::from_str(raw)?;
        Ok(Self { series })
    }

    pub fn series(&self, name: &str) -> Option<&[HistoryPoint]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_per_metric_series() {
        let store = HistoryStore::from_json_str(
            r#"{
                "debt": [
                    {"date": "2025-09-24", "value": 37454537246248.71},
                    {"date": "2025-08-24", "value": 37400000000000.0}
                ],
                "population": [
                    {"date": "2024", "value": 335000000.0}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        let debt = store.series("debt").unwrap();
        assert_eq!(debt.len(), 2);
        assert_eq!(debt[0].value, 37_454_537_246_248.71);
        assert!(store.series("gdp").is_none());
    }

    #[test]
    fn empty_store_misses_everything() {
        let store = HistoryStore::empty();
        assert!(store.is_empty());
        assert!(store.series("debt").is_none());
    }
}
