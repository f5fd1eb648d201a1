//! Run configuration: which courses exist and where the bogus-row cutoffs sit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// `%wrong_combined` at or above this is a data-collection artifact.
pub const DEFAULT_BOGUS_WRONG_COMBINED: f64 = 99.0;
/// `%failed` at or above this (every attempt failed) is treated as an anomaly.
pub const DEFAULT_BOGUS_FAILED: f64 = 100.0;

/// Cutoffs for rows excluded as bogus. Both bounds are exclusive on the kept side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub bogus_wrong_combined: f64,
    pub bogus_failed: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bogus_wrong_combined: DEFAULT_BOGUS_WRONG_COMBINED,
            bogus_failed: DEFAULT_BOGUS_FAILED,
        }
    }
}

/// Maps course names to cleaned data files.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "Prealgebra 1": "data/processed/prealgebra_1_data_cleaned.csv",
///   "Algebra A": "data/processed/algebra_a_data_cleaned.csv"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseConfig {
    entries: BTreeMap<String, PathBuf>,
}

impl CourseConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read course config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid course config {}", path.display()))?;
        Ok(config)
    }

    /// Writes the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write course config {}", path.display()))
    }

    pub fn insert(&mut self, course: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(course.into(), path.into());
    }

    /// Data file for `course`.
    pub fn path_for(&self, course: &str) -> Result<&Path, PipelineError> {
        self.entries
            .get(course)
            .map(PathBuf::as_path)
            .ok_or_else(|| PipelineError::UnknownCourse(course.to_string()))
    }

    /// Course names in selector order.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

}
