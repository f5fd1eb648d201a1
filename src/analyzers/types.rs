//! Serializable outputs of the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One cleaned course file produced by a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct CourseIndexEntry {
    pub(crate) course: String,
    pub(crate) source: PathBuf,
    pub(crate) cleaned: PathBuf,
    pub(crate) rows: usize,
}

impl CourseIndexEntry {
    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn cleaned(&self) -> &Path {
        &self.cleaned
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Everything a batch run wrote, saved next to the cleaned files.
#[derive(Debug, Serialize)]
pub struct CourseIndex {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) courses: Vec<CourseIndexEntry>,
}

impl CourseIndex {
    pub fn courses(&self) -> &[CourseIndexEntry] {
        &self.courses
    }
}

/// A single question plotted on the bubble chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    /// `%wrong_combined`
    pub x: f64,
    /// `num_responses`
    pub y: f64,
    /// Estimated failed attempts, `%failed / 100 * num_responses`.
    pub size: f64,
    pub pointer: String,
    pub hover: String,
}

/// Points sharing one colour: all questions of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleTrace {
    pub name: String,
    pub points: Vec<BubblePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleChart {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub traces: Vec<BubbleTrace>,
}

/// Share of one answer token among a question's failed responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseShare {
    pub response: String,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerDistribution {
    pub pointer: String,
    pub shares: Vec<ResponseShare>,
}

/// Failed-response breakdown of the worst questions by `%failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDistribution {
    pub percentile: f64,
    pub cutoff: f64,
    pub top_n: usize,
    pub pointers: Vec<PointerDistribution>,
}
