//! Per-course report: the filtered summary table plus bubble-chart series.
//!
//! This is the terminal counterpart of an interactive dashboard. A course is
//! picked from a [`CourseConfig`](crate::config::CourseConfig), rows are
//! filtered by a minimum attempt count bounded by the observed maximum, and
//! the summary is shown with a chosen set of columns and sort order.

use comfy_table::Table;
use tracing::{debug, info};

use crate::analyzers::aggregate::combined_wrong_pct;
use crate::analyzers::filter::filter_data;
use crate::analyzers::summary::{build_summary_table, sort_by_field};
use crate::analyzers::types::{BubbleChart, BubblePoint, BubbleTrace};
use crate::config::Thresholds;
use crate::error::PipelineError;
use crate::output::render_table;
use crate::stats::{Field, ResponseTable};

/// Always shown when present.
pub const BASE_COLUMNS: &[Field] = &[
    Field::DocumentName,
    Field::Pointer,
    Field::NumResponses,
    Field::TopThree,
];

pub const CHART_TITLE: &str = "Bubble Chart: Combined Wrong % vs Attempts";
pub const CHART_X_TITLE: &str = "Combined Wrong %";
pub const CHART_Y_TITLE: &str = "Number of Attempts";

/// Optional columns switched on for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnToggles {
    pub failed: bool,
    pub giveup: bool,
    pub trigger_goto: bool,
    pub wrong_combined: bool,
}

/// Base columns followed by the toggled optional ones, restricted to what
/// `table` carries.
pub fn visible_columns(table: &ResponseTable, toggles: &ColumnToggles) -> Vec<Field> {
    let optional = [
        (Field::Failed, toggles.failed),
        (Field::Giveup, toggles.giveup),
        (Field::TriggerGoto, toggles.trigger_goto),
        (Field::WrongCombined, toggles.wrong_combined),
    ];

    BASE_COLUMNS
        .iter()
        .copied()
        .chain(optional.into_iter().filter(|(_, on)| *on).map(|(f, _)| f))
        .filter(|f| table.has(*f))
        .collect()
}

/// Upper bound of the minimum-attempts selector.
pub fn max_num_responses(table: &ResponseTable) -> u64 {
    table
        .records
        .iter()
        .filter_map(|r| r.num_responses)
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub min_attempts: u64,
    /// Header of the column to sort by.
    pub sort_by: Option<String>,
    pub descending: bool,
    pub toggles: ColumnToggles,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub course: String,
    /// Requested minimum, clamped to `max_attempts`.
    pub min_attempts: u64,
    pub max_attempts: u64,
    pub summary: ResponseTable,
    pub columns: Vec<Field>,
}

impl Report {
    pub fn render(&self) -> Table {
        render_table(&self.summary, &self.columns)
    }
}

/// Filters, summarizes and sorts one course's cleaned table.
#[tracing::instrument(skip(table, options), fields(rows = table.len()))]
pub fn build_report(
    course: &str,
    table: &ResponseTable,
    options: &ReportOptions,
) -> Result<Report, PipelineError> {
    let max_attempts = max_num_responses(table);
    let min_attempts = options.min_attempts.min(max_attempts);

    let filtered = filter_data(table, min_attempts, &options.thresholds);
    let mut summary = build_summary_table(&filtered);

    if let Some(header) = &options.sort_by {
        let field = summary
            .field_by_header(header)
            .ok_or_else(|| PipelineError::MissingColumns {
                context: "sort",
                columns: vec![header.clone()],
            })?;
        summary = sort_by_field(&summary, field, options.descending)?;
    }

    let columns = visible_columns(&summary, &options.toggles);
    info!(
        course,
        min_attempts,
        max_attempts,
        rows = summary.len(),
        "Built course report"
    );

    Ok(Report {
        course: course.to_string(),
        min_attempts,
        max_attempts,
        summary,
        columns,
    })
}

/// Chart series where x = `%wrong_combined`, y = `num_responses`, bubble size
/// = estimated failed attempts and one trace (colour) per document.
///
/// # Errors
///
/// `MissingColumns` naming every required column the table lacks. The
/// document identity may come from `document_name` or `document_id`.
pub fn bubble_chart(table: &ResponseTable) -> Result<BubbleChart, PipelineError> {
    let mut missing = table.missing(&[Field::WrongCombined, Field::NumResponses, Field::Failed]);
    if !table.has(Field::DocumentName) && !table.has(Field::DocumentId) {
        missing.push(table.header(Field::DocumentName));
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            context: "bubble chart",
            columns: missing,
        });
    }

    let mut traces: Vec<BubbleTrace> = Vec::new();
    for record in &table.records {
        let Some(attempts) = record.num_responses else {
            continue;
        };
        let attempts = attempts as f64;
        let failed = record.failed.unwrap_or(0.0);
        let pointer = record.pointer.clone().unwrap_or_default();
        let top_three = record.top_three.as_deref().unwrap_or("");

        let point = BubblePoint {
            x: record
                .wrong_combined
                .unwrap_or_else(|| combined_wrong_pct(record)),
            y: attempts,
            size: failed / 100.0 * attempts,
            hover: format!("{pointer}: {top_three}"),
            pointer,
        };

        let name = record.document_label().unwrap_or("unknown");
        match traces.iter_mut().find(|t| t.name == name) {
            Some(trace) => trace.points.push(point),
            None => traces.push(BubbleTrace {
                name: name.to_string(),
                points: vec![point],
            }),
        }
    }

    debug!(traces = traces.len(), "Built bubble chart");
    Ok(BubbleChart {
        title: CHART_TITLE.to_string(),
        x_axis_title: CHART_X_TITLE.to_string(),
        y_axis_title: CHART_Y_TITLE.to_string(),
        traces,
    })
}
