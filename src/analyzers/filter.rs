//! Row filters. Every filter is stable and returns a new table.

use tracing::debug;

use crate::analyzers::aggregate::combined_wrong_pct;
use crate::analyzers::utility::quantile;
use crate::config::Thresholds;
use crate::error::PipelineError;
use crate::stats::{Field, ResponseRecord, ResponseTable};

fn wrong_combined(record: &ResponseRecord) -> f64 {
    record
        .wrong_combined
        .unwrap_or_else(|| combined_wrong_pct(record))
}

/// Drops under-attempted and bogus rows.
///
/// A row is kept when all of these hold:
/// - `num_responses >= min_attempts`, if the table has `num_responses`;
/// - `%wrong_combined` is below `thresholds.bogus_wrong_combined`;
/// - `%failed` is below `thresholds.bogus_failed`, if the table has `%failed`.
pub fn filter_data(table: &ResponseTable, min_attempts: u64, thresholds: &Thresholds) -> ResponseTable {
    let check_attempts = table.has(Field::NumResponses);
    let check_failed = table.has(Field::Failed);

    let kept: Vec<_> = table
        .records
        .iter()
        .filter(|r| !check_attempts || r.num_responses.is_some_and(|n| n >= min_attempts))
        .filter(|r| wrong_combined(r) < thresholds.bogus_wrong_combined)
        .filter(|r| !check_failed || r.failed.is_none_or(|f| f < thresholds.bogus_failed))
        .cloned()
        .collect();

    debug!(
        before = table.len(),
        after = kept.len(),
        min_attempts,
        "Filtered rows"
    );
    table.with_records(kept)
}

/// Drops rows whose combined wrong percentage is zero.
pub fn retain_nonzero_wrong(table: &ResponseTable) -> ResponseTable {
    let kept = table
        .records
        .iter()
        .filter(|r| wrong_combined(r) > 0.0)
        .cloned()
        .collect();
    table.with_records(kept)
}

/// Keeps rows whose `num_responses` is at or above the `percentile` quantile
/// of `num_responses` across the table, e.g. `0.25` drops the least-attempted
/// quarter.
///
/// # Errors
///
/// `InvalidPercentile` outside `[0, 1]`, `MissingColumns` without `num_responses`.
pub fn filter_by_num_responses_percentile(
    table: &ResponseTable,
    percentile: f64,
) -> Result<ResponseTable, PipelineError> {
    if !(0.0..=1.0).contains(&percentile) {
        return Err(PipelineError::InvalidPercentile(percentile));
    }
    let missing = table.missing(&[Field::NumResponses]);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            context: "percentile filter",
            columns: missing,
        });
    }

    let counts: Vec<f64> = table
        .records
        .iter()
        .filter_map(|r| r.num_responses)
        .map(|n| n as f64)
        .collect();
    let Some(cutoff) = quantile(&counts, percentile) else {
        return Ok(table.with_records(Vec::new()));
    };

    let kept: Vec<_> = table
        .records
        .iter()
        .filter(|r| r.num_responses.is_some_and(|n| n as f64 >= cutoff))
        .cloned()
        .collect();

    debug!(percentile, cutoff, before = table.len(), after = kept.len(), "Applied percentile cutoff");
    Ok(table.with_records(kept))
}
