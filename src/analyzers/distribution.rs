//! Which wrong answers dominate the hardest questions.

use std::collections::HashMap;

use tracing::debug;

use crate::analyzers::types::{FailureDistribution, PointerDistribution, ResponseShare};
use crate::analyzers::utility::quantile;
use crate::error::PipelineError;
use crate::stats::{Field, ResponseTable, WRONG_RANKS};

/// Label for answers outside the most common `top_n`.
pub const OTHER: &str = "Other";

/// Keeps rows whose `%failed` is at or above the `percentile` quantile of
/// `%failed`. Returns the cutoff alongside the rows (`None` on an empty table).
pub fn worst_problems(
    table: &ResponseTable,
    percentile: f64,
) -> Result<(ResponseTable, Option<f64>), PipelineError> {
    if !(0.0..=1.0).contains(&percentile) {
        return Err(PipelineError::InvalidPercentile(percentile));
    }
    let missing = table.missing(&[Field::Failed]);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            context: "worst problems",
            columns: missing,
        });
    }

    let failed: Vec<f64> = table.records.iter().filter_map(|r| r.failed).collect();
    let Some(cutoff) = quantile(&failed, percentile) else {
        return Ok((table.with_records(Vec::new()), None));
    };

    let kept = table
        .records
        .iter()
        .filter(|r| r.failed.is_some_and(|f| f >= cutoff))
        .cloned()
        .collect();
    Ok((table.with_records(kept), Some(cutoff)))
}

/// Splits an exported answer such as `["1","2"]` into its tokens.
pub fn split_response(raw: &str) -> Vec<String> {
    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect::<String>()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-question percentage share of each wrong-answer token.
///
/// Tokens come from all three ranked responses. Tokens outside the `top_n`
/// most frequent across the whole table are merged into [`OTHER`].
/// Questions appear in first-seen order; shares by descending count.
pub fn failure_distribution(
    table: &ResponseTable,
    top_n: usize,
) -> Result<Vec<PointerDistribution>, PipelineError> {
    let missing = table.missing(&[Field::Pointer]);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            context: "failure distribution",
            columns: missing,
        });
    }

    let mut pairs: Vec<(&str, String)> = Vec::new();
    for record in &table.records {
        let Some(pointer) = record.pointer.as_deref() else {
            continue;
        };
        for rank in 1..=WRONG_RANKS {
            if let Some(response) = record.wrong(rank).response.as_deref() {
                pairs.extend(split_response(response).into_iter().map(|t| (pointer, t)));
            }
        }
    }

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for (_, token) in &pairs {
        *totals.entry(token.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<_> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top: Vec<String> = ranked
        .into_iter()
        .take(top_n)
        .map(|(token, _)| token.to_string())
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, HashMap<String, usize>> = HashMap::new();
    for (pointer, token) in &pairs {
        let pointer = *pointer;
        let label = if top.contains(token) {
            token.clone()
        } else {
            OTHER.to_string()
        };
        let per_pointer = counts.entry(pointer).or_insert_with(|| {
            order.push(pointer);
            HashMap::new()
        });
        *per_pointer.entry(label).or_default() += 1;
    }

    let distribution = order
        .into_iter()
        .map(|pointer| {
            let tally = counts.remove(pointer).unwrap_or_default();
            let total: usize = tally.values().sum();
            let mut shares: Vec<_> = tally
                .into_iter()
                .map(|(response, count)| ResponseShare {
                    response,
                    count,
                    pct: count as f64 / total as f64 * 100.0,
                })
                .collect();
            shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.response.cmp(&b.response)));
            PointerDistribution {
                pointer: pointer.to_string(),
                shares,
            }
        })
        .collect();

    Ok(distribution)
}

/// Worst questions by `%failed`, then their wrong-answer breakdown.
#[tracing::instrument(skip(table), fields(rows = table.len()))]
pub fn worst_failure_distribution(
    table: &ResponseTable,
    percentile: f64,
    top_n: usize,
) -> Result<FailureDistribution, PipelineError> {
    let (worst, cutoff) = worst_problems(table, percentile)?;
    debug!(worst = worst.len(), ?cutoff, "Selected worst problems");
    Ok(FailureDistribution {
        percentile,
        cutoff: cutoff.unwrap_or(0.0),
        top_n,
        pointers: failure_distribution(&worst, top_n)?,
    })
}
