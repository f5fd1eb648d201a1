use crate::stats::{Field, ResponseRecord, ResponseTable, WRONG_RANKS};
use tracing::debug;

/// Sum of the three ranked wrong-answer percentages, missing ranks counting as 0.
pub fn combined_wrong_pct(record: &ResponseRecord) -> f64 {
    record
        .wrong_answers
        .iter()
        .map(|w| w.pct.unwrap_or(0.0))
        .sum()
}

/// Formats the ranked wrong answers as `1) <response> (<pct>%), 2) ...`.
///
/// A rank is included only when its percentage is present and above zero.
/// Returns an empty string when no rank qualifies.
pub fn summarize_wrong_answers(record: &ResponseRecord) -> String {
    (1..=WRONG_RANKS)
        .filter_map(|rank| {
            let wrong = record.wrong(rank);
            let pct = wrong.pct.filter(|p| *p > 0.0)?;
            let response = wrong.response.as_deref().unwrap_or("");
            Some(format!("{rank}) {response} ({pct}%)"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns a copy of `table` with `%wrong_combined` and `top three wrong answers`.
///
/// An existing `%wrong_combined` column is kept as is, so annotating twice
/// never adds the ranks again. The summary string is rebuilt every time.
pub fn annotate(table: &ResponseTable) -> ResponseTable {
    let mut out = table.clone();
    let had_combined = out.has(Field::WrongCombined);

    for record in &mut out.records {
        if !had_combined || record.wrong_combined.is_none() {
            record.wrong_combined = Some(combined_wrong_pct(record));
        }
        record.top_three = Some(summarize_wrong_answers(record));
    }

    out.push_column(Field::WrongCombined);
    out.push_column(Field::TopThree);

    debug!(rows = out.len(), had_combined, "Annotated wrong answers");
    out
}
