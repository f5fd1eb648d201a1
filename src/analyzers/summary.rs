//! Reporting projection of an annotated response table.

use std::cmp::Ordering;

use crate::analyzers::aggregate::annotate;
use crate::error::PipelineError;
use crate::stats::{Field, ResponseTable, Value};

/// Columns a summary table may carry, in output order.
pub const SUMMARY_COLUMNS: &[Field] = &[
    Field::DocumentId,
    Field::DocumentName,
    Field::Pointer,
    Field::NumResponses,
    Field::Failed,
    Field::Giveup,
    Field::TriggerGoto,
    Field::WrongPct(1),
    Field::WrongResponse(1),
    Field::WrongPct(2),
    Field::WrongResponse(2),
    Field::WrongPct(3),
    Field::WrongResponse(3),
    Field::WrongCombined,
    Field::TopThree,
];

/// Projects `table` onto [`SUMMARY_COLUMNS`], keeping only those present.
///
/// `%wrong_combined` is computed when missing and the top-three string is
/// always added. Row order is preserved.
pub fn build_summary_table(table: &ResponseTable) -> ResponseTable {
    let annotated = annotate(table);
    let columns = SUMMARY_COLUMNS
        .iter()
        .copied()
        .filter(|f| annotated.has(*f))
        .collect();

    let records = annotated
        .records
        .into_iter()
        .map(|mut r| {
            r.extra.clear();
            r
        })
        .collect();

    ResponseTable {
        columns,
        extra_headers: Vec::new(),
        records,
    }
}

/// Stable sort by one present column. Rows without a value sort last in
/// either direction.
pub fn sort_by_field(
    table: &ResponseTable,
    field: Field,
    descending: bool,
) -> Result<ResponseTable, PipelineError> {
    if !table.has(field) {
        return Err(PipelineError::MissingColumns {
            context: "sort",
            columns: vec![table.header(field)],
        });
    }

    let mut records = table.records.clone();
    records.sort_by(|a, b| {
        match (table.value(a, field), table.value(b, field)) {
            (Value::Missing, Value::Missing) => Ordering::Equal,
            (Value::Missing, _) => Ordering::Greater,
            (_, Value::Missing) => Ordering::Less,
            (x, y) => {
                let ord = compare_values(x, y);
                if descending { ord.reverse() } else { ord }
            }
        }
    });
    Ok(table.with_records(records))
}

fn compare_values(a: Value<'_>, b: Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(&y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{clean, read_raw_from};

    const INPUT: &str = "\
document_name,pointer,num_responses,%failed1,failed1_response,%failed2,failed2_response,%failed3,failed3_response,%failed,%giveup,%trigger_goto,version
Course A,p1,100,20,[0],10,[2],5,[4],35,0,0,3
Course A,p2,200,30,[1],15,[3],10,[5],55,0,0,3
";

    fn input() -> ResponseTable {
        clean(read_raw_from(INPUT.as_bytes()).unwrap())
    }

    #[test]
    fn test_summary_has_expected_columns() {
        let summary = build_summary_table(&input());
        assert_eq!(
            summary.headers(),
            vec![
                "document_name",
                "pointer",
                "num_responses",
                "%failed",
                "%giveup",
                "%trigger_goto",
                "%failed1",
                "failed1_response",
                "%failed2",
                "failed2_response",
                "%failed3",
                "failed3_response",
                "%wrong_combined",
                "top three wrong answers",
            ]
        );
    }

    #[test]
    fn test_summary_computes_combined_wrong() {
        let summary = build_summary_table(&input());
        let combined: Vec<_> = summary.records.iter().map(|r| r.wrong_combined).collect();
        assert_eq!(combined, vec![Some(35.0), Some(55.0)]);
        assert_eq!(
            summary.records[1].top_three.as_deref(),
            Some("1) [1] (30%), 2) [3] (15%), 3) [5] (10%)")
        );
    }

    #[test]
    fn test_summary_degrades_without_optional_columns() {
        let raw = "pointer,%failed1,failed1_response\np1,12,[0]\n";
        let summary = build_summary_table(&clean(read_raw_from(raw.as_bytes()).unwrap()));
        assert_eq!(
            summary.headers(),
            vec![
                "pointer",
                "%failed1",
                "failed1_response",
                "%wrong_combined",
                "top three wrong answers"
            ]
        );
        assert_eq!(summary.records[0].wrong_combined, Some(12.0));
    }

    #[test]
    fn test_summary_drops_unknown_columns() {
        let summary = build_summary_table(&input());
        assert!(summary.extra_headers.is_empty());
        assert!(summary.records.iter().all(|r| r.extra.is_empty()));
    }

    #[test]
    fn test_sort_descending_by_number() {
        let summary = build_summary_table(&input());
        let sorted = sort_by_field(&summary, Field::WrongCombined, true).unwrap();
        let pointers: Vec<_> = sorted
            .records
            .iter()
            .filter_map(|r| r.pointer.as_deref())
            .collect();
        assert_eq!(pointers, vec!["p2", "p1"]);
    }

    #[test]
    fn test_sort_puts_missing_last() {
        let mut table = input();
        table.records[0].num_responses = None;
        for descending in [false, true] {
            let sorted = sort_by_field(&table, Field::NumResponses, descending).unwrap();
            assert_eq!(sorted.records[1].num_responses, None);
        }
    }

    #[test]
    fn test_sort_by_absent_column_fails() {
        let table = input();
        assert!(sort_by_field(&table, Field::Course, false).is_err());
    }
}
