use quiz_stats::analyzers::aggregate::annotate;
use quiz_stats::analyzers::analyzer::{COURSES_FILE, process_all_files};
use quiz_stats::analyzers::filter::{
    filter_by_num_responses_percentile, filter_data, retain_nonzero_wrong,
};
use quiz_stats::analyzers::summary::{build_summary_table, sort_by_field};
use quiz_stats::config::{CourseConfig, Thresholds};
use quiz_stats::parser::load;
use quiz_stats::report::{ReportOptions, bubble_chart, build_report};
use quiz_stats::stats::Field;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/prealgebra_2_data.csv")
}

fn pointers(table: &quiz_stats::stats::ResponseTable) -> Vec<&str> {
    table
        .records
        .iter()
        .filter_map(|r| r.pointer.as_deref())
        .collect()
}

#[test]
fn test_cleaning_fills_missing_third_answer() {
    let table = load(&fixture()).expect("Failed to load fixture");
    assert_eq!(table.len(), 8);

    let first = &table.records[0];
    assert_eq!(first.wrong(3).pct, Some(0.0));
    assert_eq!(first.wrong(3).response.as_deref(), Some(""));
    // "n/a" in %failed
    assert_eq!(table.records[7].failed, Some(0.0));
}

#[test]
fn test_full_pipeline() {
    let table = annotate(&load(&fixture()).expect("Failed to load fixture"));
    let table = retain_nonzero_wrong(&table);
    let table = filter_data(&table, 30, &Thresholds::default());
    let table = filter_by_num_responses_percentile(&table, 0.25).unwrap();
    let table = sort_by_field(&table, Field::WrongCombined, true).unwrap();
    let summary = build_summary_table(&table);

    assert_eq!(
        pointers(&summary),
        vec![
            "body2NumericProblem",
            "body13MultiAnswerProblem",
            "body11MultiAnswerProblem"
        ]
    );
    assert_eq!(
        summary.records[0].top_three.as_deref(),
        Some("1) 40 (20%), 2) 4 (10%), 3) 0.4 (5%)")
    );
    assert!(summary.records.iter().all(|r| r.wrong_combined.unwrap() < 99.0));
    assert!(!summary.headers().contains(&"version".to_string()));
}

#[test]
fn test_batch_then_report() {
    let raw_dir = std::env::temp_dir().join("quiz_stats_it_raw");
    let processed_dir = std::env::temp_dir().join("quiz_stats_it_processed");
    let _ = fs::remove_dir_all(&raw_dir);
    let _ = fs::remove_dir_all(&processed_dir);
    fs::create_dir_all(&raw_dir).unwrap();
    fs::copy(fixture(), raw_dir.join("prealgebra_2_data.csv")).unwrap();

    let index = process_all_files(&raw_dir, &processed_dir).unwrap();
    assert_eq!(index.courses().len(), 1);

    let config = CourseConfig::load(&processed_dir.join(COURSES_FILE)).unwrap();
    assert_eq!(
        config.path_for("Prealgebra 2").unwrap(),
        index.courses()[0].cleaned()
    );
    let table = load(config.path_for("Prealgebra 2").unwrap()).unwrap();
    assert!(table.has(Field::Course));
    assert_eq!(table.records[0].course.as_deref(), Some("Prealgebra 2"));

    let options = ReportOptions {
        min_attempts: 30,
        sort_by: Some("num_responses".into()),
        descending: true,
        ..Default::default()
    };
    let report = build_report("Prealgebra 2", &table, &options).unwrap();
    assert_eq!(report.max_attempts, 8072);
    assert_eq!(
        pointers(&report.summary),
        vec![
            "body13MultiAnswerProblem",
            "body11MultiAnswerProblem",
            "body4MultiAnswerProblem",
            "body2NumericProblem",
            "body6MultiAnswerProblem"
        ]
    );

    let chart = bubble_chart(&report.summary).unwrap();
    let names: Vec<_> = chart.traces.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["What is a Percent?", "Percent Change", "Percent of a Number"]
    );

    fs::remove_dir_all(&raw_dir).unwrap();
    fs::remove_dir_all(&processed_dir).unwrap();
}
