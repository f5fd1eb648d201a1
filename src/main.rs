//! CLI entry point for the quiz statistics tool.
//!
//! Provides subcommands for cleaning course exports, summarizing the most
//! common wrong answers, building per-course reports with chart data, and
//! breaking down the failed responses of the hardest questions.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quiz_stats::analyzers::aggregate::annotate;
use quiz_stats::analyzers::analyzer::{process_all_files, process_file};
use quiz_stats::analyzers::distribution::worst_failure_distribution;
use quiz_stats::analyzers::filter::{
    filter_by_num_responses_percentile, filter_data, retain_nonzero_wrong,
};
use quiz_stats::analyzers::summary::{build_summary_table, sort_by_field};
use quiz_stats::analyzers::utility::mean;
use quiz_stats::config::{
    CourseConfig, DEFAULT_BOGUS_FAILED, DEFAULT_BOGUS_WRONG_COMBINED, Thresholds,
};
use quiz_stats::output::{print_json, render_table, write_json, write_table};
use quiz_stats::parser::load;
use quiz_stats::report::{ColumnToggles, ReportOptions, bubble_chart, build_report};
use quiz_stats::stats::Field;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "quiz_stats")]
#[command(about = "Clean and summarize quiz response statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a single raw CSV export
    Clean {
        /// Raw CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory to write `<stem>_cleaned.csv` to
        #[arg(short, long, default_value = "data/processed")]
        output_dir: PathBuf,
    },
    /// Clean every CSV in a directory and write the course mapping
    ProcessAll {
        /// Directory containing raw CSV exports
        #[arg(short, long, default_value = "data/raw")]
        raw_dir: PathBuf,

        /// Directory to write cleaned CSVs and courses.json to
        #[arg(short, long, default_value = "data/processed")]
        processed_dir: PathBuf,
    },
    /// Summarize the most common wrong answers of a cleaned file
    Summarize {
        /// Cleaned CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Minimum number of responses per question
        #[arg(short, long, default_value_t = 0)]
        min_attempts: u64,

        /// Drop questions below this percentile of num_responses
        #[arg(short, long, default_value_t = 0.25)]
        percentile: f64,

        /// Keep questions with no wrong answers
        #[arg(long, default_value_t = false)]
        keep_zero_wrong: bool,

        /// CSV file to export the summary to
        #[arg(short, long, default_value = "all_failures_summary.csv")]
        output: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Show one course's summary table and export bubble chart data
    Report {
        /// Course mapping JSON ({"course name": "path"})
        #[arg(short, long, default_value = "data/processed/courses.json")]
        courses: PathBuf,

        /// Course to show (defaults to the first in name order)
        #[arg(long)]
        course: Option<String>,

        /// Minimum number of responses per question
        #[arg(short, long, default_value_t = 30)]
        min_attempts: u64,

        /// Column header to sort by
        #[arg(short, long)]
        sort_by: Option<String>,

        /// Sort ascending instead of descending
        #[arg(long, default_value_t = false)]
        ascending: bool,

        /// Show the %failed column
        #[arg(long, default_value_t = false)]
        show_failed: bool,

        /// Show the %giveup column
        #[arg(long, default_value_t = false)]
        show_giveup: bool,

        /// Show the %trigger_goto column
        #[arg(long, default_value_t = false)]
        show_trigger_goto: bool,

        /// Show the %wrong_combined column
        #[arg(long, default_value_t = false)]
        show_wrong_combined: bool,

        /// Optional: JSON file to write bubble chart series to
        #[arg(long)]
        chart: Option<PathBuf>,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Break down failed responses of the worst questions by %failed
    Worst {
        /// Cleaned CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keep questions at or above this percentile of %failed
        #[arg(short, long, default_value_t = 0.90)]
        percentile: f64,

        /// Number of most common answers kept before grouping into "Other"
        #[arg(short = 'n', long, default_value_t = 10)]
        top_n: usize,

        /// Optional: JSON file to write the distribution to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Cutoffs for rows dropped as bogus.
#[derive(Args)]
struct ThresholdArgs {
    /// Drop rows whose %wrong_combined is at or above this
    #[arg(long, default_value_t = DEFAULT_BOGUS_WRONG_COMBINED)]
    bogus_wrong_combined: f64,

    /// Drop rows whose %failed is at or above this
    #[arg(long, default_value_t = DEFAULT_BOGUS_FAILED)]
    bogus_failed: f64,
}

impl From<ThresholdArgs> for Thresholds {
    fn from(args: ThresholdArgs) -> Self {
        Thresholds {
            bogus_wrong_combined: args.bogus_wrong_combined,
            bogus_failed: args.bogus_failed,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean { file, output_dir } => {
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;
            let entry = process_file(&file, &output_dir)?;
            print_json(&entry)?;
        }
        Commands::ProcessAll {
            raw_dir,
            processed_dir,
        } => {
            let index = process_all_files(&raw_dir, &processed_dir)?;
            print_json(&index)?;
        }
        Commands::Summarize {
            file,
            min_attempts,
            percentile,
            keep_zero_wrong,
            output,
            thresholds,
        } => {
            summarize(
                &file,
                min_attempts,
                percentile,
                keep_zero_wrong,
                &output,
                &thresholds.into(),
            )?;
        }
        Commands::Report {
            courses,
            course,
            min_attempts,
            sort_by,
            ascending,
            show_failed,
            show_giveup,
            show_trigger_goto,
            show_wrong_combined,
            chart,
            thresholds,
        } => {
            let config = CourseConfig::load(&courses)?;
            let course = match course {
                Some(course) => course,
                None => config
                    .courses()
                    .next()
                    .map(str::to_string)
                    .with_context(|| format!("no courses in {}", courses.display()))?,
            };
            let table = load(config.path_for(&course)?)?;

            let options = ReportOptions {
                min_attempts,
                sort_by,
                descending: !ascending,
                toggles: ColumnToggles {
                    failed: show_failed,
                    giveup: show_giveup,
                    trigger_goto: show_trigger_goto,
                    wrong_combined: show_wrong_combined,
                },
                thresholds: thresholds.into(),
            };
            let report = build_report(&course, &table, &options)?;

            println!("Summary for {}", report.course);
            println!("{}", report.render());

            if let Some(chart_path) = chart {
                let chart = bubble_chart(&report.summary)?;
                write_json(&chart_path, &chart)?;
                info!(path = %chart_path.display(), traces = chart.traces.len(), "Bubble chart written");
            }
        }
        Commands::Worst {
            file,
            percentile,
            top_n,
            output,
        } => {
            let table = load(&file)?;
            let distribution = worst_failure_distribution(&table, percentile, top_n)?;
            match output {
                Some(path) => {
                    write_json(&path, &distribution)?;
                    info!(path = %path.display(), pointers = distribution.pointers.len(), "Distribution written");
                }
                None => println!("{}", serde_json::to_string_pretty(&distribution)?),
            }
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/quiz_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("quiz_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Drops noise and the least-attempted questions, then exports the summary
/// sorted by combined wrong percentage.
#[tracing::instrument(skip_all, fields(file = %file.display(), min_attempts = min_attempts, percentile = percentile))]
fn summarize(
    file: &Path,
    min_attempts: u64,
    percentile: f64,
    keep_zero_wrong: bool,
    output: &Path,
    thresholds: &Thresholds,
) -> Result<()> {
    let mut table = annotate(&load(file)?);
    if !keep_zero_wrong {
        table = retain_nonzero_wrong(&table);
    }
    let table = filter_data(&table, min_attempts, thresholds);
    let table = filter_by_num_responses_percentile(&table, percentile)?;
    let table = sort_by_field(&table, Field::WrongCombined, true)?;
    let summary = build_summary_table(&table);

    let combined: Vec<f64> = summary
        .records
        .iter()
        .filter_map(|r| r.wrong_combined)
        .collect();
    info!(
        rows = summary.len(),
        mean_wrong_combined = mean(&combined),
        "Summary built"
    );

    println!("{}", render_table(&summary, &summary.columns));
    write_table(output, &summary)?;
    info!(path = %output.display(), "Exported summary");

    Ok(())
}
