use crate::analyzers::types::{CourseIndex, CourseIndexEntry};
use crate::config::CourseConfig;
use crate::error::PipelineError;
use crate::output::write_table;
use crate::parser::load;
use crate::stats::Field;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the course mapping written next to the cleaned files.
pub const COURSES_FILE: &str = "courses.json";

/// Derives a human-readable course label from a file stem:
/// `prealgebra_2_data` becomes `Prealgebra 2`.
pub fn course_name(stem: &str) -> String {
    let base = stem.strip_suffix("_data").unwrap_or(stem);
    title_case(&base.replace('_', " "))
}

/// Upper-cases the first letter of every run of letters, lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

fn course_for(raw_path: &Path) -> String {
    let stem = raw_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    course_name(&stem)
}

/// Cleaned output path for a raw file: `<stem>_cleaned.csv` in `processed_dir`.
pub fn cleaned_path(raw_path: &Path, processed_dir: &Path) -> PathBuf {
    let stem = raw_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    processed_dir.join(format!("{stem}_cleaned.csv"))
}

/// Cleans one raw export, tags it with its course, and writes the result.
#[tracing::instrument(skip_all, fields(raw = %raw_path.display()))]
pub fn process_file(raw_path: &Path, processed_dir: &Path) -> Result<CourseIndexEntry> {
    let mut table = load(raw_path)?;

    let course = course_for(raw_path);

    if !table.has(Field::Course) {
        for record in &mut table.records {
            record.course = Some(course.clone());
        }
        table.push_column(Field::Course);
    }

    let cleaned = cleaned_path(raw_path, processed_dir);
    write_table(&cleaned, &table)?;
    info!(course = %course, cleaned = %cleaned.display(), rows = table.len(), "Processed file");

    Ok(CourseIndexEntry {
        course,
        source: raw_path.to_path_buf(),
        cleaned,
        rows: table.len(),
    })
}

/// Cleans every `*.csv` in `raw_dir` into `processed_dir` and writes the
/// course mapping ([`COURSES_FILE`]) for the processed files.
///
/// # Errors
///
/// [`PipelineError::DuplicateCourse`] when two files share a course label,
/// checked before anything is written.
#[tracing::instrument(skip_all, fields(raw_dir = %raw_dir.display(), processed_dir = %processed_dir.display()))]
pub fn process_all_files(raw_dir: &Path, processed_dir: &Path) -> Result<CourseIndex> {
    fs::create_dir_all(processed_dir)
        .with_context(|| format!("failed to create {}", processed_dir.display()))?;

    let csv_files = list_csv_files(raw_dir)?;
    let mut courses = Vec::new();

    if csv_files.is_empty() {
        warn!("No CSV files found");
    } else {
        let mut config = CourseConfig::default();
        for csv_file in &csv_files {
            let course = course_for(csv_file);
            if let Ok(existing) = config.path_for(&course) {
                return Err(PipelineError::DuplicateCourse {
                    existing: existing.to_path_buf(),
                    source_file: csv_file.clone(),
                    course,
                }
                .into());
            }
            config.insert(course, cleaned_path(csv_file, processed_dir));
        }

        for csv_file in &csv_files {
            let entry = process_file(csv_file, processed_dir)?;
            courses.push(entry);
        }
        config.save(&processed_dir.join(COURSES_FILE))?;
        info!(files = courses.len(), courses = config.courses().count(), "Processed all files");
    }

    Ok(CourseIndex {
        generated_at: chrono::Utc::now(),
        courses,
    })
}

fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::read_raw;
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const DUMMY: &str = "\
document_name,pointer,num_responses,%failed1,failed1_response,%failed2,failed2_response,%failed3,failed3_response,%failed,%giveup,%trigger_goto
Dummy Course,dummy1,100,20,[0],10,[1],5,[2],35,0,0
";

    #[test]
    fn test_course_name() {
        assert_eq!(course_name("prealgebra_2_data"), "Prealgebra 2");
        assert_eq!(course_name("algebra_a_data"), "Algebra A");
        assert_eq!(course_name("dummy_data"), "Dummy");
        assert_eq!(course_name("GEOMETRY_unit"), "Geometry Unit");
        assert_eq!(course_name("data_science"), "Data Science");
    }

    #[test]
    fn test_cleaned_path() {
        assert_eq!(
            cleaned_path(Path::new("raw/dummy_data.csv"), Path::new("out")),
            Path::new("out/dummy_data_cleaned.csv")
        );
    }

    #[test]
    fn test_process_file_adds_course() {
        let raw_dir = temp_dir("quiz_stats_test_process_raw");
        let processed_dir = temp_dir("quiz_stats_test_process_out");
        let raw = raw_dir.join("dummy_data.csv");
        fs::write(&raw, DUMMY).unwrap();

        let entry = process_file(&raw, &processed_dir).unwrap();
        assert_eq!(entry.course(), "Dummy");
        assert_eq!(entry.rows(), 1);

        let processed = processed_dir.join("dummy_data_cleaned.csv");
        assert!(processed.exists());
        let raw_table = read_raw(&processed).unwrap();
        assert_eq!(raw_table.headers.last().map(String::as_str), Some("course"));
        assert_eq!(raw_table.rows[0].get(12), Some("Dummy"));

        fs::remove_dir_all(&raw_dir).unwrap();
        fs::remove_dir_all(&processed_dir).unwrap();
    }

    #[test]
    fn test_existing_course_column_is_kept() {
        let raw_dir = temp_dir("quiz_stats_test_course_kept_raw");
        let processed_dir = temp_dir("quiz_stats_test_course_kept_out");
        let raw = raw_dir.join("algebra_a_data.csv");
        fs::write(&raw, "pointer,course\np1,Custom\n").unwrap();

        process_file(&raw, &processed_dir).unwrap();
        let content = fs::read_to_string(processed_dir.join("algebra_a_data_cleaned.csv")).unwrap();
        assert_eq!(content, "pointer,course\np1,Custom\n");

        fs::remove_dir_all(&raw_dir).unwrap();
        fs::remove_dir_all(&processed_dir).unwrap();
    }

    #[test]
    fn test_process_all_files_writes_course_config() {
        let raw_dir = temp_dir("quiz_stats_test_all_raw");
        let processed_dir = env::temp_dir().join("quiz_stats_test_all_out");
        let _ = fs::remove_dir_all(&processed_dir);
        fs::write(raw_dir.join("prealgebra_1_data.csv"), DUMMY).unwrap();
        fs::write(raw_dir.join("algebra_a_data.csv"), DUMMY).unwrap();
        fs::write(raw_dir.join("notes.txt"), "ignored").unwrap();

        let index = process_all_files(&raw_dir, &processed_dir).unwrap();
        let courses: Vec<_> = index.courses().iter().map(|c| c.course()).collect();
        assert_eq!(courses, vec!["Algebra A", "Prealgebra 1"]);

        let config = CourseConfig::load(&processed_dir.join(COURSES_FILE)).unwrap();
        assert_eq!(
            config.path_for("Prealgebra 1").unwrap(),
            processed_dir.join("prealgebra_1_data_cleaned.csv")
        );

        fs::remove_dir_all(&raw_dir).unwrap();
        fs::remove_dir_all(&processed_dir).unwrap();
    }

    #[test]
    fn test_duplicate_course_labels_are_rejected() {
        let raw_dir = temp_dir("quiz_stats_test_dup_raw");
        let processed_dir = temp_dir("quiz_stats_test_dup_out");
        fs::write(raw_dir.join("algebra_a.csv"), DUMMY).unwrap();
        fs::write(raw_dir.join("algebra_a_data.csv"), DUMMY).unwrap();

        let err = process_all_files(&raw_dir, &processed_dir).unwrap_err();
        let err = err.downcast_ref::<PipelineError>().unwrap();
        assert!(matches!(err, PipelineError::DuplicateCourse { course, .. } if course == "Algebra A"));
        assert!(!processed_dir.join(COURSES_FILE).exists());
        assert!(!processed_dir.join("algebra_a_cleaned.csv").exists());

        fs::remove_dir_all(&raw_dir).unwrap();
        fs::remove_dir_all(&processed_dir).unwrap();
    }

    #[test]
    fn test_process_all_files_with_no_csv() {
        let raw_dir = temp_dir("quiz_stats_test_empty_raw");
        let processed_dir = temp_dir("quiz_stats_test_empty_out");

        let index = process_all_files(&raw_dir, &processed_dir).unwrap();
        assert!(index.courses().is_empty());
        assert!(!processed_dir.join(COURSES_FILE).exists());

        fs::remove_dir_all(&raw_dir).unwrap();
        fs::remove_dir_all(&processed_dir).unwrap();
    }
}
