//! Errors raised by the analysis pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A computation needs columns the table does not carry.
    #[error("{context} requires missing column(s): {}", .columns.join(", "))]
    MissingColumns {
        context: &'static str,
        columns: Vec<String>,
    },
    #[error("percentile must be within [0, 1], got {0}")]
    InvalidPercentile(f64),
    #[error("unknown course '{0}'")]
    UnknownCourse(String),
    /// Two raw files map to the same course label.
    #[error("course '{course}' from {} is already taken by {}", .source_file.display(), .existing.display())]
    DuplicateCourse {
        course: String,
        source_file: PathBuf,
        existing: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_names_every_field() {
        let err = PipelineError::MissingColumns {
            context: "bubble chart",
            columns: vec!["%failed".into(), "num_responses".into()],
        };
        assert_eq!(
            err.to_string(),
            "bubble chart requires missing column(s): %failed, num_responses"
        );
    }
}
