//! Typed model of a quiz-response statistics export.
//!
//! A [`ResponseTable`] owns an ordered column list and the rows read under it.
//! A field is *present* when its column is in that list; each row then holds
//! `Some` for it once cleaned. Columns the model does not know about travel
//! through untouched as [`Field::Extra`].

use std::fmt;

pub const DOCUMENT_ID: &str = "document_id";
pub const DOCUMENT_NAME: &str = "document_name";
pub const POINTER: &str = "pointer";
pub const NUM_RESPONSES: &str = "num_responses";
pub const FAILED: &str = "%failed";
pub const GIVEUP: &str = "%giveup";
pub const TRIGGER_GOTO: &str = "%trigger_goto";
pub const WRONG_COMBINED: &str = "%wrong_combined";
pub const TOP_THREE: &str = "top three wrong answers";
pub const COURSE: &str = "course";

/// Number of ranked wrong answers carried per question.
pub const WRONG_RANKS: usize = 3;

/// A column of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DocumentId,
    DocumentName,
    Pointer,
    NumResponses,
    Failed,
    Giveup,
    TriggerGoto,
    /// `%failedN` for rank N in 1..=3.
    WrongPct(usize),
    /// `failedN_response` for rank N in 1..=3.
    WrongResponse(usize),
    WrongCombined,
    TopThree,
    Course,
    /// Index into [`ResponseTable::extra_headers`].
    Extra(usize),
}

impl Field {
    /// Maps a known header to its field. Unknown headers yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            DOCUMENT_ID => Field::DocumentId,
            DOCUMENT_NAME => Field::DocumentName,
            POINTER => Field::Pointer,
            NUM_RESPONSES => Field::NumResponses,
            FAILED => Field::Failed,
            GIVEUP => Field::Giveup,
            TRIGGER_GOTO => Field::TriggerGoto,
            WRONG_COMBINED => Field::WrongCombined,
            TOP_THREE => Field::TopThree,
            COURSE => Field::Course,
            other => return Self::ranked_from_name(other),
        };
        Some(field)
    }

    fn ranked_from_name(name: &str) -> Option<Self> {
        if let Some(rank) = name.strip_prefix("%failed") {
            return parse_rank(rank).map(Field::WrongPct);
        }
        name.strip_prefix("failed")
            .and_then(|rest| rest.strip_suffix("_response"))
            .and_then(parse_rank)
            .map(Field::WrongResponse)
    }

    /// Header text of a known field. `Extra` columns are named by their table.
    pub fn name(&self) -> Option<String> {
        let name = match self {
            Field::DocumentId => DOCUMENT_ID.to_string(),
            Field::DocumentName => DOCUMENT_NAME.to_string(),
            Field::Pointer => POINTER.to_string(),
            Field::NumResponses => NUM_RESPONSES.to_string(),
            Field::Failed => FAILED.to_string(),
            Field::Giveup => GIVEUP.to_string(),
            Field::TriggerGoto => TRIGGER_GOTO.to_string(),
            Field::WrongPct(rank) => format!("%failed{rank}"),
            Field::WrongResponse(rank) => format!("failed{rank}_response"),
            Field::WrongCombined => WRONG_COMBINED.to_string(),
            Field::TopThree => TOP_THREE.to_string(),
            Field::Course => COURSE.to_string(),
            Field::Extra(_) => return None,
        };
        Some(name)
    }
}

fn parse_rank(s: &str) -> Option<usize> {
    if s.len() != 1 {
        return None;
    }
    s.parse::<usize>()
        .ok()
        .filter(|rank| (1..=WRONG_RANKS).contains(rank))
}

/// A percentage column by naming convention.
pub fn is_percent_header(name: &str) -> bool {
    name.contains('%')
}

/// Cell values exports use for a missing value.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether `cell` spells a missing value. Matching is exact, no trimming.
pub fn is_na(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

/// One of the ranked most common wrong answers to a question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrongAnswer {
    pub pct: Option<f64>,
    pub response: Option<String>,
}

/// Outcome statistics for one question (`pointer`) within one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRecord {
    pub document_id: Option<String>,
    pub document_name: Option<String>,
    pub pointer: Option<String>,
    pub num_responses: Option<u64>,
    pub failed: Option<f64>,
    pub giveup: Option<f64>,
    pub trigger_goto: Option<f64>,
    pub wrong_answers: [WrongAnswer; WRONG_RANKS],
    pub wrong_combined: Option<f64>,
    pub top_three: Option<String>,
    pub course: Option<String>,
    /// Cells of unrecognised columns, aligned with the table's extra headers.
    pub extra: Vec<String>,
}

impl ResponseRecord {
    /// Wrong answer of rank 1..=3.
    pub fn wrong(&self, rank: usize) -> &WrongAnswer {
        &self.wrong_answers[rank - 1]
    }

    pub fn wrong_mut(&mut self, rank: usize) -> &mut WrongAnswer {
        &mut self.wrong_answers[rank - 1]
    }

    /// Best available label for the containing document.
    pub fn document_label(&self) -> Option<&str> {
        self.document_name
            .as_deref()
            .or(self.document_id.as_deref())
    }
}

/// A cell value viewed through its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

fn number(v: Option<f64>) -> Value<'static> {
    v.map_or(Value::Missing, Value::Number)
}

fn text(v: Option<&str>) -> Value<'_> {
    v.map_or(Value::Missing, Value::Text)
}

/// Parses a numeric cell. Blank, malformed and non-finite cells yield `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Ordered columns plus the records read under them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTable {
    pub columns: Vec<Field>,
    pub extra_headers: Vec<String>,
    pub records: Vec<ResponseRecord>,
}

impl ResponseTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.contains(&field)
    }

    /// Appends `field` to the column list unless already present.
    pub fn push_column(&mut self, field: Field) {
        if !self.has(field) {
            self.columns.push(field);
        }
    }

    pub fn header(&self, field: Field) -> String {
        match field {
            Field::Extra(idx) => self.extra_headers.get(idx).cloned().unwrap_or_default(),
            known => known.name().unwrap_or_default(),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|f| self.header(*f)).collect()
    }

    /// Resolves a header, including unrecognised columns, to a present field.
    pub fn field_by_header(&self, name: &str) -> Option<Field> {
        self.columns
            .iter()
            .copied()
            .find(|field| self.header(*field) == name)
    }

    /// Same columns, different rows.
    pub fn with_records(&self, records: Vec<ResponseRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            extra_headers: self.extra_headers.clone(),
            records,
        }
    }

    /// Those of `fields` the table does not carry, by header name.
    pub fn missing(&self, fields: &[Field]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| !self.has(**f))
            .map(|f| self.header(*f))
            .collect()
    }

    pub fn value<'a>(&self, record: &'a ResponseRecord, field: Field) -> Value<'a> {
        match field {
            Field::DocumentId => text(record.document_id.as_deref()),
            Field::DocumentName => text(record.document_name.as_deref()),
            Field::Pointer => text(record.pointer.as_deref()),
            Field::NumResponses => number(record.num_responses.map(|n| n as f64)),
            Field::Failed => number(record.failed),
            Field::Giveup => number(record.giveup),
            Field::TriggerGoto => number(record.trigger_goto),
            Field::WrongPct(rank) => number(record.wrong(rank).pct),
            Field::WrongResponse(rank) => text(record.wrong(rank).response.as_deref()),
            Field::WrongCombined => number(record.wrong_combined),
            Field::TopThree => text(record.top_three.as_deref()),
            Field::Course => text(record.course.as_deref()),
            Field::Extra(idx) => {
                let cell = record.extra.get(idx).map(String::as_str);
                let is_percent = self
                    .extra_headers
                    .get(idx)
                    .is_some_and(|h| is_percent_header(h));
                match cell {
                    Some(raw) if is_percent => number(parse_number(raw)),
                    other => text(other),
                }
            }
        }
    }

    /// Row cells in column order, rendered for output.
    pub fn row(&self, record: &ResponseRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|f| self.value(record, *f).to_string())
            .collect()
    }
}
