//! Request validation.
//!
//! Payloads arrive as loosely-typed JSON. Each operation first decodes the
//! payload into a `Raw*` struct whose fields are still `serde_json::Value`,
//! then validates that struct into a typed value or the full list of
//! field-level issues. Validation never stops at the first problem.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::{parse_calendar_date, DATE_ISSUE};
use crate::domain::{PlanEntry, Testament};

/// One violated field and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub issue: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: issue.into(),
        }
    }
}

/// Accumulates issues in the order they are found.
#[derive(Debug, Default)]
pub struct Issues(Vec<FieldIssue>);

impl Issues {
    pub fn push(&mut self, field: &str, issue: &str) {
        self.0.push(FieldIssue::new(field, issue));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldIssue> {
        self.0
    }

    /// `Ok(value)` when nothing was reported, otherwise every issue.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Vec<FieldIssue>> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

//=========================================================================================
// Loose Scalar Coercions
//=========================================================================================

/// Reads a JSON scalar as trimmed text.
///
/// Numbers keep their JSON spelling, `true` reads as `"1"`, and `false`,
/// `null`, arrays and objects read as empty.
pub fn loose_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

fn signed_integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").expect("static regex"))
}

fn page_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[1-9][0-9]*$").expect("static regex"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("static regex")
    })
}

/// Accepts a JSON integer, an integral float, or a decimal string (surrounding
/// whitespace and a leading sign allowed, leading zeros not) that is at least 1.
pub fn positive_int(value: &Value) -> Option<i32> {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => {
            let text = text.trim();
            if signed_integer_pattern().is_match(text) {
                text.parse::<i64>().ok()
            } else {
                None
            }
        }
        _ => None,
    }?;

    i32::try_from(parsed).ok().filter(|n| *n >= 1)
}

/// Strict page/id parameter from a URL: digits only, no sign, no leading zero.
pub fn positive_param(value: &str) -> Option<i64> {
    if page_number_pattern().is_match(value) {
        value.parse::<i64>().ok()
    } else {
        None
    }
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

/// Decodes a request body into a raw input struct.
///
/// Anything other than a JSON object decodes as the struct's default, so the
/// validator reports the missing fields instead of the request failing to parse.
pub fn decode_object<T: DeserializeOwned + Default>(payload: &Value) -> T {
    if payload.is_object() {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    } else {
        T::default()
    }
}

//=========================================================================================
// Plan Entries
//=========================================================================================

/// A plan entry as it arrived, before any field is checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlanEntry {
    pub date: Value,
    pub testament: Value,
    pub book: Value,
    pub chapter: Value,
}

impl RawPlanEntry {
    /// Decodes one element of an import batch; only objects qualify.
    pub fn from_json(value: &Value) -> Result<Self, FieldIssue> {
        if value.is_object() {
            Ok(decode_object(value))
        } else {
            Err(FieldIssue::new("entry", "Must be an object"))
        }
    }
}

/// Validates a single reading-plan entry.
///
/// The date must be an exact `YYYY-MM-DD` calendar date, the testament exactly
/// `old` or `new`, the book non-empty once trimmed, and the chapter a positive
/// integer (numeric strings allowed).
pub fn validate_plan_entry(raw: &RawPlanEntry) -> Result<PlanEntry, Vec<FieldIssue>> {
    let date = parse_calendar_date(&loose_text(&raw.date));
    let testament = Testament::parse(&loose_text(&raw.testament));
    let book = loose_text(&raw.book);
    let chapter = positive_int(&raw.chapter);

    let mut issues = Issues::default();
    if date.is_none() {
        issues.push("date", DATE_ISSUE);
    }
    if testament.is_none() {
        issues.push("testament", "Must be one of: old, new");
    }
    if book.is_empty() {
        issues.push("book", "Must be non-empty");
    }
    if chapter.is_none() {
        issues.push("chapter", "Must be a positive integer");
    }

    match (date, testament, chapter) {
        (Some(date), Some(testament), Some(chapter)) if issues.is_empty() => Ok(PlanEntry {
            date,
            testament,
            book,
            chapter,
        }),
        _ => Err(issues.into_vec()),
    }
}
