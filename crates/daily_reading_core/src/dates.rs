//! Calendar-date helpers: strict `YYYY-MM-DD` parsing, "today" in the
//! schedule's timezone, and inclusive date windows.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::validation::{FieldIssue, Issues};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_ISSUE: &str = "Must be a valid date in YYYY-MM-DD format";

/// Parses an exact calendar date.
///
/// The value must survive a format round-trip unchanged, so `2024-2-3`,
/// `+2024-02-03` and `2024-02-30` are all rejected.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    (date.format(DATE_FORMAT).to_string() == value).then_some(date)
}

/// Today's calendar date as seen in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Raw `from`/`to` query parameters before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// An inclusive `[from, to]` range of calendar dates with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateWindow {
    /// Validates both bounds, reporting every problem at once.
    pub fn parse(from: &str, to: &str) -> Result<Self, Vec<FieldIssue>> {
        let from_date = parse_calendar_date(from.trim());
        let to_date = parse_calendar_date(to.trim());

        let mut issues = Issues::default();
        if from_date.is_none() {
            issues.push("from", DATE_ISSUE);
        }
        if to_date.is_none() {
            issues.push("to", DATE_ISSUE);
        }

        match (from_date, to_date) {
            (Some(from), Some(to)) if from <= to => Ok(Self { from, to }),
            (Some(_), Some(_)) => {
                issues.push("to", "Must be greater than or equal to from");
                Err(issues.into_vec())
            }
            _ => Err(issues.into_vec()),
        }
    }

    pub fn from_query(query: &RangeQuery) -> Result<Self, Vec<FieldIssue>> {
        Self::parse(
            query.from.as_deref().unwrap_or_default(),
            query.to.as_deref().unwrap_or_default(),
        )
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}
