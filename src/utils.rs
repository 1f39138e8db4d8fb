use crate::error::{LedgerInsightsError, Result};
use chrono::{Datelike, Months, NaiveDate};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, stored as its first day.
///
/// Ordering is chronological, so `Month` is used directly as the key of the
/// per-month bucket maps. Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerInsightsError::InvalidMonth(month));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Month)
            .ok_or_else(|| {
                LedgerInsightsError::DateError(format!("Year {} is out of range", year))
            })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Month(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::from_date(date) == *self
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn prev(&self) -> Self {
        self.offset(-1)
    }

    /// Earliest month chrono can represent.
    pub fn earliest() -> Self {
        Month::from_date(NaiveDate::MIN)
    }

    /// Latest month chrono can represent.
    pub fn latest() -> Self {
        Month::from_date(NaiveDate::MAX)
    }

    /// Shifts by `months` (negative goes back), or `None` past the calendar bounds.
    pub fn checked_offset(&self, months: i32) -> Option<Self> {
        let shifted = if months >= 0 {
            self.0.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.map(Month)
    }

    /// Shifts by `months`, clamping to [`Month::earliest`] or [`Month::latest`].
    pub fn offset(&self, months: i32) -> Self {
        self.checked_offset(months).unwrap_or_else(|| {
            if months >= 0 {
                Month::latest()
            } else {
                Month::earliest()
            }
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = LedgerInsightsError;

    fn from_str(s: &str) -> Result<Self> {
        parse_month_string(s)
    }
}

impl TryFrom<String> for Month {
    type Error = LedgerInsightsError;

    fn try_from(value: String) -> Result<Self> {
        parse_month_string(&value)
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

impl JsonSchema for Month {
    fn schema_name() -> String {
        "Month".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Every month from `start` to `end` inclusive, oldest first.
/// Empty when `end` precedes `start`.
pub fn months_in_range(start: Month, end: Month) -> Vec<Month> {
    let mut months = Vec::new();
    let mut current = start;
    while current <= end {
        months.push(current);
        let next = current.next();
        if next == current {
            break;
        }
        current = next;
    }
    months
}

pub fn months_between(start: Month, end: Month) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Parses a month string in the format "YYYY-MM"
pub fn parse_month_string(value: &str) -> Result<Month> {
    let trimmed = value.trim();
    let start_str = format!("{}-01", trimmed);
    let date = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        LedgerInsightsError::InvalidPeriod(format!(
            "Invalid month format: {}. Expected YYYY-MM",
            trimmed
        ))
    })?;
    Ok(Month(date))
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (start_month, end_month)
pub fn parse_period_string(period: &str) -> Result<(Month, Month)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let month = parse_month_string(parts[0])?;
            Ok((month, month))
        }
        2 => {
            let start = parse_month_string(parts[0])?;
            let end = parse_month_string(parts[1])?;
            if end < start {
                return Err(LedgerInsightsError::InvalidPeriod(format!(
                    "Period {} ends before it starts",
                    period
                )));
            }
            Ok((start, end))
        }
        _ => Err(LedgerInsightsError::InvalidPeriod(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}
