//! Argument parsing shared by the Sensr tools
//!
//! Every failure here is a [`SensrError::InvalidArguments`] raised before
//! any request is sent.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Result, SensrError};

/// Deserializes tool arguments, treating a missing argument object as `{}`
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| SensrError::InvalidArguments(format!("{}: {}", tool, e)).into())
}

/// Trims `value` and rejects it when empty
pub fn require_non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SensrError::InvalidArguments(format!("{} must not be empty", field)).into());
    }
    Ok(trimmed.to_string())
}

/// Parses a `YYYY-MM-DD` date, or returns today's date in `tz`
///
/// # Examples
///
/// ```
/// use sensorbio_mcp::tools::args::resolve_date;
///
/// let date = resolve_date(Some("2024-02-29"), chrono_tz::America::Chicago).unwrap();
/// assert_eq!(date.to_string(), "2024-02-29");
/// assert!(resolve_date(Some("2024-02-30"), chrono_tz::UTC).is_err());
/// ```
pub fn resolve_date(date: Option<&str>, tz: Tz) -> Result<NaiveDate> {
    match non_blank(date) {
        Some(raw) => parse_date("date", raw),
        None => Ok(today_in(tz)),
    }
}

/// Parses a `YYYY-MM-DD` value of argument `field`
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        SensrError::InvalidArguments(format!("{} must be YYYY-MM-DD, got '{}'", field, raw)).into()
    })
}

/// Trimmed value, with blank treated as absent
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Today's calendar date in `tz`
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Longest span a date range may expand to
pub const MAX_RANGE_DAYS: i64 = 366;

/// Date inputs shared by the per-day tools
///
/// At most one form is used, in this order of precedence: `date`, then
/// `days`, then `start_date`/`end_date`. With none of them the selection is
/// today.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DateRangeArgs {
    /// Single day
    #[serde(default)]
    pub date: Option<String>,
    /// First day of an inclusive range
    #[serde(default)]
    pub start_date: Option<String>,
    /// Last day of an inclusive range
    #[serde(default)]
    pub end_date: Option<String>,
    /// Last N days ending today
    #[serde(default)]
    pub days: Option<i64>,
}

/// Days selected by a [`DateRangeArgs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSelection {
    /// One day from `date`, or today
    Single(NaiveDate),
    /// Inclusive run of days from `days` or `start_date`/`end_date`
    Range(Vec<NaiveDate>),
}

impl DateSelection {
    /// Selected days in ascending order
    pub fn into_dates(self) -> Vec<NaiveDate> {
        match self {
            DateSelection::Single(date) => vec![date],
            DateSelection::Range(dates) => dates,
        }
    }
}

impl DateRangeArgs {
    /// Expands the inputs into calendar days, with "today" taken in `tz`
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::InvalidArguments`] when a date is malformed,
    /// `days < 1`, only one range bound is given, `end_date < start_date`,
    /// or the range exceeds [`MAX_RANGE_DAYS`]
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorbio_mcp::tools::args::{DateRangeArgs, DateSelection};
    ///
    /// let args = DateRangeArgs {
    ///     start_date: Some("2024-02-28".to_string()),
    ///     end_date: Some("2024-03-01".to_string()),
    ///     ..Default::default()
    /// };
    /// let dates = args.resolve(chrono_tz::UTC).unwrap().into_dates();
    /// assert_eq!(dates.len(), 3);
    /// ```
    pub fn resolve(&self, tz: Tz) -> Result<DateSelection> {
        if let Some(raw) = non_blank(self.date.as_deref()) {
            return Ok(DateSelection::Single(parse_date("date", raw)?));
        }

        if let Some(days) = self.days {
            if days < 1 {
                return Err(SensrError::InvalidArguments(format!(
                    "days must be >= 1, got {}",
                    days
                ))
                .into());
            }
            if days > MAX_RANGE_DAYS {
                return Err(range_too_long(days));
            }
            let end = today_in(tz);
            let start = end - chrono::Duration::days(days - 1);
            return Ok(DateSelection::Range(expand(start, end)));
        }

        let start = non_blank(self.start_date.as_deref());
        let end = non_blank(self.end_date.as_deref());
        match (start, end) {
            (None, None) => Ok(DateSelection::Single(today_in(tz))),
            (Some(start), Some(end)) => {
                let start = parse_date("start_date", start)?;
                let end = parse_date("end_date", end)?;
                if end < start {
                    return Err(SensrError::InvalidArguments(format!(
                        "end_date {} must not be before start_date {}",
                        end, start
                    ))
                    .into());
                }
                let span = (end - start).num_days() + 1;
                if span > MAX_RANGE_DAYS {
                    return Err(range_too_long(span));
                }
                Ok(DateSelection::Range(expand(start, end)))
            }
            _ => Err(SensrError::InvalidArguments(
                "start_date and end_date must be provided together".to_string(),
            )
            .into()),
        }
    }
}

fn range_too_long(days: i64) -> anyhow::Error {
    SensrError::InvalidArguments(format!(
        "date range of {} days exceeds the limit of {}",
        days, MAX_RANGE_DAYS
    ))
    .into()
}

fn expand(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = Some(start);
    while let Some(day) = current.filter(|day| *day <= end) {
        dates.push(day);
        current = day.succ_opt();
    }
    dates
}

/// `{dates, days, start_date, end_date}` describing a run of days
pub fn range_summary(dates: &[NaiveDate]) -> Value {
    json!({
        "dates": dates.iter().map(|d| format_date(*d)).collect::<Vec<_>>(),
        "days": dates.len(),
        "start_date": dates.iter().min().map(|d| format_date(*d)),
        "end_date": dates.iter().max().map(|d| format_date(*d)),
    })
}

/// `YYYY-MM-DD` rendering used on the wire
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Aggregation window accepted by the calorie endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One day
    #[default]
    Day,
    /// One week
    Week,
    /// One month
    Month,
    /// One year
    Year,
}

impl Granularity {
    /// Wire name of the granularity
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = SensrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(SensrError::InvalidArguments(format!(
                "Invalid granularity '{}'; must be one of: day|week|month|year",
                other
            ))),
        }
    }
}

/// Appends `(key, value)` to a query list
pub fn push_param(query: &mut Vec<(String, String)>, key: &str, value: impl ToString) {
    query.push((key.to_string(), value.to_string()));
}
