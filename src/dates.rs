//! Date handling shared by the restructuring and emitter stages.
//!
//! Two independent pieces live here:
//!
//! 1. [`parse_partial_date`] — the external partial-date-parser collaborator
//!    declared in the specification (§6). It is treated as a black box by
//!    the rest of the pipeline: it normalises `YYYY`, `YYYY-MM`,
//!    `YYYY-MM-DD`, `Mon YYYY` and `DD/MM/YYYY` into a [`PartialDate`].
//! 2. Relative date specifier resolution (`today`, `yesterday`, `this
//!    month`, `last month`, each optionally followed by `- N`), and the
//!    small set of date-math helpers (next date, ES rounding anchor) used
//!    by the emitter to expand a single date value into a range query.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// The granularity at which a [`PartialDate`] is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Year,
    Month,
    Day,
}

/// A year, optionally refined to a month, optionally refined further to a
/// day. Mirrors `inspire_utils.date.PartialDate` from the original parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn from_parts(year: i32, month: Option<u32>, day: Option<u32>) -> Self {
        PartialDate { year, month, day }
    }

    pub fn granularity(&self) -> Granularity {
        if self.day.is_some() {
            Granularity::Day
        } else if self.month.is_some() {
            Granularity::Month
        } else {
            Granularity::Year
        }
    }

    /// Serialises to the ISO-8601 prefix matching this date's granularity,
    /// e.g. `"2015"`, `"2015-03"`, `"2015-03-07"`.
    pub fn dumps(&self) -> String {
        match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => format!("{:04}-{:02}", self.year, m),
            _ => format!("{:04}", self.year),
        }
    }

    /// The ElasticSearch date-math rounding anchor for this granularity.
    pub fn es_rounding_anchor(&self) -> &'static str {
        match self.granularity() {
            Granularity::Year => "||/y",
            Granularity::Month => "||/M",
            Granularity::Day => "||/d",
        }
    }

    /// The next date at this date's own granularity, e.g. 2015 -> 2016,
    /// 2015-03 -> 2015-04, 2015-03-07 -> 2015-03-08.
    pub fn next(&self) -> PartialDate {
        let as_of = NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
            .expect("constructed from already-validated parts");

        let advanced = match self.granularity() {
            Granularity::Year => as_of
                .with_year(as_of.year() + 1)
                .unwrap_or(as_of + Duration::days(365)),
            Granularity::Month => add_one_month(as_of),
            Granularity::Day => as_of + Duration::days(1),
        };

        PartialDate {
            year: advanced.year(),
            month: self.month.map(|_| advanced.month()),
            day: self.day.map(|_| advanced.day()),
        }
    }
}

fn add_one_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Clamp the day if the target month is shorter (e.g. Jan 31 -> Feb 28).
    let mut day = date.day();
    loop {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return d;
        }
        day -= 1;
    }
}

/// Error returned by [`parse_partial_date`] on malformed input.
#[derive(Debug, Clone, PartialEq)]
pub struct DateParseError(pub String);

impl std::fmt::Display for DateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not parse date: {}", self.0)
    }
}

impl std::error::Error for DateParseError {}

static MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1), ("jan", 1),
    ("february", 2), ("feb", 2),
    ("march", 3), ("mar", 3),
    ("april", 4), ("apr", 4),
    ("may", 5),
    ("june", 6), ("jun", 6),
    ("july", 7), ("jul", 7),
    ("august", 8), ("aug", 8),
    ("september", 9), ("sep", 9),
    ("october", 10), ("oct", 10),
    ("november", 11), ("nov", 11),
    ("december", 12), ("dec", 12),
];

static ISO_FULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());
static ISO_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").unwrap());
static ISO_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").unwrap());
static SLASH_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([A-Za-z]+)\.?\s+(\d{4})$").unwrap());

/// Parses a partial date string into a [`PartialDate`].
///
/// This is the external collaborator declared in the specification (§6):
/// it supports `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `Mon YYYY` and
/// `DD/MM/YYYY`, and is treated as a black box by the rest of the
/// pipeline — any other shape is a [`DateParseError`].
pub fn parse_partial_date(text: &str) -> Result<PartialDate, DateParseError> {
    let text = text.trim();

    if let Some(caps) = ISO_FULL.captures(text) {
        let year: i32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let day: u32 = caps[3].parse().unwrap();
        return validate(year, Some(month), Some(day), text);
    }
    if let Some(caps) = SLASH_DATE.captures(text) {
        let day: u32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let year: i32 = caps[3].parse().unwrap();
        return validate(year, Some(month), Some(day), text);
    }
    if let Some(caps) = ISO_MONTH.captures(text) {
        let year: i32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        return validate(year, Some(month), None, text);
    }
    if let Some(caps) = MONTH_YEAR.captures(text) {
        let name = caps[1].to_lowercase();
        let month = MONTH_NAMES.iter().find(|(n, _)| *n == name).map(|(_, m)| *m);
        let year: i32 = caps[2].parse().unwrap();
        return match month {
            Some(m) => validate(year, Some(m), None, text),
            None => Err(DateParseError(text.to_string())),
        };
    }
    if let Some(caps) = ISO_YEAR.captures(text) {
        let year: i32 = caps[1].parse().unwrap();
        return validate(year, None, None, text);
    }

    Err(DateParseError(text.to_string()))
}

fn validate(year: i32, month: Option<u32>, day: Option<u32>, original: &str) -> Result<PartialDate, DateParseError> {
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(DateParseError(original.to_string()));
        }
    }
    if let (Some(m), Some(d)) = (month, day) {
        if NaiveDate::from_ymd_opt(year, m, d).is_none() {
            return Err(DateParseError(original.to_string()));
        }
    }
    Ok(PartialDate::from_parts(year, month, day))
}

/// Regex recognising the four relative date specifiers, each optionally
/// followed by `- N` (arithmetic offset), per specification §3/§4.2.
static DATE_SPECIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(today|yesterday|this\s+month|last\s+month)\s*(?:-\s*(\d+))?$").unwrap()
});

/// Resolves a relative date specifier (`today`, `yesterday`, `this month`,
/// `last month`, optionally suffixed with `- N`) to an absolute ISO-8601
/// date string, using `today` as the reference point.
///
/// Returns `None` if `text` does not match any date specifier, signalling
/// to the caller that it should be treated as an ordinary value instead.
///
/// Per the specification's documented open question, `yesterday - N`
/// subtracts `1 + N` days while `last month - N` subtracts `1 + N` months;
/// this mirrors a latent inconsistency in the original implementation that
/// test fixtures depend on, and is intentionally preserved rather than
/// "fixed".
pub fn resolve_relative_date_specifier(text: &str, today: NaiveDate) -> Option<String> {
    let caps = DATE_SPECIFIER.captures(text.trim())?;
    let specifier = caps[1].to_lowercase();
    let specifier = specifier.split_whitespace().collect::<Vec<_>>().join(" ");
    let offset: i64 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);

    let resolved = match specifier.as_str() {
        "today" => today - Duration::days(offset),
        "yesterday" => today - Duration::days(1 + offset),
        "this month" => subtract_months(today, offset as u32),
        "last month" => subtract_months(today, 1 + offset as u32),
        _ => return None,
    };

    Some(resolved.format("%Y-%m-%d").to_string())
}

fn subtract_months(date: NaiveDate, months: u32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 - months as i32;
    while month <= 0 {
        month += 12;
        year -= 1;
    }
    let month = month as u32;
    let mut day = date.day();
    loop {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return d;
        }
        day -= 1;
    }
}

/// Truncates a trailing-wildcard date value (e.g. `"2015-1*"`) by dropping
/// the wildcarded final component, so the remainder can be range-expanded
/// normally. Only `-` and ` ` separators are supported; a wildcard
/// anywhere but the last component, or in the year, is rejected.
pub fn truncate_wildcard_from_date(date_value: &str) -> Result<String, DateParseError> {
    let separator = if date_value.contains(' ') {
        ' '
    } else if date_value.contains('-') {
        '-'
    } else {
        return Err(DateParseError(date_value.to_string()));
    };

    let mut parts: Vec<&str> = date_value.split(separator).collect();
    if let Some(last) = parts.last() {
        if last.contains('*') {
            parts.pop();
        }
    }
    if parts.is_empty() {
        return Err(DateParseError(date_value.to_string()));
    }
    Ok(parts.join("-"))
}
