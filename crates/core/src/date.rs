use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOrder {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

/// One of the recognized date layouts a bank export can use: a field order
/// plus a separator. The caller selects the layout of its source data; the
/// normalizer never guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormat {
    pub order: FieldOrder,
    pub separator: char,
}

const SEPARATORS: [char; 3] = ['/', '-', '.'];

impl DateFormat {
    pub fn new(order: FieldOrder, separator: char) -> Self {
        DateFormat { order, separator }
    }

    /// Renders a canonical date back into this layout, e.g. "31/01/2024".
    pub fn format(&self, date: NaiveDate) -> String {
        let s = self.separator;
        match self.order {
            FieldOrder::DayMonthYear => {
                format!("{:02}{s}{:02}{s}{:04}", date.day(), date.month(), date.year())
            }
            FieldOrder::MonthDayYear => {
                format!("{:02}{s}{:02}{s}{:04}", date.month(), date.day(), date.year())
            }
            FieldOrder::YearMonthDay => {
                format!("{:04}{s}{:02}{s}{:02}", date.year(), date.month(), date.day())
            }
        }
    }

    /// Anchored pattern with named groups for year, month and day.
    /// Two-digit day and month, four-digit year; nothing else matches.
    fn to_regex(&self) -> Regex {
        let sep = regex::escape(&self.separator.to_string());
        let pattern = match self.order {
            FieldOrder::DayMonthYear => {
                format!(r"^(?P<day>\d{{2}}){sep}(?P<month>\d{{2}}){sep}(?P<year>\d{{4}})$")
            }
            FieldOrder::MonthDayYear => {
                format!(r"^(?P<month>\d{{2}}){sep}(?P<day>\d{{2}}){sep}(?P<year>\d{{4}})$")
            }
            FieldOrder::YearMonthDay => {
                format!(r"^(?P<year>\d{{4}}){sep}(?P<month>\d{{2}}){sep}(?P<day>\d{{2}})$")
            }
        };
        Regex::new(&pattern).expect("date layout patterns are statically valid")
    }
}

impl FromStr for DateFormat {
    type Err = String;

    /// Parses layout tokens such as "DD/MM/YYYY", "MM-DD-YYYY" or "YYYY.MM.DD".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for sep in SEPARATORS {
            let parts: Vec<&str> = s.split(sep).collect();
            if parts.len() != 3 {
                continue;
            }
            let order = match (parts[0], parts[1], parts[2]) {
                ("DD", "MM", "YYYY") => FieldOrder::DayMonthYear,
                ("MM", "DD", "YYYY") => FieldOrder::MonthDayYear,
                ("YYYY", "MM", "DD") => FieldOrder::YearMonthDay,
                _ => continue,
            };
            return Ok(DateFormat { order, separator: sep });
        }
        Err(format!("Unknown date format: '{s}'"))
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b, c) = match self.order {
            FieldOrder::DayMonthYear => ("DD", "MM", "YYYY"),
            FieldOrder::MonthDayYear => ("MM", "DD", "YYYY"),
            FieldOrder::YearMonthDay => ("YYYY", "MM", "DD"),
        };
        let s = self.separator;
        write!(f, "{a}{s}{b}{s}{c}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Date \"{input}\" does not respect the \"{format}\" date format. Please double-check the date format field.")]
    FormatMismatch { input: String, format: DateFormat },
    #[error("Could not parse date \"{input}\". It does not seem to be a valid calendar date.")]
    InvalidCalendarDate { input: String },
}

/// Parse a date string against an explicitly selected layout.
///
/// A structural mismatch and an impossible calendar date are distinct
/// failures; neither is ever coerced (Feb 30 does not become March 2).
pub fn normalize_date(text: &str, format: DateFormat) -> Result<NaiveDate, DateError> {
    let trimmed = text.trim();
    let caps = format
        .to_regex()
        .captures(trimmed)
        .ok_or_else(|| DateError::FormatMismatch {
            input: text.to_string(),
            format,
        })?;

    // The pattern only admits ASCII digits, so these parses cannot fail.
    let year: i32 = caps["year"].parse().unwrap_or(0);
    let month: u32 = caps["month"].parse().unwrap_or(0);
    let day: u32 = caps["day"].parse().unwrap_or(0);

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::InvalidCalendarDate {
        input: text.to_string(),
    })
}
