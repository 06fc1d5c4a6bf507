//! Date normalizer.
//!
//! Accepts the literal patterns below, tried in this fixed order:
//!
//! | # | Pattern      | Example      |
//! |---|--------------|--------------|
//! | 1 | `YYYY-MM-DD` | `2024-01-15` |
//! | 2 | `DD.MM.YYYY` | `15.01.2024` |
//! | 3 | `DD/MM/YYYY` | `15/01/2024` |
//! | 4 | `DD-MM-YYYY` | `15-01-2024` |
//! | 5 | `MM/DD/YYYY` | `01/15/2024` |
//! | 6 | `YYYY.MM.DD` | `2024.01.15` |
//!
//! `DD/MM/YYYY` precedes `MM/DD/YYYY`, so `03/05/2024` is the 3rd of May.
//! The US reading is only reached when the day-first reading is not a real
//! date (`12/31/2024`). Do not make this locale-aware: existing files rely on
//! the order.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{NormalizeError, NormalizeResult};

/// Which capture group holds which date part.
#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    Ymd,
    Dmy,
    Mdy,
}

/// A supported date pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    IsoDash,
    /// `DD.MM.YYYY`
    DayMonthDot,
    /// `DD/MM/YYYY`
    DayMonthSlash,
    /// `DD-MM-YYYY`
    DayMonthDash,
    /// `MM/DD/YYYY`
    MonthDaySlash,
    /// `YYYY.MM.DD`
    YearMonthDot,
}

struct CompiledPattern {
    format: DateFormat,
    regex: Regex,
    order: FieldOrder,
}

static PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    DateFormat::ALL
        .iter()
        .map(|&format| {
            let (source, order) = match format {
                DateFormat::IsoDash => (r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$", FieldOrder::Ymd),
                DateFormat::DayMonthDot => (r"^([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{4})$", FieldOrder::Dmy),
                DateFormat::DayMonthSlash => (r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$", FieldOrder::Dmy),
                DateFormat::DayMonthDash => (r"^([0-9]{1,2})-([0-9]{1,2})-([0-9]{4})$", FieldOrder::Dmy),
                DateFormat::MonthDaySlash => (r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$", FieldOrder::Mdy),
                DateFormat::YearMonthDot => (r"^([0-9]{4})\.([0-9]{1,2})\.([0-9]{1,2})$", FieldOrder::Ymd),
            };
            CompiledPattern {
                format,
                regex: Regex::new(source).expect("Invalid built-in date pattern"),
                order,
            }
        })
        .collect()
});

impl DateFormat {
    /// Every pattern, in attempt order.
    pub const ALL: [DateFormat; 6] = [
        DateFormat::IsoDash,
        DateFormat::DayMonthDot,
        DateFormat::DayMonthSlash,
        DateFormat::DayMonthDash,
        DateFormat::MonthDaySlash,
        DateFormat::YearMonthDot,
    ];

    /// Human-readable pattern, as shown in templates and error messages.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::IsoDash => "YYYY-MM-DD",
            Self::DayMonthDot => "DD.MM.YYYY",
            Self::DayMonthSlash => "DD/MM/YYYY",
            Self::DayMonthDash => "DD-MM-YYYY",
            Self::MonthDaySlash => "MM/DD/YYYY",
            Self::YearMonthDot => "YYYY.MM.DD",
        }
    }

    fn strftime(&self) -> &'static str {
        match self {
            Self::IsoDash => "%Y-%m-%d",
            Self::DayMonthDot => "%d.%m.%Y",
            Self::DayMonthSlash => "%d/%m/%Y",
            Self::DayMonthDash => "%d-%m-%Y",
            Self::MonthDaySlash => "%m/%d/%Y",
            Self::YearMonthDot => "%Y.%m.%d",
        }
    }

    /// Render a date in this pattern (zero-padded).
    pub fn format(&self, date: NaiveDate) -> String {
        date.format(self.strftime()).to_string()
    }
}

/// Parse free-form date text.
///
/// Returns the first pattern (in [`DateFormat::ALL`] order) that both
/// matches and yields a real calendar date.
///
/// # Example
/// ```ignore
/// use repairlog::normalize::parse_date;
///
/// assert_eq!(parse_date("15.01.2024").unwrap().to_string(), "2024-01-15");
/// assert!(parse_date("31/02/2024").is_err());
/// ```
pub fn parse_date(text: &str) -> NormalizeResult<NaiveDate> {
    parse_date_with_format(text)
        .map(|(date, _)| date)
        .ok_or_else(|| NormalizeError::InvalidDateFormat(text.trim().to_string()))
}

/// Like [`parse_date`], also reporting which pattern won.
pub fn parse_date_with_format(text: &str) -> Option<(NaiveDate, DateFormat)> {
    let text = text.trim();

    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(text)?;
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let c: u32 = caps[3].parse().ok()?;

        let (year, month, day) = match pattern.order {
            FieldOrder::Ymd => (a, b, c),
            FieldOrder::Dmy => (c, b, a),
            FieldOrder::Mdy => (c, a, b),
        };
        if year == 0 {
            return None;
        }

        let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
        Some((date, pattern.format))
    })
}
