//! Currency normalizer.
//!
//! Two real sources feed the cost column: people typing amounts into a
//! spreadsheet (`643.36`) and programmatic exports that already store cents
//! (`64336`). Hence the asymmetry:
//!
//! - text with a decimal point is major units, multiplied by 100
//! - a bare integer is already minor units and kept as is
//!
//! Arithmetic is done on the decimal digits, never through floating point.

use crate::error::{NormalizeError, NormalizeResult};

/// Symbols stripped from either end of an amount.
pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '₽', '£', '¥'];

fn invalid(value: &str, message: &'static str) -> NormalizeError {
    NormalizeError::InvalidCurrencyFormat {
        value: value.to_string(),
        message,
    }
}

/// Parse a money string into minor currency units.
///
/// Decimal amounts round to the nearest cent, halves away from zero
/// (`"0.125"` -> `13`).
///
/// # Example
/// ```ignore
/// use repairlog::normalize::parse_cost_minor_units;
///
/// assert_eq!(parse_cost_minor_units("643.36").unwrap(), 64336);
/// assert_eq!(parse_cost_minor_units("25000").unwrap(), 25000);
/// assert!(parse_cost_minor_units("-5").is_err());
/// ```
pub fn parse_cost_minor_units(text: &str) -> NormalizeResult<u64> {
    let original = text.trim();
    let amount = original.trim_matches(|c: char| c.is_whitespace() || CURRENCY_SYMBOLS.contains(&c));

    if amount.is_empty() {
        return Err(invalid(original, "no amount given"));
    }
    if amount.starts_with('-') {
        return Err(invalid(original, "negative amounts are not allowed"));
    }

    match amount.split_once('.') {
        Some((major, minor)) => parse_major_units(original, major, minor),
        None => {
            if !is_digits(amount) {
                return Err(invalid(original, "expected a number such as 643.36 or 64336"));
            }
            amount
                .parse::<u64>()
                .map_err(|_| invalid(original, "amount is too large"))
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_major_units(original: &str, major: &str, minor: &str) -> NormalizeResult<u64> {
    let well_formed = (major.is_empty() || is_digits(major))
        && (minor.is_empty() || is_digits(minor))
        && !(major.is_empty() && minor.is_empty());
    if !well_formed {
        return Err(invalid(original, "expected a number such as 643.36 or 64336"));
    }

    let major_units: u64 = if major.is_empty() {
        0
    } else {
        major
            .parse()
            .map_err(|_| invalid(original, "amount is too large"))?
    };

    let digits: Vec<u64> = minor.bytes().map(|b| u64::from(b - b'0')).collect();
    let tens = digits.first().copied().unwrap_or(0);
    let ones = digits.get(1).copied().unwrap_or(0);
    let round_up = digits.get(2).is_some_and(|&d| d >= 5);

    major_units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(tens * 10 + ones + u64::from(round_up)))
        .ok_or_else(|| invalid(original, "amount is too large"))
}
