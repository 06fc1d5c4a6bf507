//! Field normalizers.
//!
//! Pure functions converting free-form CSV text into canonical typed values:
//! - [`date`]: calendar dates in six literal patterns, day-first preferred
//! - [`currency`]: money strings into integer minor units (cents)

pub mod currency;
pub mod date;

pub use currency::{parse_cost_minor_units, CURRENCY_SYMBOLS};
pub use date::{parse_date, DateFormat};
