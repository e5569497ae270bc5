//! Monetary rounding and year-to-date pacing.
//!
//! Every monetary output of the engine is rounded exactly once, to cents,
//! using half-up rounding.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Weeks per year used to annualize hourly pay.
pub const WEEKS_PER_YEAR: u32 = 52;

/// Months per year.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Rounds a monetary amount to cents, half-up.
///
/// # Examples
///
/// ```
/// use income_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("4333.335").unwrap()).to_string(), "4333.34");
/// assert_eq!(round_money(Decimal::from_str("7000").unwrap()).to_string(), "7000.00");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Number of calendar months elapsed in the year as of a date, counting the
/// as-of month itself (January = 1).
pub fn months_elapsed(as_of: NaiveDate) -> u32 {
    as_of.month()
}

/// The result of pacing a year-to-date amount into a monthly figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YtdPace {
    /// The monthly pace, rounded to cents.
    pub monthly: Decimal,
    /// The months elapsed used as the divisor.
    pub months_elapsed: u32,
}

/// Converts a year-to-date amount into a monthly pace.
///
/// # Examples
///
/// ```
/// use income_engine::calculation::ytd_pace;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let pace = ytd_pace(Decimal::from(30000), NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
/// assert_eq!(pace.monthly, Decimal::from(5000));
/// assert_eq!(pace.months_elapsed, 6);
/// ```
pub fn ytd_pace(ytd_amount: Decimal, as_of: NaiveDate) -> YtdPace {
    let months = months_elapsed(as_of);
    YtdPace {
        monthly: round_money(ytd_amount / Decimal::from(months)),
        months_elapsed: months,
    }
}

/// Monthly equivalent of an annual amount, unrounded.
pub fn annual_to_monthly(annual: Decimal) -> Decimal {
    annual / Decimal::from(MONTHS_PER_YEAR)
}
