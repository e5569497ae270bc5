//! Calculation primitives for the income evaluation engine.
//!
//! This module contains monetary rounding, year-to-date pacing and the
//! trend classifier used for variable income. Rulesets compose these into
//! calculation lines.

mod money;
mod trend;

pub use money::{
    MONTHS_PER_YEAR, WEEKS_PER_YEAR, YtdPace, annual_to_monthly, months_elapsed, round_money,
    ytd_pace,
};
pub use trend::{DEFAULT_TREND_EPSILON, PriorYears, TrendAssessment, classify_trend};
