//! Configuration types for ruleset parameters.
//!
//! These structures are deserialized from YAML ruleset files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::DEFAULT_TREND_EPSILON;
use crate::models::LoanProgram;

/// Tunable thresholds for a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesetParams {
    /// Tolerance absorbing rounding when comparing trends.
    pub trend_epsilon: Decimal,
    /// Oldest acceptable paystub, in days before the evaluation date.
    pub max_paystub_age_days: i64,
    /// Fraction by which YTD base earnings may fall short of projected base
    /// pay before a variance flag is raised.
    pub ytd_variance_tolerance: Decimal,
    /// Number of prior W-2 years consulted for trending.
    pub max_prior_years: usize,
}

impl Default for RulesetParams {
    fn default() -> Self {
        Self {
            trend_epsilon: DEFAULT_TREND_EPSILON,
            max_paystub_age_days: 30,
            ytd_variance_tolerance: Decimal::new(10, 2),
            max_prior_years: 2,
        }
    }
}

/// A ruleset declaration from a YAML file.
///
/// `rules` names a built-in rule function; the parameters tune it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetConfig {
    /// Ruleset identifier, e.g. `fha-w2`.
    pub id: String,
    /// Ruleset version, e.g. `1.0.0`.
    pub version: String,
    /// The loan program this ruleset serves.
    pub program: LoanProgram,
    /// Name of the rule function implementing the ruleset.
    pub rules: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Thresholds.
    #[serde(default)]
    pub params: RulesetParams,
}
