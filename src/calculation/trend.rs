//! Trend classification for variable income.
//!
//! Compares a current monthly pace against one or two prior-year monthly
//! figures to decide how much of a variable component may be counted.

use rust_decimal::Decimal;

use crate::models::{Flag, FlagCode, Severity, TrendClassification};

use super::round_money;

/// Default tolerance absorbing cent-level rounding differences.
pub const DEFAULT_TREND_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Prior-year monthly equivalents, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorYears {
    /// Monthly equivalent of the most recent prior year.
    pub most_recent: Decimal,
    /// Monthly equivalent of the year before that, if available.
    pub previous: Option<Decimal>,
}

impl PriorYears {
    /// Builds prior years from a most-recent-first slice, using at most two.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_recent_first(monthly: &[Decimal]) -> Option<Self> {
        let (&most_recent, rest) = monthly.split_first()?;
        Some(Self {
            most_recent,
            previous: rest.first().copied(),
        })
    }

    /// Average of the available prior years.
    pub fn average(&self) -> Decimal {
        match self.previous {
            Some(previous) => (self.most_recent + previous) / Decimal::TWO,
            None => self.most_recent,
        }
    }

    /// Number of years available (one or two).
    pub fn count(&self) -> usize {
        if self.previous.is_some() { 2 } else { 1 }
    }
}

/// The outcome of classifying a trend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendAssessment {
    /// The classification.
    pub classification: TrendClassification,
    /// The monthly figure to count, rounded to cents.
    pub recommended_monthly: Decimal,
    /// The prior-year average, rounded to cents.
    pub prior_average: Decimal,
    /// A warning raised for declining income. Not yet tied to an employment
    /// or component.
    pub flag: Option<Flag>,
}

/// Classifies a current monthly pace against prior-year history.
///
/// Rules, in order:
/// 1. Current at or above the prior average (within `epsilon`): stable or
///    increasing, count the prior average.
/// 2. Current at or above the most recent prior year: declined then
///    stabilized, count the current figure.
/// 3. Otherwise declining: count the current figure and raise a warning.
///
/// # Examples
///
/// ```
/// use income_engine::calculation::{classify_trend, PriorYears, DEFAULT_TREND_EPSILON};
/// use income_engine::models::TrendClassification;
/// use rust_decimal::Decimal;
///
/// let priors = PriorYears { most_recent: Decimal::from(5200), previous: Some(Decimal::from(5000)) };
/// let assessment = classify_trend(Decimal::from(5150), &priors, DEFAULT_TREND_EPSILON);
///
/// assert_eq!(assessment.classification, TrendClassification::StableOrIncreasing);
/// assert_eq!(assessment.recommended_monthly, Decimal::from(5100));
/// ```
pub fn classify_trend(current: Decimal, priors: &PriorYears, epsilon: Decimal) -> TrendAssessment {
    let prior_average = priors.average();

    let (classification, recommended, flag) = if current >= prior_average - epsilon {
        (TrendClassification::StableOrIncreasing, prior_average, None)
    } else if current >= priors.most_recent - epsilon {
        (TrendClassification::DeclinedThenStabilized, current, None)
    } else {
        let flag = Flag::new(
            Severity::Warn,
            FlagCode::DecliningIncome,
            format!(
                "Current pace {} is below the most recent prior year {}; income is declining \
                 and must not be averaged. Manual underwriting analysis required.",
                round_money(current),
                round_money(priors.most_recent)
            ),
        );
        (TrendClassification::Declining, current, Some(flag))
    };

    TrendAssessment {
        classification,
        recommended_monthly: round_money(recommended),
        prior_average: round_money(prior_average),
        flag,
    }
}
