//! Validated evidence models.
//!
//! These types are only ever produced by the schema validator, so every
//! instance already satisfies the bundle invariants: at least one employment
//! and paystub, non-negative figures, and employment references that resolve.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ComponentAmounts;

/// Loan programs supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanProgram {
    /// FHA-insured mortgage.
    Fha,
}

impl LoanProgram {
    /// Returns the wire name of the program.
    pub fn as_str(self) -> &'static str {
        match self {
            LoanProgram::Fha => "FHA",
        }
    }

    /// Parses a wire name into a program.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FHA" => Some(LoanProgram::Fha),
            _ => None,
        }
    }
}

/// How base pay is expressed for an employment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasePayType {
    /// `base_rate` is an annual salary.
    Salary,
    /// `base_rate` is an hourly wage.
    Hourly,
}

/// How often the employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayFrequency {
    /// 52 pay periods per year.
    Weekly,
    /// 26 pay periods per year.
    Biweekly,
    /// 24 pay periods per year.
    Semimonthly,
    /// 12 pay periods per year.
    Monthly,
}

/// The kind of verification-of-employment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoeKind {
    /// Verbal confirmation from the employer.
    Verbal,
    /// Written verification form completed by the employer.
    Written,
}

/// A single employment held by the borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employment {
    /// Identifier referenced by paystubs, W2s, VOEs and gaps.
    pub id: String,
    /// Name of the employer.
    pub employer_name: String,
    /// Whether this is a current employment.
    pub is_current: bool,
    /// First day of employment, if known.
    #[serde(rename = "startDateISO", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day of employment, if it has ended.
    #[serde(rename = "endDateISO", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Whether the base rate is a salary or an hourly wage.
    pub base_pay_type: BasePayType,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// Annual salary or hourly wage, depending on `base_pay_type`.
    pub base_rate: Decimal,
    /// Scheduled weekly hours for hourly employees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_hours_per_week: Option<Decimal>,
    /// Whether weekly hours vary from period to period.
    pub hours_fluctuate: bool,
    /// Whether the employee received a recent raise.
    pub recent_raise: bool,
    /// Whether the employee took a recent pay cut.
    pub recent_pay_cut: bool,
}

impl Employment {
    /// Returns the scheduled weekly hours when base pay can be projected from
    /// a fixed schedule.
    ///
    /// Hourly employees whose hours fluctuate, or whose hours are unknown,
    /// return `None` and are treated as variable income.
    pub fn stable_weekly_hours(&self) -> Option<Decimal> {
        if self.base_pay_type != BasePayType::Hourly || self.hours_fluctuate {
            return None;
        }
        self.expected_hours_per_week.filter(|h| *h > Decimal::ZERO)
    }
}

/// Year-to-date pay evidence from a single paystub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaystubSnapshot {
    /// The employment this paystub belongs to.
    pub employment_id: String,
    /// The date the YTD figures are current as of.
    #[serde(rename = "asOfDateISO")]
    pub as_of_date: NaiveDate,
    /// The last day of the pay period, if shown.
    #[serde(rename = "payPeriodEndDateISO", skip_serializing_if = "Option::is_none")]
    pub pay_period_end_date: Option<NaiveDate>,
    /// Number of pay periods elapsed this year, if shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_periods_ytd: Option<u32>,
    /// Year-to-date amounts by component.
    pub ytd_by_component: ComponentAmounts,
    /// Current-period amounts by component, if shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_by_component: Option<ComponentAmounts>,
    /// Gross year-to-date pay, used when the base line is not broken out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_ytd: Option<Decimal>,
}

/// Annual W-2 earnings for one employment and calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W2Year {
    /// The employment this W-2 belongs to.
    pub employment_id: String,
    /// The calendar year of the W-2.
    pub year: i32,
    /// Annual amounts by component.
    pub amounts_by_component: ComponentAmounts,
    /// Total wages reported, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// A verification-of-employment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoeRecord {
    /// The employment that was verified.
    pub employment_id: String,
    /// Verbal or written.
    pub kind: VoeKind,
    /// When the verification took place.
    #[serde(rename = "dateISO", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Whether the employer confirmed the employment is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_active: Option<bool>,
}

/// A gap in the borrower's employment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapEvent {
    /// The employment the gap follows.
    pub employment_id: String,
    /// First day of the gap.
    #[serde(rename = "startDateISO")]
    pub start_date: NaiveDate,
    /// Last day of the gap, if it has ended.
    #[serde(rename = "endDateISO", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Whether the borrower has explained the gap. Absent means no.
    pub explanation_provided: bool,
}

/// The complete, validated evidence for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    /// The loan program being underwritten.
    pub program: LoanProgram,
    /// Opaque borrower reference.
    pub borrower_ref: String,
    /// Employments in input order.
    pub employments: Vec<Employment>,
    /// Paystub snapshots across all employments.
    pub paystubs: Vec<PaystubSnapshot>,
    /// Prior-year W-2 figures.
    pub w2s: Vec<W2Year>,
    /// Verification-of-employment records.
    pub voes: Vec<VoeRecord>,
    /// Employment gaps.
    pub gaps: Vec<GapEvent>,
    /// The date the evaluation is performed for.
    #[serde(rename = "evaluationDateISO")]
    pub evaluation_date: NaiveDate,
}

impl EvidenceBundle {
    /// Returns the paystub with the latest as-of date for an employment.
    ///
    /// Ties keep the first snapshot in input order.
    pub fn latest_paystub(&self, employment_id: &str) -> Option<&PaystubSnapshot> {
        self.paystubs
            .iter()
            .filter(|p| p.employment_id == employment_id)
            .fold(None, |latest: Option<&PaystubSnapshot>, p| match latest {
                Some(current) if current.as_of_date >= p.as_of_date => Some(current),
                _ => Some(p),
            })
    }

    /// Returns the W-2 years for an employment, most recent first.
    pub fn w2s_for(&self, employment_id: &str) -> Vec<&W2Year> {
        let mut years: Vec<&W2Year> = self
            .w2s
            .iter()
            .filter(|w| w.employment_id == employment_id)
            .collect();
        years.sort_by(|a, b| b.year.cmp(&a.year));
        years
    }

    /// Returns true if any employment gap lacks an explanation.
    pub fn has_unexplained_gap(&self) -> bool {
        self.gaps.iter().any(|g| !g.explanation_provided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeComponentType;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hourly_employment(hours: Option<&str>, fluctuate: bool) -> Employment {
        Employment {
            id: "emp_1".to_string(),
            employer_name: "Acme Logistics".to_string(),
            is_current: true,
            start_date: None,
            end_date: None,
            base_pay_type: BasePayType::Hourly,
            pay_frequency: PayFrequency::Biweekly,
            base_rate: dec("25"),
            expected_hours_per_week: hours.map(dec),
            hours_fluctuate: fluctuate,
            recent_raise: false,
            recent_pay_cut: false,
        }
    }

    fn paystub(employment_id: &str, as_of: NaiveDate, base: &str) -> PaystubSnapshot {
        let mut ytd = ComponentAmounts::new();
        ytd.set(IncomeComponentType::Base, dec(base));
        PaystubSnapshot {
            employment_id: employment_id.to_string(),
            as_of_date: as_of,
            pay_period_end_date: None,
            pay_periods_ytd: None,
            ytd_by_component: ytd,
            current_period_by_component: None,
            gross_ytd: None,
        }
    }

    fn w2(employment_id: &str, year: i32) -> W2Year {
        W2Year {
            employment_id: employment_id.to_string(),
            year,
            amounts_by_component: ComponentAmounts::new(),
            total: None,
        }
    }

    fn bundle() -> EvidenceBundle {
        EvidenceBundle {
            program: LoanProgram::Fha,
            borrower_ref: "borrower-1".to_string(),
            employments: vec![hourly_employment(Some("40"), false)],
            paystubs: vec![
                paystub("emp_1", date(2025, 5, 31), "20000"),
                paystub("emp_1", date(2025, 6, 30), "24000"),
                paystub("emp_1", date(2025, 4, 30), "16000"),
            ],
            w2s: vec![w2("emp_1", 2023), w2("emp_1", 2024), w2("emp_2", 2024)],
            voes: vec![],
            gaps: vec![],
            evaluation_date: date(2025, 7, 10),
        }
    }

    #[test]
    fn test_stable_weekly_hours_for_fixed_schedule() {
        let employment = hourly_employment(Some("40"), false);
        assert_eq!(employment.stable_weekly_hours(), Some(dec("40")));
    }

    #[test]
    fn test_fluctuating_hours_are_not_stable() {
        let employment = hourly_employment(Some("40"), true);
        assert_eq!(employment.stable_weekly_hours(), None);
    }

    #[test]
    fn test_missing_or_zero_hours_are_not_stable() {
        assert_eq!(hourly_employment(None, false).stable_weekly_hours(), None);
        assert_eq!(hourly_employment(Some("0"), false).stable_weekly_hours(), None);
    }

    #[test]
    fn test_latest_paystub_picks_max_as_of_date() {
        let bundle = bundle();
        let latest = bundle.latest_paystub("emp_1").unwrap();
        assert_eq!(latest.as_of_date, date(2025, 6, 30));
        assert!(bundle.latest_paystub("emp_2").is_none());
    }

    #[test]
    fn test_w2s_sorted_most_recent_first() {
        let bundle = bundle();
        let years: Vec<i32> = bundle.w2s_for("emp_1").iter().map(|w| w.year).collect();
        assert_eq!(years, vec![2024, 2023]);
    }

    #[test]
    fn test_employment_serializes_with_wire_names() {
        let json = serde_json::to_value(hourly_employment(Some("40"), false)).unwrap();
        assert_eq!(json["basePayType"], "HOURLY");
        assert_eq!(json["payFrequency"], "BIWEEKLY");
        assert_eq!(json["expectedHoursPerWeek"], "40");
        assert!(json.get("startDateISO").is_none());
    }
}
