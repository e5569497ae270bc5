//! Decision output models.
//!
//! This module contains the [`DecisionPackage`] type and its associated
//! structures: calculation lines, flags, document requirements, per-employment
//! results and the audit block.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ComponentAmounts, IncomeComponentType, LoanProgram};

/// How serious a flag or requirement is.
///
/// Ordered so that `Stop` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Needs underwriter attention.
    Warn,
    /// The result cannot be used for qualification without manual review.
    Stop,
}

/// Stable identifiers for the flags the engine can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagCode {
    /// A variable component is declining and was not averaged.
    DecliningIncome,
    /// A variable component declined and then stabilized at the lower figure.
    DeclineStabilized,
    /// A variable component has no prior-year history to trend against.
    InsufficientHistory,
    /// Hourly base pay is being trended as variable income.
    BaseTrendedAsVariable,
    /// The YTD base figure was derived from gross YTD pay.
    BaseFromGrossYtd,
    /// A component is present but not counted by the ruleset.
    ComponentNotCounted,
    /// No paystub was supplied for an employment.
    MissingPaystub,
    /// The latest paystub is older than the ruleset allows.
    StalePaystub,
    /// The latest paystub is dated after the evaluation date.
    PaystubAfterEvaluationDate,
    /// YTD base earnings fall short of the projected base pay.
    BaseYtdVariance,
    /// The employee received a recent raise.
    RecentRaise,
    /// The employee took a recent pay cut.
    RecentPayCut,
    /// A past employment contributes no qualifying income.
    PastEmploymentExcluded,
    /// The borrower has more than one employment.
    MultipleEmployments,
    /// At least one employment gap has no explanation.
    UnexplainedGap,
}

/// An advisory or blocking observation about the evaluated income.
///
/// Flags never halt computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    /// How serious the flag is.
    pub severity: Severity,
    /// Stable machine-readable code.
    pub code: FlagCode,
    /// Human-readable explanation.
    pub message: String,
    /// The employment the flag concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_id: Option<String>,
    /// The component the flag concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<IncomeComponentType>,
}

impl Flag {
    /// Creates an unassociated flag.
    pub fn new(severity: Severity, code: FlagCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            employment_id: None,
            component: None,
        }
    }

    /// Associates the flag with an employment.
    pub fn for_employment(mut self, employment_id: impl Into<String>) -> Self {
        self.employment_id = Some(employment_id.into());
        self
    }

    /// Associates the flag with a component.
    pub fn for_component(mut self, component: IncomeComponentType) -> Self {
        self.component = Some(component);
        self
    }
}

/// Documents that can satisfy a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// A paystub showing year-to-date earnings.
    Paystub,
    /// A W-2 wage statement.
    W2,
    /// A verbal verification of employment.
    VerbalVoe,
    /// A written verification of employment.
    WrittenVoe,
    /// A letter explaining a gap in employment.
    GapLetter,
    /// A general letter of explanation.
    LetterOfExplanation,
}

/// A document checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Stable identifier, unique within a package.
    pub id: String,
    /// How serious the requirement is.
    pub severity: Severity,
    /// Short title for display.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// The employment the requirement concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_id: Option<String>,
    /// Documents that satisfy the requirement.
    pub accepted_documents: Vec<DocumentType>,
}

/// The computation method behind a calculation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    /// Annual salary divided by twelve.
    #[serde(rename = "SALARY_ANNUAL_DIV_12")]
    SalaryAnnualDiv12,
    /// Hourly rate times scheduled hours, annualized and divided by twelve.
    #[serde(rename = "HOURLY_STABLE_HOURS")]
    HourlyStableHours,
    /// Year-to-date amount divided by elapsed calendar months.
    #[serde(rename = "YTD_PACE")]
    YtdPace,
    /// Average of prior-year monthly figures.
    #[serde(rename = "TWO_YEAR_AVG")]
    TwoYearAvg,
    /// The lower current pace, used when income has declined.
    #[serde(rename = "CURRENT_LOWER")]
    CurrentLower,
}

/// Outcome of comparing current pace against prior-year history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendClassification {
    /// Current pace is at or above the prior average.
    StableOrIncreasing,
    /// Current pace is below the average but at or above the most recent year.
    DeclinedThenStabilized,
    /// Current pace is below the most recent year.
    Declining,
}

/// Which evidence a calculation line relied upon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceTrace {
    /// As-of date of the paystub used, if any.
    #[serde(rename = "paystubAsOfDateISO", skip_serializing_if = "Option::is_none")]
    pub paystub_as_of: Option<NaiveDate>,
    /// W-2 years consulted, most recent first.
    pub w2_years: Vec<i32>,
    /// Months elapsed used for a YTD pace, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_elapsed: Option<u32>,
    /// Trend classification applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendClassification>,
}

/// One audit entry per component per employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationLine {
    /// The employment the line belongs to.
    pub employment_id: String,
    /// The component computed.
    pub component: IncomeComponentType,
    /// Monthly amount, rounded to cents.
    pub monthly_amount: Decimal,
    /// How the amount was computed.
    pub method: CalculationMethod,
    /// Human-readable explanation of the arithmetic.
    pub note: String,
    /// Evidence relied upon.
    pub evidence: EvidenceTrace,
}

/// Evaluation output for a single employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentResult {
    /// The employment evaluated.
    pub employment_id: String,
    /// Employer name, copied for display.
    pub employer_name: String,
    /// Sum of calculation lines per component.
    pub monthly_by_component: ComponentAmounts,
    /// Sum of `monthly_by_component`.
    pub monthly_total: Decimal,
    /// Calculation lines in computation order.
    pub lines: Vec<CalculationLine>,
    /// Flags raised for this employment.
    pub flags: Vec<Flag>,
    /// Document requirements for this employment.
    pub requirements: Vec<Requirement>,
}

impl EmploymentResult {
    /// Builds a result from its lines and flags, summing lines per component.
    pub fn from_lines(
        employment_id: impl Into<String>,
        employer_name: impl Into<String>,
        lines: Vec<CalculationLine>,
        flags: Vec<Flag>,
    ) -> Self {
        let monthly_by_component: ComponentAmounts =
            lines.iter().map(|l| (l.component, l.monthly_amount)).collect();
        let monthly_total = monthly_by_component.total();
        Self {
            employment_id: employment_id.into(),
            employer_name: employer_name.into(),
            monthly_by_component,
            monthly_total,
            lines,
            flags,
            requirements: Vec::new(),
        }
    }
}

/// Audit metadata stamped onto every package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBlock {
    /// Lowercase hex digest of the canonical validated input.
    pub input_hash: String,
    /// Digest algorithm name.
    pub hash_algorithm: String,
    /// Canonicalization scheme name.
    pub canonicalization: String,
    /// Version of the engine that produced the package.
    pub engine_version: String,
}

/// The complete, auditable output of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPackage {
    /// Identifier of the ruleset applied.
    pub ruleset_id: String,
    /// Version of the ruleset applied.
    pub ruleset_version: String,
    /// The loan program evaluated.
    pub program: LoanProgram,
    /// The date the evaluation was performed for.
    #[serde(rename = "evaluationDateISO")]
    pub evaluation_date: NaiveDate,
    /// Grand total of monthly usable income.
    pub monthly_total_usable_income: Decimal,
    /// Monthly totals by component across all employments.
    pub monthly_totals_by_component: ComponentAmounts,
    /// Per-employment results, index-aligned with the input employments.
    pub employment_results: Vec<EmploymentResult>,
    /// Flags not tied to a single employment.
    pub global_flags: Vec<Flag>,
    /// Requirements not tied to a single employment.
    pub global_requirements: Vec<Requirement>,
    /// True when any flag has `stop` severity.
    pub requires_manual_review: bool,
    /// Audit metadata.
    pub audit: AuditBlock,
}

impl DecisionPackage {
    /// Iterates over every flag in the package, global flags first.
    pub fn all_flags(&self) -> impl Iterator<Item = &Flag> {
        self.global_flags
            .iter()
            .chain(self.employment_results.iter().flat_map(|r| r.flags.iter()))
    }

    /// Iterates over every requirement in the package, global first.
    pub fn all_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.global_requirements
            .iter()
            .chain(self.employment_results.iter().flat_map(|r| r.requirements.iter()))
    }
}
