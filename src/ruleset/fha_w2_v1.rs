//! FHA W-2 wage earner ruleset, version 1.
//!
//! Base pay is projected from the employment's rate when it is fixed
//! (salary, or hourly on a stable schedule) and paced from year-to-date
//! earnings when it is not. Overtime, bonus and commission are paced from
//! year-to-date earnings and trended against up to two prior W-2 years.

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::{
    PriorYears, WEEKS_PER_YEAR, annual_to_monthly, classify_trend, round_money, ytd_pace,
};
use crate::config::RulesetParams;
use crate::models::{
    BasePayType, CalculationLine, CalculationMethod, Employment, EmploymentResult, EvidenceBundle,
    EvidenceTrace, Flag, FlagCode, IncomeComponentType, PaystubSnapshot, Severity,
    TrendClassification, W2Year,
};

use super::RulesetOutput;

/// Name used to reference this rule function from ruleset files.
pub const RULES_NAME: &str = "fha_w2_v1";

/// Built-in ruleset id.
pub const RULESET_ID: &str = "fha-w2";

/// Built-in ruleset version.
pub const RULESET_VERSION: &str = "1.0.0";

/// Components this ruleset does not count toward qualifying income.
const UNCOUNTED: [IncomeComponentType; 3] = [
    IncomeComponentType::ShiftDiff,
    IncomeComponentType::Tips,
    IncomeComponentType::Other,
];

/// Evaluates every employment in the bundle.
pub fn evaluate(bundle: &EvidenceBundle, params: &RulesetParams) -> RulesetOutput {
    let employment_results = bundle
        .employments
        .iter()
        .map(|employment| evaluate_employment(bundle, employment, params))
        .collect();

    let mut global_flags = Vec::new();
    if bundle.employments.len() > 1 {
        global_flags.push(Flag::new(
            Severity::Info,
            FlagCode::MultipleEmployments,
            format!(
                "Borrower has {} employments; each must be verified separately.",
                bundle.employments.len()
            ),
        ));
    }

    let unexplained = bundle.gaps.iter().filter(|g| !g.explanation_provided).count();
    if unexplained > 0 {
        global_flags.push(Flag::new(
            Severity::Warn,
            FlagCode::UnexplainedGap,
            format!(
                "{} employment gap(s) have no explanation on file.",
                unexplained
            ),
        ));
    }

    RulesetOutput {
        employment_results,
        global_flags,
    }
}

/// Working state for one employment.
struct EmploymentEvaluation<'a> {
    employment: &'a Employment,
    paystub: Option<&'a PaystubSnapshot>,
    prior_w2s: Vec<&'a W2Year>,
    params: &'a RulesetParams,
    lines: Vec<CalculationLine>,
    flags: Vec<Flag>,
}

fn evaluate_employment(
    bundle: &EvidenceBundle,
    employment: &Employment,
    params: &RulesetParams,
) -> EmploymentResult {
    let paystub = bundle.latest_paystub(&employment.id);
    let reference_year = paystub
        .map(|p| p.as_of_date.year())
        .unwrap_or_else(|| bundle.evaluation_date.year());
    let prior_w2s: Vec<&W2Year> = bundle
        .w2s_for(&employment.id)
        .into_iter()
        .filter(|w| w.year < reference_year)
        .take(params.max_prior_years)
        .collect();

    let mut evaluation = EmploymentEvaluation {
        employment,
        paystub,
        prior_w2s,
        params,
        lines: Vec::new(),
        flags: Vec::new(),
    };

    if employment.is_current {
        evaluation.check_compensation_changes();
        evaluation.check_paystub(bundle);
        evaluation.compute_base();
        evaluation.compute_variable_components();
        evaluation.note_uncounted_components();
    } else {
        evaluation.flag(
            Severity::Info,
            FlagCode::PastEmploymentExcluded,
            None,
            format!(
                "{} is a past employment and contributes no qualifying income.",
                employment.employer_name
            ),
        );
    }

    let result = EmploymentResult::from_lines(
        employment.id.clone(),
        employment.employer_name.clone(),
        evaluation.lines,
        evaluation.flags,
    );
    debug!(
        employment_id = %result.employment_id,
        monthly_total = %result.monthly_total,
        lines = result.lines.len(),
        flags = result.flags.len(),
        "Employment evaluated"
    );
    result
}

impl<'a> EmploymentEvaluation<'a> {
    fn flag(
        &mut self,
        severity: Severity,
        code: FlagCode,
        component: Option<IncomeComponentType>,
        message: String,
    ) {
        let mut flag = Flag::new(severity, code, message).for_employment(self.employment.id.clone());
        if let Some(component) = component {
            flag = flag.for_component(component);
        }
        self.flags.push(flag);
    }

    fn push_line(
        &mut self,
        component: IncomeComponentType,
        monthly_amount: Decimal,
        method: CalculationMethod,
        note: String,
        evidence: EvidenceTrace,
    ) {
        debug!(
            employment_id = %self.employment.id,
            component = %component,
            method = ?method,
            monthly_amount = %monthly_amount,
            "Calculation line"
        );
        self.lines.push(CalculationLine {
            employment_id: self.employment.id.clone(),
            component,
            monthly_amount,
            method,
            note,
            evidence,
        });
    }

    fn paystub_trace(&self, months_elapsed: Option<u32>) -> EvidenceTrace {
        EvidenceTrace {
            paystub_as_of: self.paystub.map(|p| p.as_of_date),
            w2_years: Vec::new(),
            months_elapsed,
            trend: None,
        }
    }

    fn check_compensation_changes(&mut self) {
        if self.employment.recent_raise {
            self.flag(
                Severity::Info,
                FlagCode::RecentRaise,
                Some(IncomeComponentType::Base),
                "Recent raise reported; confirm the new rate with the employer.".to_string(),
            );
        }
        if self.employment.recent_pay_cut {
            self.flag(
                Severity::Warn,
                FlagCode::RecentPayCut,
                Some(IncomeComponentType::Base),
                "Recent pay cut reported; qualifying income must reflect the reduced rate."
                    .to_string(),
            );
        }
    }

    fn check_paystub(&mut self, bundle: &EvidenceBundle) {
        let Some(paystub) = self.paystub else {
            self.flag(
                Severity::Stop,
                FlagCode::MissingPaystub,
                None,
                format!(
                    "No paystub supplied for {}; year-to-date earnings cannot be verified.",
                    self.employment.employer_name
                ),
            );
            return;
        };

        let age_days = (bundle.evaluation_date - paystub.as_of_date).num_days();
        if age_days < 0 {
            self.flag(
                Severity::Warn,
                FlagCode::PaystubAfterEvaluationDate,
                None,
                format!(
                    "Latest paystub is dated {} which is after the evaluation date {}.",
                    paystub.as_of_date, bundle.evaluation_date
                ),
            );
        } else if age_days > self.params.max_paystub_age_days {
            self.flag(
                Severity::Warn,
                FlagCode::StalePaystub,
                None,
                format!(
                    "Latest paystub is {} days old; at most {} days are allowed.",
                    age_days, self.params.max_paystub_age_days
                ),
            );
        }
    }

    fn compute_base(&mut self) {
        let employment = self.employment;
        match (employment.base_pay_type, employment.stable_weekly_hours()) {
            (BasePayType::Salary, _) => {
                let monthly = round_money(annual_to_monthly(employment.base_rate));
                self.push_line(
                    IncomeComponentType::Base,
                    monthly,
                    CalculationMethod::SalaryAnnualDiv12,
                    format!("Annual salary {} / 12", employment.base_rate),
                    EvidenceTrace::default(),
                );
                self.check_base_variance(monthly);
            }
            (BasePayType::Hourly, Some(hours)) => {
                let annual = employment.base_rate * hours * Decimal::from(WEEKS_PER_YEAR);
                let monthly = round_money(annual_to_monthly(annual));
                self.push_line(
                    IncomeComponentType::Base,
                    monthly,
                    CalculationMethod::HourlyStableHours,
                    format!(
                        "Hourly rate {} x {} hours/week x {} weeks / 12",
                        employment.base_rate, hours, WEEKS_PER_YEAR
                    ),
                    EvidenceTrace::default(),
                );
                self.check_base_variance(monthly);
            }
            (BasePayType::Hourly, None) => self.compute_variable_base(),
        }
    }

    /// Paces fluctuating or unscheduled hourly base pay from year-to-date
    /// earnings.
    fn compute_variable_base(&mut self) {
        // A missing paystub has already raised a stop flag.
        let Some(paystub) = self.paystub else {
            return;
        };

        let ytd_base = match base_ytd(paystub) {
            Some(amount) => amount,
            None => {
                let derived = derived_base_from_gross(paystub);
                if paystub.gross_ytd.is_some() {
                    self.flag(
                        Severity::Info,
                        FlagCode::BaseFromGrossYtd,
                        Some(IncomeComponentType::Base),
                        format!(
                            "Paystub has no base line; base YTD {} derived from gross YTD less \
                             other components.",
                            derived
                        ),
                    );
                }
                derived
            }
        };

        let pace = ytd_pace(ytd_base, paystub.as_of_date);
        self.push_line(
            IncomeComponentType::Base,
            pace.monthly,
            CalculationMethod::YtdPace,
            format!(
                "YTD base {} / {} month(s) elapsed",
                ytd_base, pace.months_elapsed
            ),
            self.paystub_trace(Some(pace.months_elapsed)),
        );
        self.flag(
            Severity::Info,
            FlagCode::BaseTrendedAsVariable,
            Some(IncomeComponentType::Base),
            "Hourly base has no stable schedule and is trended as variable income; refine \
             with prior-year base figures when available."
                .to_string(),
        );
    }

    /// Warns when year-to-date base earnings run well below projected base.
    fn check_base_variance(&mut self, projected_monthly: Decimal) {
        let Some(paystub) = self.paystub else {
            return;
        };
        let Some(ytd_base) = base_ytd(paystub) else {
            return;
        };

        let months = months_worked_this_year(self.employment, paystub);
        let actual_monthly = round_money(ytd_base / Decimal::from(months));
        let floor = projected_monthly * (Decimal::ONE - self.params.ytd_variance_tolerance);
        if actual_monthly < floor {
            self.flag(
                Severity::Warn,
                FlagCode::BaseYtdVariance,
                Some(IncomeComponentType::Base),
                format!(
                    "YTD base pace {} over {} month(s) is below projected base {} by more than \
                     the {} tolerance.",
                    actual_monthly, months, projected_monthly, self.params.ytd_variance_tolerance
                ),
            );
        }
    }

    fn compute_variable_components(&mut self) {
        let Some(paystub) = self.paystub else {
            return;
        };

        for component in IncomeComponentType::VARIABLE {
            let ytd = paystub.ytd_by_component.get(component);
            if ytd <= Decimal::ZERO {
                continue;
            }
            let pace = ytd_pace(ytd, paystub.as_of_date);
            let priors: Vec<Decimal> = self
                .prior_w2s
                .iter()
                .map(|w| annual_to_monthly(w.amounts_by_component.get(component)))
                .collect();

            match PriorYears::from_recent_first(&priors) {
                None => {
                    self.push_line(
                        component,
                        pace.monthly,
                        CalculationMethod::YtdPace,
                        format!("YTD {} / {} month(s) elapsed", ytd, pace.months_elapsed),
                        self.paystub_trace(Some(pace.months_elapsed)),
                    );
                    self.flag(
                        Severity::Warn,
                        FlagCode::InsufficientHistory,
                        Some(component),
                        format!(
                            "No prior W-2 history for {}; the YTD pace cannot be trended.",
                            component
                        ),
                    );
                }
                Some(prior_years) => self.trend_component(
                    component,
                    ytd,
                    pace.monthly,
                    pace.months_elapsed,
                    &prior_years,
                ),
            }
        }
    }

    fn trend_component(
        &mut self,
        component: IncomeComponentType,
        ytd: Decimal,
        current_monthly: Decimal,
        months_elapsed: u32,
        priors: &PriorYears,
    ) {
        let assessment = classify_trend(current_monthly, priors, self.params.trend_epsilon);
        let w2_years: Vec<i32> = self.prior_w2s.iter().map(|w| w.year).collect();
        let years_label = w2_years
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let (method, note) = match assessment.classification {
            TrendClassification::StableOrIncreasing => (
                CalculationMethod::TwoYearAvg,
                format!(
                    "Current pace {} (YTD {} / {} month(s)) at or above prior average {} \
                     from W-2 year(s) {}; using prior average",
                    current_monthly, ytd, months_elapsed, assessment.prior_average, years_label
                ),
            ),
            TrendClassification::DeclinedThenStabilized => (
                CalculationMethod::CurrentLower,
                format!(
                    "Current pace {} below prior average {} but stable against most recent \
                     W-2 year; using lower current pace",
                    current_monthly, assessment.prior_average
                ),
            ),
            TrendClassification::Declining => (
                CalculationMethod::CurrentLower,
                format!(
                    "Current pace {} below most recent W-2 year {}; declining, using current \
                     pace",
                    current_monthly,
                    round_money(priors.most_recent)
                ),
            ),
        };

        self.push_line(
            component,
            assessment.recommended_monthly,
            method,
            note,
            EvidenceTrace {
                paystub_as_of: self.paystub.map(|p| p.as_of_date),
                w2_years,
                months_elapsed: Some(months_elapsed),
                trend: Some(assessment.classification),
            },
        );

        if assessment.classification == TrendClassification::DeclinedThenStabilized {
            self.flag(
                Severity::Info,
                FlagCode::DeclineStabilized,
                Some(component),
                format!(
                    "{} declined and has stabilized; the lower current figure is used.",
                    component
                ),
            );
        }
        if let Some(flag) = assessment.flag {
            self.flags.push(
                flag.for_employment(self.employment.id.clone())
                    .for_component(component),
            );
        }
    }

    fn note_uncounted_components(&mut self) {
        let Some(paystub) = self.paystub else {
            return;
        };
        for component in UNCOUNTED {
            let ytd = paystub.ytd_by_component.get(component);
            if ytd > Decimal::ZERO {
                self.flag(
                    Severity::Info,
                    FlagCode::ComponentNotCounted,
                    Some(component),
                    format!(
                        "{} YTD {} is not counted toward qualifying income by this ruleset.",
                        component, ytd
                    ),
                );
            }
        }
    }
}

/// The explicit YTD base amount on a paystub, if broken out.
fn base_ytd(paystub: &PaystubSnapshot) -> Option<Decimal> {
    paystub
        .ytd_by_component
        .contains(IncomeComponentType::Base)
        .then(|| paystub.ytd_by_component.get(IncomeComponentType::Base))
}

/// Gross YTD less every other reported component, floored at zero.
fn derived_base_from_gross(paystub: &PaystubSnapshot) -> Decimal {
    let gross = paystub.gross_ytd.unwrap_or(Decimal::ZERO);
    (gross - paystub.ytd_by_component.total()).max(Decimal::ZERO)
}

/// Months of the current year the employee has been paid for, as of the
/// paystub. Employment starting this year counts from its start month.
fn months_worked_this_year(employment: &Employment, paystub: &PaystubSnapshot) -> u32 {
    let as_of = paystub.as_of_date;
    match employment.start_date {
        Some(start) if start.year() == as_of.year() && start <= as_of => {
            as_of.month() - start.month() + 1
        }
        _ => as_of.month(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComponentAmounts, GapEvent, LoanProgram, PayFrequency};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn amounts(entries: &[(IncomeComponentType, &str)]) -> ComponentAmounts {
        entries.iter().map(|(c, a)| (*c, dec(a))).collect()
    }

    fn salaried(id: &str, annual: &str) -> Employment {
        Employment {
            id: id.to_string(),
            employer_name: format!("Employer {}", id),
            is_current: true,
            start_date: None,
            end_date: None,
            base_pay_type: BasePayType::Salary,
            pay_frequency: PayFrequency::Biweekly,
            base_rate: dec(annual),
            expected_hours_per_week: None,
            hours_fluctuate: false,
            recent_raise: false,
            recent_pay_cut: false,
        }
    }

    fn hourly(id: &str, rate: &str, hours: Option<&str>, fluctuate: bool) -> Employment {
        Employment {
            base_pay_type: BasePayType::Hourly,
            base_rate: dec(rate),
            expected_hours_per_week: hours.map(dec),
            hours_fluctuate: fluctuate,
            ..salaried(id, "0")
        }
    }

    fn paystub(id: &str, as_of: NaiveDate, ytd: ComponentAmounts) -> PaystubSnapshot {
        PaystubSnapshot {
            employment_id: id.to_string(),
            as_of_date: as_of,
            pay_period_end_date: None,
            pay_periods_ytd: None,
            ytd_by_component: ytd,
            current_period_by_component: None,
            gross_ytd: None,
        }
    }

    fn w2(id: &str, year: i32, entries: &[(IncomeComponentType, &str)]) -> W2Year {
        W2Year {
            employment_id: id.to_string(),
            year,
            amounts_by_component: amounts(entries),
            total: None,
        }
    }

    fn bundle(
        employments: Vec<Employment>,
        paystubs: Vec<PaystubSnapshot>,
        w2s: Vec<W2Year>,
    ) -> EvidenceBundle {
        EvidenceBundle {
            program: LoanProgram::Fha,
            borrower_ref: "borrower-1".to_string(),
            employments,
            paystubs,
            w2s,
            voes: vec![],
            gaps: vec![],
            evaluation_date: date(2025, 7, 15),
        }
    }

    fn run(bundle: &EvidenceBundle) -> RulesetOutput {
        evaluate(bundle, &RulesetParams::default())
    }

    fn has_flag(result: &EmploymentResult, code: FlagCode) -> bool {
        result.flags.iter().any(|f| f.code == code)
    }

    #[test]
    fn test_salary_divided_by_twelve() {
        let b = bundle(
            vec![salaried("emp_1", "84000")],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "42000")]))],
            vec![],
        );
        let output = run(&b);
        let result = &output.employment_results[0];

        assert_eq!(result.monthly_by_component.get(IncomeComponentType::Base), dec("7000.00"));
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].method, CalculationMethod::SalaryAnnualDiv12);
        assert_eq!(result.lines[0].monthly_amount.to_string(), "7000.00");
        assert!(result.flags.is_empty());
        assert!(output.global_flags.is_empty());
    }

    #[test]
    fn test_hourly_stable_hours() {
        let b = bundle(
            vec![hourly("emp_1", "25", Some("40"), false)],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "26000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];

        assert_eq!(result.lines[0].method, CalculationMethod::HourlyStableHours);
        assert_eq!(result.monthly_by_component.get(IncomeComponentType::Base), dec("4333.33"));
    }

    #[test]
    fn test_fluctuating_hourly_base_uses_ytd_pace() {
        let b = bundle(
            vec![hourly("emp_1", "25", Some("40"), true)],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "24000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];

        assert_eq!(result.lines[0].method, CalculationMethod::YtdPace);
        assert_eq!(result.lines[0].monthly_amount, dec("4000.00"));
        assert_eq!(result.lines[0].evidence.months_elapsed, Some(6));
        assert_eq!(result.lines[0].evidence.paystub_as_of, Some(date(2025, 6, 30)));
        let flag = result
            .flags
            .iter()
            .find(|f| f.code == FlagCode::BaseTrendedAsVariable)
            .unwrap();
        assert_eq!(flag.severity, Severity::Info);
        assert_eq!(flag.component, Some(IncomeComponentType::Base));
    }

    #[test]
    fn test_hourly_without_hours_is_variable() {
        let b = bundle(
            vec![hourly("emp_1", "25", None, false)],
            vec![paystub("emp_1", date(2025, 3, 31), amounts(&[(IncomeComponentType::Base, "12000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];
        assert_eq!(result.lines[0].method, CalculationMethod::YtdPace);
        assert_eq!(result.lines[0].monthly_amount, dec("4000.00"));
    }

    #[test]
    fn test_variable_base_falls_back_to_gross_ytd() {
        let mut stub = paystub(
            "emp_1",
            date(2025, 4, 30),
            amounts(&[(IncomeComponentType::Overtime, "2000")]),
        );
        stub.gross_ytd = Some(dec("18000"));
        let b = bundle(vec![hourly("emp_1", "25", None, true)], vec![stub], vec![]);
        let result = &run(&b).employment_results[0];

        let base = result
            .lines
            .iter()
            .find(|l| l.component == IncomeComponentType::Base)
            .unwrap();
        assert_eq!(base.monthly_amount, dec("4000.00"));
        assert!(has_flag(result, FlagCode::BaseFromGrossYtd));
    }

    #[test]
    fn test_overtime_without_history_stays_ytd_pace() {
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Overtime, "3000"),
                ]),
            )],
            vec![],
        );
        let result = &run(&b).employment_results[0];

        let overtime = &result.lines[1];
        assert_eq!(overtime.component, IncomeComponentType::Overtime);
        assert_eq!(overtime.method, CalculationMethod::YtdPace);
        assert_eq!(overtime.monthly_amount, dec("500.00"));
        let flag = result
            .flags
            .iter()
            .find(|f| f.code == FlagCode::InsufficientHistory)
            .unwrap();
        assert_eq!(flag.severity, Severity::Warn);
        assert_eq!(flag.component, Some(IncomeComponentType::Overtime));
    }

    #[test]
    fn test_stable_overtime_uses_two_year_average() {
        // Current pace 5150/month; prior years 5200 and 5000 per month.
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Overtime, "30900"),
                ]),
            )],
            vec![
                w2("emp_1", 2023, &[(IncomeComponentType::Overtime, "60000")]),
                w2("emp_1", 2024, &[(IncomeComponentType::Overtime, "62400")]),
            ],
        );
        let result = &run(&b).employment_results[0];

        let overtime = &result.lines[1];
        assert_eq!(overtime.method, CalculationMethod::TwoYearAvg);
        assert_eq!(overtime.monthly_amount, dec("5100.00"));
        assert_eq!(overtime.evidence.w2_years, vec![2024, 2023]);
        assert_eq!(
            overtime.evidence.trend,
            Some(TrendClassification::StableOrIncreasing)
        );
        assert!(!has_flag(result, FlagCode::DecliningIncome));
    }

    #[test]
    fn test_declining_bonus_uses_current_and_warns() {
        // Current pace 4900/month; prior years 5200 and 5000 per month.
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Bonus, "29400"),
                ]),
            )],
            vec![
                w2("emp_1", 2024, &[(IncomeComponentType::Bonus, "62400")]),
                w2("emp_1", 2023, &[(IncomeComponentType::Bonus, "60000")]),
            ],
        );
        let result = &run(&b).employment_results[0];

        let bonus = &result.lines[1];
        assert_eq!(bonus.method, CalculationMethod::CurrentLower);
        assert_eq!(bonus.monthly_amount, dec("4900.00"));
        let flag = result
            .flags
            .iter()
            .find(|f| f.code == FlagCode::DecliningIncome)
            .unwrap();
        assert_eq!(flag.severity, Severity::Warn);
        assert_eq!(flag.employment_id.as_deref(), Some("emp_1"));
        assert_eq!(flag.component, Some(IncomeComponentType::Bonus));
    }

    #[test]
    fn test_declined_then_stabilized_commission() {
        // Prior years 4800 (2024) and 5400 (2023); current 4850.
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 2, 28),
                amounts(&[
                    (IncomeComponentType::Base, "10000"),
                    (IncomeComponentType::Commission, "9700"),
                ]),
            )],
            vec![
                w2("emp_1", 2024, &[(IncomeComponentType::Commission, "57600")]),
                w2("emp_1", 2023, &[(IncomeComponentType::Commission, "64800")]),
            ],
        );
        let result = &run(&b).employment_results[0];

        let commission = &result.lines[1];
        assert_eq!(commission.method, CalculationMethod::CurrentLower);
        assert_eq!(commission.monthly_amount, dec("4850.00"));
        assert!(has_flag(result, FlagCode::DeclineStabilized));
        assert!(!has_flag(result, FlagCode::DecliningIncome));
    }

    #[test]
    fn test_only_two_most_recent_prior_years_are_used() {
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Overtime, "6000"),
                ]),
            )],
            vec![
                w2("emp_1", 2022, &[(IncomeComponentType::Overtime, "1")]),
                w2("emp_1", 2024, &[(IncomeComponentType::Overtime, "12000")]),
                w2("emp_1", 2023, &[(IncomeComponentType::Overtime, "12000")]),
                w2("emp_1", 2025, &[(IncomeComponentType::Overtime, "99999")]),
            ],
        );
        let result = &run(&b).employment_results[0];

        let overtime = &result.lines[1];
        assert_eq!(overtime.evidence.w2_years, vec![2024, 2023]);
        assert_eq!(overtime.monthly_amount, dec("1000.00"));
    }

    #[test]
    fn test_zero_variable_components_produce_no_lines() {
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Bonus, "0"),
                ]),
            )],
            vec![],
        );
        let result = &run(&b).employment_results[0];
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_uncounted_components_are_flagged() {
        let b = bundle(
            vec![salaried("emp_1", "60000")],
            vec![paystub(
                "emp_1",
                date(2025, 6, 30),
                amounts(&[
                    (IncomeComponentType::Base, "30000"),
                    (IncomeComponentType::Tips, "1200"),
                ]),
            )],
            vec![],
        );
        let result = &run(&b).employment_results[0];

        assert_eq!(result.monthly_by_component.get(IncomeComponentType::Tips), Decimal::ZERO);
        let flag = result
            .flags
            .iter()
            .find(|f| f.code == FlagCode::ComponentNotCounted)
            .unwrap();
        assert_eq!(flag.component, Some(IncomeComponentType::Tips));
    }

    #[test]
    fn test_missing_paystub_raises_stop_and_keeps_fixed_base() {
        let b = bundle(
            vec![salaried("emp_1", "84000"), hourly("emp_2", "20", None, true)],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "42000")]))],
            vec![],
        );
        let output = run(&b);

        let second = &output.employment_results[1];
        assert!(second.lines.is_empty());
        let flag = second
            .flags
            .iter()
            .find(|f| f.code == FlagCode::MissingPaystub)
            .unwrap();
        assert_eq!(flag.severity, Severity::Stop);
        assert_eq!(
            output.employment_results[0].monthly_total,
            dec("7000.00")
        );
    }

    #[test]
    fn test_stale_and_future_paystubs_are_flagged() {
        let stale = bundle(
            vec![salaried("emp_1", "84000")],
            vec![paystub("emp_1", date(2025, 5, 31), amounts(&[(IncomeComponentType::Base, "35000")]))],
            vec![],
        );
        assert!(has_flag(&run(&stale).employment_results[0], FlagCode::StalePaystub));

        let future = bundle(
            vec![salaried("emp_1", "84000")],
            vec![paystub("emp_1", date(2025, 7, 31), amounts(&[(IncomeComponentType::Base, "49000")]))],
            vec![],
        );
        assert!(has_flag(
            &run(&future).employment_results[0],
            FlagCode::PaystubAfterEvaluationDate
        ));
    }

    #[test]
    fn test_ytd_base_shortfall_is_flagged() {
        let b = bundle(
            vec![salaried("emp_1", "84000")],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "30000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];
        assert!(has_flag(result, FlagCode::BaseYtdVariance));
        assert_eq!(result.monthly_total, dec("7000.00"));
    }

    #[test]
    fn test_variance_counts_from_start_month_for_new_hires() {
        let mut employment = salaried("emp_1", "84000");
        employment.start_date = Some(date(2025, 4, 1));
        let b = bundle(
            vec![employment],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "21000")]))],
            vec![],
        );
        assert!(!has_flag(&run(&b).employment_results[0], FlagCode::BaseYtdVariance));
    }

    #[test]
    fn test_past_employment_contributes_nothing() {
        let mut employment = salaried("emp_1", "84000");
        employment.is_current = false;
        let b = bundle(
            vec![employment],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "42000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];
        assert!(result.lines.is_empty());
        assert_eq!(result.monthly_total, Decimal::ZERO);
        assert!(has_flag(result, FlagCode::PastEmploymentExcluded));
    }

    #[test]
    fn test_compensation_change_flags() {
        let mut employment = salaried("emp_1", "84000");
        employment.recent_raise = true;
        employment.recent_pay_cut = true;
        let b = bundle(
            vec![employment],
            vec![paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "42000")]))],
            vec![],
        );
        let result = &run(&b).employment_results[0];
        let raise = result.flags.iter().find(|f| f.code == FlagCode::RecentRaise).unwrap();
        let cut = result.flags.iter().find(|f| f.code == FlagCode::RecentPayCut).unwrap();
        assert_eq!(raise.severity, Severity::Info);
        assert_eq!(cut.severity, Severity::Warn);
    }

    #[test]
    fn test_global_flags_for_multiple_employments_and_gaps() {
        let mut b = bundle(
            vec![salaried("emp_1", "60000"), salaried("emp_2", "24000")],
            vec![
                paystub("emp_1", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "30000")])),
                paystub("emp_2", date(2025, 6, 30), amounts(&[(IncomeComponentType::Base, "12000")])),
            ],
            vec![],
        );
        b.gaps = vec![
            GapEvent {
                employment_id: "emp_1".to_string(),
                start_date: date(2023, 1, 1),
                end_date: Some(date(2023, 3, 1)),
                explanation_provided: false,
            },
            GapEvent {
                employment_id: "emp_2".to_string(),
                start_date: date(2022, 1, 1),
                end_date: Some(date(2022, 2, 1)),
                explanation_provided: false,
            },
        ];
        let output = run(&b);

        let codes: Vec<FlagCode> = output.global_flags.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec![FlagCode::MultipleEmployments, FlagCode::UnexplainedGap]
        );
        assert_eq!(output.employment_results.len(), 2);
    }
}
