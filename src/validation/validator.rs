//! Evidence schema validation.
//!
//! Turns an untyped JSON value into a validated [`EvidenceBundle`], or a
//! [`ValidationError`] listing every violated field.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{
    BasePayType, Employment, EvidenceBundle, GapEvent, LoanProgram, PayFrequency,
    PaystubSnapshot, VoeKind, VoeRecord, W2Year,
};

use super::reader::{Fields, Violations};

const PROGRAMS: &[(&str, LoanProgram)] = &[("FHA", LoanProgram::Fha)];

const BASE_PAY_TYPES: &[(&str, BasePayType)] = &[
    ("SALARY", BasePayType::Salary),
    ("HOURLY", BasePayType::Hourly),
];

const PAY_FREQUENCIES: &[(&str, PayFrequency)] = &[
    ("WEEKLY", PayFrequency::Weekly),
    ("BIWEEKLY", PayFrequency::Biweekly),
    ("SEMIMONTHLY", PayFrequency::Semimonthly),
    ("MONTHLY", PayFrequency::Monthly),
];

const HOURS_PER_WEEK: u32 = 24 * 7;

const VOE_KINDS: &[(&str, VoeKind)] = &[("VERBAL", VoeKind::Verbal), ("WRITTEN", VoeKind::Written)];

/// Validates and normalizes raw evidence.
///
/// Every violation is collected before returning, so callers see the full
/// list of problems in one response. On success, absent optional collections
/// are empty, decimals are normalized and dates are reduced to calendar dates.
///
/// # Example
///
/// ```
/// use income_engine::validation::validate_evidence;
/// use serde_json::json;
///
/// let error = validate_evidence(&json!({
///     "program": "FHA",
///     "borrowerRef": "b-1",
///     "evaluationDateISO": "2025-07-01",
///     "employments": [],
///     "paystubs": []
/// }))
/// .unwrap_err();
///
/// assert!(error.has_path("employments"));
/// assert!(error.has_path("paystubs"));
/// ```
pub fn validate_evidence(raw: &Value) -> Result<EvidenceBundle, ValidationError> {
    let mut violations = Violations::default();

    let Some(root) = Fields::open(raw, "", &mut violations) else {
        return Err(ValidationError {
            violations: violations.into_inner(),
        });
    };

    let program = root.required_enum("program", PROGRAMS, &mut violations);
    let borrower_ref = root.required_string("borrowerRef", &mut violations);
    let evaluation_date = root.required_date("evaluationDateISO", &mut violations);

    let employment_items = root.non_empty_array("employments", "employment", &mut violations);

    let mut employments = Vec::new();
    let mut known_ids = HashSet::new();
    for (path, item) in &employment_items {
        if let Some(employment) = read_employment(item, path, &mut violations) {
            if !known_ids.insert(employment.id.clone()) {
                violations.push(
                    format!("{}.id", path),
                    format!("duplicate employment id '{}'", employment.id),
                );
            }
            employments.push(employment);
        } else if let Some(id) = item.get("id").and_then(Value::as_str) {
            // Still resolvable for cross-reference checks.
            known_ids.insert(id.trim().to_string());
        }
    }

    let paystub_items = root.non_empty_array("paystubs", "paystub", &mut violations);
    let paystubs: Vec<PaystubSnapshot> = paystub_items
        .iter()
        .filter_map(|(path, item)| read_paystub(item, path, &known_ids, &mut violations))
        .collect();

    let w2s: Vec<W2Year> = root
        .array("w2s", false, &mut violations)
        .iter()
        .filter_map(|(path, item)| read_w2(item, path, &known_ids, &mut violations))
        .collect();

    let voes: Vec<VoeRecord> = root
        .array("voes", false, &mut violations)
        .iter()
        .filter_map(|(path, item)| read_voe(item, path, &known_ids, &mut violations))
        .collect();

    let gaps: Vec<GapEvent> = root
        .array("gaps", false, &mut violations)
        .iter()
        .filter_map(|(path, item)| read_gap(item, path, &known_ids, &mut violations))
        .collect();

    match (program, borrower_ref, evaluation_date) {
        (Some(program), Some(borrower_ref), Some(evaluation_date)) if violations.is_empty() => {
            Ok(EvidenceBundle {
                program,
                borrower_ref,
                employments,
                paystubs,
                w2s,
                voes,
                gaps,
                evaluation_date,
            })
        }
        _ => {
            let violations = violations.into_inner();
            debug!(violations = violations.len(), "Evidence rejected");
            Err(ValidationError { violations })
        }
    }
}

fn resolve_reference(
    fields: &Fields<'_>,
    known_ids: &HashSet<String>,
    violations: &mut Violations,
) -> Option<String> {
    let id = fields.required_string("employmentId", violations)?;
    if known_ids.contains(&id) {
        Some(id)
    } else {
        violations.push(
            fields.path_of("employmentId"),
            format!("references unknown employment '{}'", id),
        );
        None
    }
}

fn read_employment(value: &Value, path: &str, violations: &mut Violations) -> Option<Employment> {
    let fields = Fields::open(value, path, violations)?;

    let id = fields.required_string("id", violations);
    let employer_name = fields.required_string("employerName", violations);
    let start_date = fields.optional_date("startDateISO", violations);
    let end_date = fields.optional_date("endDateISO", violations);
    let is_current = fields.bool_or("isCurrent", true, violations);
    let base_pay_type = fields.required_enum("basePayType", BASE_PAY_TYPES, violations);
    let pay_frequency = fields.required_enum("payFrequency", PAY_FREQUENCIES, violations);
    let base_rate = fields.required_amount("baseRate", violations);
    let expected_hours_per_week = fields.optional_amount("expectedHoursPerWeek", violations);
    let hours_fluctuate = fields.bool_or("hoursFluctuate", false, violations);
    let recent_raise = fields.bool_or("recentRaise", false, violations);
    let recent_pay_cut = fields.bool_or("recentPayCut", false, violations);

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            violations.push(fields.path_of("endDateISO"), "must not be before startDateISO");
        }
    }
    if expected_hours_per_week.is_some_and(|hours| hours > Decimal::from(HOURS_PER_WEEK)) {
        violations.push(
            fields.path_of("expectedHoursPerWeek"),
            format!("must not exceed {} hours", HOURS_PER_WEEK),
        );
    }

    Some(Employment {
        id: id?,
        employer_name: employer_name?,
        is_current,
        start_date,
        end_date,
        base_pay_type: base_pay_type?,
        pay_frequency: pay_frequency?,
        base_rate: base_rate?,
        expected_hours_per_week,
        hours_fluctuate,
        recent_raise,
        recent_pay_cut,
    })
}

fn read_paystub(
    value: &Value,
    path: &str,
    known_ids: &HashSet<String>,
    violations: &mut Violations,
) -> Option<PaystubSnapshot> {
    let fields = Fields::open(value, path, violations)?;

    let employment_id = resolve_reference(&fields, known_ids, violations);
    let as_of_date = fields.required_date("asOfDateISO", violations);
    let pay_period_end_date = fields.optional_date("payPeriodEndDateISO", violations);
    let pay_periods_ytd = fields.optional_count("payPeriodsYtd", violations);
    let ytd_by_component = fields.components("ytdByComponent", true, violations);
    let current_period_by_component =
        fields.components("currentPeriodByComponent", false, violations);
    let gross_ytd = fields.optional_amount("grossYtd", violations);

    Some(PaystubSnapshot {
        employment_id: employment_id?,
        as_of_date: as_of_date?,
        pay_period_end_date,
        pay_periods_ytd,
        ytd_by_component: ytd_by_component?,
        current_period_by_component,
        gross_ytd,
    })
}

fn read_w2(
    value: &Value,
    path: &str,
    known_ids: &HashSet<String>,
    violations: &mut Violations,
) -> Option<W2Year> {
    let fields = Fields::open(value, path, violations)?;

    let employment_id = resolve_reference(&fields, known_ids, violations);
    let year = fields.required_year("year", violations);
    let amounts_by_component = fields.components("amountsByComponent", true, violations);
    let total = fields.optional_amount("total", violations);

    Some(W2Year {
        employment_id: employment_id?,
        year: year?,
        amounts_by_component: amounts_by_component?,
        total,
    })
}

fn read_voe(
    value: &Value,
    path: &str,
    known_ids: &HashSet<String>,
    violations: &mut Violations,
) -> Option<VoeRecord> {
    let fields = Fields::open(value, path, violations)?;

    let employment_id = resolve_reference(&fields, known_ids, violations);
    let kind = fields.required_enum("kind", VOE_KINDS, violations);
    let date = fields.optional_date("dateISO", violations);
    let confirmed_active = fields.optional_bool("confirmedActive", violations);

    Some(VoeRecord {
        employment_id: employment_id?,
        kind: kind?,
        date,
        confirmed_active,
    })
}

fn read_gap(
    value: &Value,
    path: &str,
    known_ids: &HashSet<String>,
    violations: &mut Violations,
) -> Option<GapEvent> {
    let fields = Fields::open(value, path, violations)?;

    let employment_id = resolve_reference(&fields, known_ids, violations);
    let start_date = fields.required_date("startDateISO", violations);
    let end_date = fields.optional_date("endDateISO", violations);
    let explanation_provided = fields.bool_or("explanationProvided", false, violations);

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            violations.push(fields.path_of("endDateISO"), "must not be before startDateISO");
        }
    }

    Some(GapEvent {
        employment_id: employment_id?,
        start_date: start_date?,
        end_date,
        explanation_provided,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeComponentType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn valid_input() -> Value {
        json!({
            "program": "FHA",
            "borrowerRef": "borrower-42",
            "evaluationDateISO": "2025-07-15",
            "employments": [{
                "id": "emp_1",
                "employerName": "Acme Logistics",
                "basePayType": "SALARY",
                "payFrequency": "BIWEEKLY",
                "baseRate": 84000
            }],
            "paystubs": [{
                "employmentId": "emp_1",
                "asOfDateISO": "2025-06-30",
                "ytdByComponent": { "BASE": "42000.00", "BONUS": 1500 }
            }]
        })
    }

    fn violations_of(input: Value) -> ValidationError {
        validate_evidence(&input).unwrap_err()
    }

    #[test]
    fn test_valid_input_normalizes_defaults() {
        let bundle = validate_evidence(&valid_input()).unwrap();

        assert_eq!(bundle.program, LoanProgram::Fha);
        assert_eq!(bundle.borrower_ref, "borrower-42");
        assert_eq!(
            bundle.evaluation_date,
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
        );
        assert!(bundle.w2s.is_empty());
        assert!(bundle.voes.is_empty());
        assert!(bundle.gaps.is_empty());

        let employment = &bundle.employments[0];
        assert!(employment.is_current);
        assert!(!employment.hours_fluctuate);
        assert_eq!(employment.base_rate, dec("84000"));

        let ytd = &bundle.paystubs[0].ytd_by_component;
        assert_eq!(ytd.get(IncomeComponentType::Base), dec("42000"));
        assert_eq!(ytd.get(IncomeComponentType::Bonus), dec("1500"));
    }

    #[test]
    fn test_decimals_are_normalized() {
        let bundle = validate_evidence(&valid_input()).unwrap();
        let base = bundle.paystubs[0].ytd_by_component.get(IncomeComponentType::Base);
        assert_eq!(base.to_string(), "42000");
    }

    #[test]
    fn test_zero_employments_is_rejected() {
        let mut input = valid_input();
        input["employments"] = json!([]);
        input["paystubs"][0]["employmentId"] = json!("emp_1");

        let error = violations_of(input);
        assert!(error.violations.iter().any(|v| {
            v.path == "employments" && v.reason == "must contain at least one employment"
        }));
    }

    #[test]
    fn test_dangling_paystub_reference_is_rejected() {
        let mut input = valid_input();
        input["paystubs"][0]["employmentId"] = json!("emp_404");

        let error = violations_of(input);
        assert_eq!(error.violations.len(), 1);
        assert_eq!(error.violations[0].path, "paystubs[0].employmentId");
        assert_eq!(
            error.violations[0].reason,
            "references unknown employment 'emp_404'"
        );
    }

    #[test]
    fn test_every_violation_is_reported() {
        let input = json!({
            "program": "VA",
            "evaluationDateISO": "not-a-date",
            "employments": [{
                "id": "emp_1",
                "employerName": "Acme",
                "basePayType": "PIECEWORK",
                "payFrequency": "BIWEEKLY",
                "baseRate": -5
            }],
            "paystubs": [{ "employmentId": "emp_1", "asOfDateISO": "2025-06-30" }],
            "w2s": [{ "employmentId": "emp_2", "year": 2024, "amountsByComponent": {} }],
            "gaps": [{ "employmentId": "emp_1" }]
        });

        let error = violations_of(input);
        for path in [
            "program",
            "borrowerRef",
            "evaluationDateISO",
            "employments[0].basePayType",
            "employments[0].baseRate",
            "paystubs[0].ytdByComponent",
            "w2s[0].employmentId",
            "gaps[0].startDateISO",
        ] {
            assert!(error.has_path(path), "missing violation for {}", path);
        }
    }

    #[test]
    fn test_invalid_employment_still_resolves_references() {
        let mut input = valid_input();
        input["employments"][0]["baseRate"] = json!("lots");

        let error = violations_of(input);
        assert_eq!(error.violations.len(), 1);
        assert!(error.has_path("employments[0].baseRate"));
    }

    #[test]
    fn test_duplicate_employment_ids_are_rejected() {
        let mut input = valid_input();
        let employment = input["employments"][0].clone();
        input["employments"] = json!([employment.clone(), employment]);

        let error = violations_of(input);
        assert!(error.has_path("employments[1].id"));
    }

    #[test]
    fn test_gap_explanation_defaults_to_false() {
        let mut input = valid_input();
        input["gaps"] = json!([{ "employmentId": "emp_1", "startDateISO": "2024-01-01" }]);

        let bundle = validate_evidence(&input).unwrap();
        assert!(!bundle.gaps[0].explanation_provided);
        assert!(bundle.has_unexplained_gap());
    }

    #[test]
    fn test_end_date_alone_keeps_employment_current() {
        let mut input = valid_input();
        input["employments"][0]["startDateISO"] = json!("2020-01-01");
        input["employments"][0]["endDateISO"] = json!("2030-12-31");

        let bundle = validate_evidence(&input).unwrap();
        assert!(bundle.employments[0].is_current);
    }

    #[test]
    fn test_explicit_is_current_false_marks_past_employment() {
        let mut input = valid_input();
        input["employments"][0]["endDateISO"] = json!("2024-12-31");
        input["employments"][0]["isCurrent"] = json!(false);

        let bundle = validate_evidence(&input).unwrap();
        assert!(!bundle.employments[0].is_current);
    }

    #[test]
    fn test_hours_beyond_a_week_are_rejected() {
        let mut input = valid_input();
        input["employments"][0]["basePayType"] = json!("HOURLY");
        input["employments"][0]["baseRate"] = json!(25);
        input["employments"][0]["expectedHoursPerWeek"] = json!(169);

        let error = violations_of(input);
        assert_eq!(error.violations.len(), 1);
        assert_eq!(error.violations[0].path, "employments[0].expectedHoursPerWeek");
        assert_eq!(error.violations[0].reason, "must not exceed 168 hours");
    }

    #[test]
    fn test_amount_above_ceiling_is_rejected() {
        let mut input = valid_input();
        input["employments"][0]["baseRate"] = json!("79228162514264337593543950335");

        let error = violations_of(input);
        assert_eq!(error.violations.len(), 1);
        assert_eq!(error.violations[0].path, "employments[0].baseRate");
        assert_eq!(
            error.violations[0].reason,
            "must not exceed 1000000000000"
        );
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut input = valid_input();
        input["employments"][0]["startDateISO"] = json!("2024-01-01");
        input["employments"][0]["endDateISO"] = json!("2023-01-01");

        let error = violations_of(input);
        assert!(error.has_path("employments[0].endDateISO"));
    }

    #[test]
    fn test_hourly_without_hours_is_accepted() {
        let mut input = valid_input();
        input["employments"][0]["basePayType"] = json!("HOURLY");
        input["employments"][0]["baseRate"] = json!(25);

        let bundle = validate_evidence(&input).unwrap();
        assert_eq!(bundle.employments[0].stable_weekly_hours(), None);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let error = violations_of(json!("evidence"));
        assert_eq!(error.violations[0].path, "$");
    }
}
