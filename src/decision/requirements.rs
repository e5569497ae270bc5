//! Document checklist derivation.
//!
//! Requirements follow from the evidence and from what the ruleset actually
//! relied upon, so the checklist never asks for documents the computed
//! figures do not depend on.

use rust_decimal::Decimal;

use crate::models::{
    DocumentType, EmploymentResult, EvidenceBundle, IncomeComponentType, Requirement, Severity,
};

/// Requirements split by scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    /// Requirements that apply to the whole file.
    pub global: Vec<Requirement>,
    /// One list per employment, index-aligned with the bundle's employments.
    pub per_employment: Vec<Vec<Requirement>>,
}

/// Builds the document checklist for an evaluated bundle.
///
/// `results` must be index-aligned with `bundle.employments`.
pub fn build_requirements(bundle: &EvidenceBundle, results: &[EmploymentResult]) -> RequirementSet {
    let mut global = vec![Requirement {
        id: "paystub-ytd".to_string(),
        severity: Severity::Stop,
        title: "Most recent paystub".to_string(),
        description: "Provide the most recent paystub for each employment showing year-to-date \
                      earnings."
            .to_string(),
        employment_id: None,
        accepted_documents: vec![DocumentType::Paystub],
    }];

    if bundle.has_unexplained_gap() {
        global.push(Requirement {
            id: "gap-explanation".to_string(),
            severity: Severity::Warn,
            title: "Explanation of employment gap".to_string(),
            description: "Provide a letter explaining each gap in employment.".to_string(),
            employment_id: None,
            accepted_documents: vec![DocumentType::GapLetter, DocumentType::LetterOfExplanation],
        });
    }

    let multiple_employments = bundle.employments.len() > 1;
    let per_employment = bundle
        .employments
        .iter()
        .enumerate()
        .map(|(index, employment)| {
            let mut requirements = Vec::new();
            let relies_on_variable = results.get(index).is_some_and(|result| {
                IncomeComponentType::VARIABLE
                    .iter()
                    .any(|c| result.monthly_by_component.get(*c) > Decimal::ZERO)
            });

            if relies_on_variable || employment.hours_fluctuate {
                requirements.push(Requirement {
                    id: format!("w2-history:{}", employment.id),
                    severity: Severity::Warn,
                    title: format!("Prior W-2 history for {}", employment.employer_name),
                    description: "Provide W-2s for the two most recent years to support \
                                  variable income."
                        .to_string(),
                    employment_id: Some(employment.id.clone()),
                    accepted_documents: vec![DocumentType::W2, DocumentType::WrittenVoe],
                });
            }

            if multiple_employments {
                requirements.push(Requirement {
                    id: format!("verbal-voe:{}", employment.id),
                    severity: Severity::Warn,
                    title: format!("Verbal VOE for {}", employment.employer_name),
                    description: "Each employer must be verified separately when the borrower \
                                  has more than one employment."
                        .to_string(),
                    employment_id: Some(employment.id.clone()),
                    accepted_documents: vec![DocumentType::VerbalVoe],
                });
            }

            requirements
        })
        .collect();

    RequirementSet {
        global,
        per_employment,
    }
}
