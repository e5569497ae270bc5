//! Decision package assembly.

use tracing::debug;

use crate::error::EngineResult;
use crate::models::{AuditBlock, ComponentAmounts, DecisionPackage, EvidenceBundle, Severity};
use crate::ruleset::{RulesetKey, RulesetOutput};

use super::canonical::{CANONICALIZATION, HASH_ALGORITHM, canonical_hash};
use super::requirements::build_requirements;

/// Combines a ruleset's output with requirements, totals and the audit
/// block.
///
/// Totals are sums of already-rounded lines, so the grand total always equals
/// the sum of the component totals exactly.
pub fn assemble_decision(
    bundle: &EvidenceBundle,
    ruleset: &RulesetKey,
    output: RulesetOutput,
) -> EngineResult<DecisionPackage> {
    let input_hash = canonical_hash(bundle)?;
    let requirements = build_requirements(bundle, &output.employment_results);

    let mut employment_results = output.employment_results;
    for (result, requirements) in employment_results
        .iter_mut()
        .zip(requirements.per_employment)
    {
        result.requirements = requirements;
    }

    let monthly_totals_by_component: ComponentAmounts = employment_results
        .iter()
        .flat_map(|r| r.monthly_by_component.iter())
        .collect();
    let monthly_total_usable_income = monthly_totals_by_component.total();

    let package = DecisionPackage {
        ruleset_id: ruleset.id.clone(),
        ruleset_version: ruleset.version.clone(),
        program: bundle.program,
        evaluation_date: bundle.evaluation_date,
        monthly_total_usable_income,
        monthly_totals_by_component,
        employment_results,
        global_flags: output.global_flags,
        global_requirements: requirements.global,
        requires_manual_review: false,
        audit: AuditBlock {
            input_hash,
            hash_algorithm: HASH_ALGORITHM.to_string(),
            canonicalization: CANONICALIZATION.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };
    let requires_manual_review = package.all_flags().any(|f| f.severity == Severity::Stop);

    debug!(
        ruleset = %ruleset,
        input_hash = %package.audit.input_hash,
        monthly_total = %package.monthly_total_usable_income,
        requires_manual_review,
        "Decision assembled"
    );
    Ok(DecisionPackage {
        requires_manual_review,
        ..package
    })
}
