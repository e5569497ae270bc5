//! Evaluation entry points.
//!
//! [`IncomeEngine`] owns an explicit [`RulesetRegistry`] and runs the full
//! pipeline: validate, apply the ruleset, assemble the decision. The engine
//! holds no other state, so one instance can serve concurrent evaluations.

use serde_json::Value;
use tracing::{debug, info};

use crate::decision::assemble_decision;
use crate::error::EngineResult;
use crate::models::{DecisionPackage, EvidenceBundle};
use crate::ruleset::{Ruleset, RulesetKey, RulesetRegistry};
use crate::validation::validate_evidence;

/// Evaluates raw evidence with the built-in rulesets.
///
/// The ruleset is the latest registered version for the bundle's program.
///
/// # Example
///
/// ```
/// use income_engine::evaluate;
/// use serde_json::json;
///
/// let package = evaluate(&json!({
///     "program": "FHA",
///     "borrowerRef": "b-1",
///     "evaluationDateISO": "2025-07-01",
///     "employments": [{
///         "id": "emp_1",
///         "employerName": "Acme",
///         "basePayType": "SALARY",
///         "payFrequency": "BIWEEKLY",
///         "baseRate": 84000
///     }],
///     "paystubs": [{
///         "employmentId": "emp_1",
///         "asOfDateISO": "2025-06-30",
///         "ytdByComponent": {"BASE": 42000}
///     }]
/// }))
/// .unwrap();
///
/// assert_eq!(package.monthly_total_usable_income.to_string(), "7000.00");
/// ```
pub fn evaluate(raw: &Value) -> EngineResult<DecisionPackage> {
    IncomeEngine::builtin().evaluate(raw)
}

/// Runs evaluations against a ruleset registry.
#[derive(Debug, Clone)]
pub struct IncomeEngine {
    registry: RulesetRegistry,
}

impl IncomeEngine {
    /// Creates an engine over the given registry.
    pub fn new(registry: RulesetRegistry) -> Self {
        Self { registry }
    }

    /// Creates an engine over the built-in rulesets.
    pub fn builtin() -> Self {
        Self::new(RulesetRegistry::builtin())
    }

    /// The registry the engine evaluates against.
    pub fn registry(&self) -> &RulesetRegistry {
        &self.registry
    }

    /// Validates and evaluates raw evidence with the latest ruleset for its
    /// program.
    pub fn evaluate(&self, raw: &Value) -> EngineResult<DecisionPackage> {
        let bundle = validate_evidence(raw)?;
        let ruleset = self.registry.latest_for(bundle.program)?;
        run(ruleset, &bundle)
    }

    /// Validates and evaluates raw evidence with a specific ruleset version.
    pub fn evaluate_with_ruleset(
        &self,
        raw: &Value,
        key: &RulesetKey,
    ) -> EngineResult<DecisionPackage> {
        let ruleset = self.registry.get(key)?;
        let bundle = validate_evidence(raw)?;
        run(ruleset, &bundle)
    }
}

fn run(ruleset: &Ruleset, bundle: &EvidenceBundle) -> EngineResult<DecisionPackage> {
    debug!(
        ruleset = %ruleset.key(),
        borrower_ref = %bundle.borrower_ref,
        employments = bundle.employments.len(),
        "Applying ruleset"
    );
    let output = ruleset.apply(bundle);
    let package = assemble_decision(bundle, ruleset.key(), output)?;
    info!(
        ruleset = %ruleset.key(),
        monthly_total = %package.monthly_total_usable_income,
        requires_manual_review = package.requires_manual_review,
        "Evaluation completed"
    );
    Ok(package)
}
