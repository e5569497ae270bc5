//! Versioned rulesets.
//!
//! Each ruleset pairs a pure rule function with tunable parameters. Rule
//! functions are selected by name from ruleset files, so adding a new
//! ruleset version never changes how existing versions evaluate.

mod fha_w2_v1;
mod registry;

pub use fha_w2_v1::{
    RULES_NAME as FHA_W2_V1_RULES, RULESET_ID as FHA_W2_ID, RULESET_VERSION as FHA_W2_VERSION,
};
pub use registry::{
    Ruleset, RulesFn, RulesetKey, RulesetOutput, RulesetRegistry, RulesetSummary, builtin_rules,
};
