//! Ruleset registration and lookup.
//!
//! A ruleset is a named, versioned pure function plus its parameters. The
//! registry is an explicit value passed to the engine, never a global.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{RulesetConfig, RulesetLoader, RulesetParams};
use crate::error::{EngineError, EngineResult};
use crate::models::{EmploymentResult, EvidenceBundle, Flag, LoanProgram};

use super::fha_w2_v1;

/// Identifies a ruleset by id and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RulesetKey {
    /// Ruleset identifier.
    pub id: String,
    /// Ruleset version.
    pub version: String,
}

impl RulesetKey {
    /// Creates a new key.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for RulesetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl Ord for RulesetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| compare_versions(&self.version, &other.version))
    }
}

impl PartialOrd for RulesetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares dotted versions segment by segment, numerically where possible.
/// Versions that compare equal numerically fall back to plain text order.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// What a ruleset produces for one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetOutput {
    /// One result per employment, index-aligned with the bundle.
    pub employment_results: Vec<EmploymentResult>,
    /// Flags not tied to a single employment.
    pub global_flags: Vec<Flag>,
}

/// Signature every rule function implements.
pub type RulesFn = fn(&EvidenceBundle, &RulesetParams) -> RulesetOutput;

/// Built-in rule functions, by name.
const BUILTIN_RULES: &[(&str, RulesFn)] =
    &[(fha_w2_v1::RULES_NAME, fha_w2_v1::evaluate as RulesFn)];

/// Looks up a built-in rule function by name.
pub fn builtin_rules(name: &str) -> Option<RulesFn> {
    BUILTIN_RULES
        .iter()
        .find(|(rules_name, _)| *rules_name == name)
        .map(|(_, rules)| *rules)
}

/// A registered ruleset.
#[derive(Clone)]
pub struct Ruleset {
    key: RulesetKey,
    program: LoanProgram,
    description: String,
    params: RulesetParams,
    rules: RulesFn,
}

impl fmt::Debug for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ruleset")
            .field("key", &self.key)
            .field("program", &self.program)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Ruleset {
    /// Creates a ruleset from its parts.
    pub fn new(
        key: RulesetKey,
        program: LoanProgram,
        description: impl Into<String>,
        params: RulesetParams,
        rules: RulesFn,
    ) -> Self {
        Self {
            key,
            program,
            description: description.into(),
            params,
            rules,
        }
    }

    /// Builds a ruleset from a YAML declaration, resolving its rule function.
    pub fn from_config(config: RulesetConfig) -> EngineResult<Self> {
        let rules = builtin_rules(&config.rules).ok_or_else(|| EngineError::UnknownRules {
            id: config.id.clone(),
            rules: config.rules.clone(),
        })?;
        Ok(Self::new(
            RulesetKey::new(config.id, config.version),
            config.program,
            config.description,
            config.params,
            rules,
        ))
    }

    /// The ruleset's key.
    pub fn key(&self) -> &RulesetKey {
        &self.key
    }

    /// The program the ruleset serves.
    pub fn program(&self) -> LoanProgram {
        self.program
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The ruleset's thresholds.
    pub fn params(&self) -> &RulesetParams {
        &self.params
    }

    /// Applies the ruleset to a validated bundle.
    pub fn apply(&self, bundle: &EvidenceBundle) -> RulesetOutput {
        (self.rules)(bundle, &self.params)
    }
}

/// Summary of a registered ruleset, for catalogues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetSummary {
    /// Ruleset identifier.
    pub id: String,
    /// Ruleset version.
    pub version: String,
    /// The program served.
    pub program: LoanProgram,
    /// Human-readable description.
    pub description: String,
}

/// Rulesets available to the engine, keyed by id and version.
///
/// # Example
///
/// ```
/// use income_engine::models::LoanProgram;
/// use income_engine::ruleset::{RulesetKey, RulesetRegistry};
///
/// let registry = RulesetRegistry::builtin();
/// let ruleset = registry.latest_for(LoanProgram::Fha).unwrap();
/// assert_eq!(ruleset.key(), &RulesetKey::new("fha-w2", "1.0.0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RulesetRegistry {
    rulesets: BTreeMap<RulesetKey, Ruleset>,
}

impl RulesetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in rulesets with default
    /// parameters. Performs no I/O.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Ruleset::new(
            RulesetKey::new(fha_w2_v1::RULESET_ID, fha_w2_v1::RULESET_VERSION),
            LoanProgram::Fha,
            "FHA W-2 wage earner income",
            RulesetParams::default(),
            fha_w2_v1::evaluate,
        ));
        registry
    }

    /// Builds a registry from YAML declarations.
    pub fn from_configs(configs: Vec<RulesetConfig>) -> EngineResult<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(Ruleset::from_config(config)?);
        }
        Ok(registry)
    }

    /// Loads a registry from a directory of ruleset files.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let registry = Self::from_configs(RulesetLoader::load(path)?.into_rulesets())?;
        info!(
            rulesets = ?registry.keys().map(ToString::to_string).collect::<Vec<_>>(),
            "Ruleset registry loaded"
        );
        Ok(registry)
    }

    /// Registers a ruleset, replacing any with the same key.
    pub fn register(&mut self, ruleset: Ruleset) {
        self.rulesets.insert(ruleset.key.clone(), ruleset);
    }

    /// Looks up a ruleset by key.
    pub fn get(&self, key: &RulesetKey) -> EngineResult<&Ruleset> {
        self.rulesets
            .get(key)
            .ok_or_else(|| EngineError::RulesetNotFound {
                id: key.id.clone(),
                version: key.version.clone(),
            })
    }

    /// Returns the highest-versioned ruleset serving a program.
    ///
    /// When several ruleset ids serve the same program, the last id in
    /// lexical order wins.
    pub fn latest_for(&self, program: LoanProgram) -> EngineResult<&Ruleset> {
        self.rulesets
            .values()
            .filter(|r| r.program == program)
            .max_by(|a, b| {
                compare_versions(&a.key.version, &b.key.version)
                    .then_with(|| a.key.id.cmp(&b.key.id))
            })
            .ok_or_else(|| EngineError::ProgramNotSupported {
                program: program.as_str().to_string(),
            })
    }

    /// Registered keys, in id then version order.
    pub fn keys(&self) -> impl Iterator<Item = &RulesetKey> {
        self.rulesets.keys()
    }

    /// Summaries of every registered ruleset.
    pub fn summaries(&self) -> Vec<RulesetSummary> {
        self.rulesets
            .values()
            .map(|r| RulesetSummary {
                id: r.key.id.clone(),
                version: r.key.version.clone(),
                program: r.program,
                description: r.description.clone(),
            })
            .collect()
    }

    /// Number of registered rulesets.
    pub fn len(&self) -> usize {
        self.rulesets.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.rulesets.is_empty()
    }
}
