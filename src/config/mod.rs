//! Configuration loading and management for the income evaluation engine.
//!
//! Ruleset thresholds are data: each ruleset is declared in a YAML file naming
//! its id, version, loan program and the rule function that implements it.
//!
//! # Example
//!
//! ```no_run
//! use income_engine::config::RulesetLoader;
//!
//! let loader = RulesetLoader::load("./config/rulesets").unwrap();
//! println!("Loaded {} ruleset(s)", loader.rulesets().len());
//! ```

mod loader;
mod types;

pub use loader::RulesetLoader;
pub use types::{RulesetConfig, RulesetParams};
