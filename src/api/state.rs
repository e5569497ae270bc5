//! Application state for the income evaluation API.

use std::sync::Arc;

use crate::engine::IncomeEngine;
use crate::ruleset::RulesetRegistry;

/// Shared application state.
///
/// Holds the engine and its ruleset registry, loaded once at startup and
/// shared read-only across handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<IncomeEngine>,
}

impl AppState {
    /// Creates application state over a ruleset registry.
    pub fn new(registry: RulesetRegistry) -> Self {
        Self {
            engine: Arc::new(IncomeEngine::new(registry)),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &IncomeEngine {
        &self.engine
    }
}
