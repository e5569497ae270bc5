//! HTTP API module for the income evaluation engine.
//!
//! This module provides the REST API endpoints for evaluating borrower
//! evidence and listing the registered rulesets.

mod handlers;
mod response;
mod state;

pub use handlers::create_router;
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
