//! HTTP request handlers for the income evaluation API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::DecisionPackage;
use crate::ruleset::{RulesetKey, RulesetSummary};

use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_handler))
        .route("/evaluate/:id/:version", post(evaluate_with_ruleset_handler))
        .route("/rulesets", get(rulesets_handler))
        .with_state(state)
}

/// Handler for POST /evaluate.
///
/// Evaluates the evidence with the latest ruleset for its program.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing evaluation request");

    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => return reject(correlation_id, rejection),
    };
    let start_time = Instant::now();
    let result = state.engine().evaluate(&raw);
    respond(correlation_id, start_time, result)
}

/// Handler for POST /evaluate/:id/:version.
///
/// Evaluates the evidence with an explicitly selected ruleset.
async fn evaluate_with_ruleset_handler(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let key = RulesetKey::new(id, version);
    info!(
        correlation_id = %correlation_id,
        ruleset = %key,
        "Processing evaluation request"
    );

    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => return reject(correlation_id, rejection),
    };
    let start_time = Instant::now();
    let result = state.engine().evaluate_with_ruleset(&raw, &key);
    respond(correlation_id, start_time, result)
}

/// Handler for GET /rulesets.
async fn rulesets_handler(State(state): State<AppState>) -> Json<Vec<RulesetSummary>> {
    Json(state.engine().registry().summaries())
}

/// Converts a body extraction failure into a 400 response.
fn reject(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::JsonDataError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON data error");
            ApiError::malformed_json(err.body_text())
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::new(StatusCode::BAD_REQUEST, error).into_response()
}

fn respond(
    correlation_id: Uuid,
    start_time: Instant,
    result: EngineResult<DecisionPackage>,
) -> Response {
    match result {
        Ok(package) => {
            info!(
                correlation_id = %correlation_id,
                ruleset = %format!("{}@{}", package.ruleset_id, package.ruleset_version),
                employments = package.employment_results.len(),
                monthly_total = %package.monthly_total_usable_income,
                requires_manual_review = package.requires_manual_review,
                input_hash = %package.audit.input_hash,
                duration_us = start_time.elapsed().as_micros(),
                "Evaluation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(package),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Evaluation failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}
