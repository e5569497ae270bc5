//! Income evaluation engine for mortgage underwriting.
//!
//! This crate turns a borrower's employment evidence (paystubs, W-2s,
//! verifications of employment, employment gaps) into an auditable decision
//! package: monthly qualifying income per component, flags, and the document
//! checklist an underwriter still needs.
//!
//! The pipeline is pure and synchronous:
//!
//! 1. [`validation`] turns raw JSON into a validated
//!    [`EvidenceBundle`](models::EvidenceBundle).
//! 2. A versioned [`ruleset`] computes calculation lines and flags.
//! 3. [`decision`] derives requirements, sums totals and stamps the audit hash.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod models;
pub mod ruleset;
pub mod telemetry;
pub mod validation;

pub use engine::{IncomeEngine, evaluate};
