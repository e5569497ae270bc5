//! Evidence schema validation.
//!
//! Converts untyped input into a validated [`EvidenceBundle`](crate::models::EvidenceBundle),
//! rejecting malformed input with every violated field path.

mod reader;
mod validator;

pub use validator::validate_evidence;
