//! Decision assembly.
//!
//! Turns a ruleset's per-employment output into a complete
//! [`DecisionPackage`](crate::models::DecisionPackage): document
//! requirements, totals and the audit hash of the validated input.

mod assembler;
mod canonical;
mod requirements;

pub use assembler::assemble_decision;
pub use canonical::{CANONICALIZATION, HASH_ALGORITHM, canonical_hash, canonical_json};
pub use requirements::{RequirementSet, build_requirements};
