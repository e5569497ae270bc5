//! Core data models for the income evaluation engine.
//!
//! This module contains the validated evidence types consumed by the engine
//! and the decision types it produces.

mod component;
mod decision;
mod evidence;

pub use component::{ComponentAmounts, IncomeComponentType};
pub use decision::{
    AuditBlock, CalculationLine, CalculationMethod, DecisionPackage, DocumentType,
    EmploymentResult, EvidenceTrace, Flag, FlagCode, Requirement, Severity, TrendClassification,
};
pub use evidence::{
    BasePayType, Employment, EvidenceBundle, GapEvent, LoanProgram, PayFrequency,
    PaystubSnapshot, VoeKind, VoeRecord, W2Year,
};
