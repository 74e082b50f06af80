//! Report validation.
//!
//! The constraint table is data ([`RuleSet`]), selected by
//! [`RuleSetVersion`]; [`validate`] is the pure evaluator.

pub mod evaluator;
pub mod rules;

pub use evaluator::validate;
pub use rules::{
    Field, FieldRule, FieldViolation, RejectionReason, RuleSet, RuleSetVersion, ViolationKind,
    DEFAULT_DOCUMENT_URI_PATTERN, MAX_FIELD_CHARS, VIOLATED_DIRECTIVE_PATTERN,
};
