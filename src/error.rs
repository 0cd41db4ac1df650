//! Error types for the compliance rule engine

use crate::condition::NodePath;
use crate::operator::{Operator, ValueShape};
use thiserror::Error;

/// The JSON handed to the discriminator does not describe a condition node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("{path}: object matches none of the leaf, and, or shapes")]
    Unrecognized { path: NodePath },

    #[error("{path}: object matches both the `{first}` and `{second}` shapes")]
    Ambiguous {
        path: NodePath,
        first: &'static str,
        second: &'static str,
    },

    #[error("{path}: expected a JSON object, found {found}")]
    NotAnObject { path: NodePath, found: &'static str },

    #[error("{path}: field `{field}` must be {expected}, found {found}")]
    InvalidField {
        path: NodePath,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid JSON: {0}")]
    Json(String),
}

/// A single invariant violation found by the validator
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: NodePath,
    pub kind: ViolationKind,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViolationKind {
    #[error("property name is empty")]
    EmptyProperty,

    #[error("attribute name is empty")]
    EmptyAttributeName,

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("operator `{0}` requires a value")]
    MissingValue(Operator),

    #[error("operator `{0}` does not take a value")]
    UnexpectedValue(Operator),

    #[error("operator `{operator}` expects {expected}, found {found}")]
    WrongValueShape {
        operator: Operator,
        expected: ValueShape,
        found: &'static str,
    },

    #[error("nesting depth exceeds the maximum of {max}")]
    DepthExceeded { max: usize },
}

/// Every violation found in one tree, in traversal order
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} violation(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unrecoverable failures while applying an operand
///
/// Missing properties and type mismatches are not errors; they evaluate to
/// `Verdict::NotApplicable`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("property `{property}`: malformed CIDR `{value}`: {reason}")]
    MalformedCidr {
        property: String,
        value: String,
        reason: String,
    },

    #[error("property `{property}`: malformed IP address `{value}`")]
    MalformedAddress { property: String, value: String },

    #[error("property `{property}`: invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        property: String,
        pattern: String,
        reason: String,
    },
}

/// Main error type for the compliance rule engine
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Batch task failed: {0}")]
    TaskFailed(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::DeserializationError(err.to_string())
    }
}

/// Result type alias for the compliance rule engine
pub type Result<T> = std::result::Result<T, RuleError>;
