//! Compliance Rule Core - rule requirement trees for cloud configuration checks
//!
//! A rule's `required_config` is a tag-less JSON tree of `and` / `or`
//! combinators over property comparisons. This crate turns that JSON into a
//! typed tree, validates it (collecting every violation with its location) and
//! evaluates it against a resource's properties with tri-state logic:
//! `Pass`, `Fail` or `NotApplicable` when the data needed is missing.
//!
//! ```
//! use compliance_rule_core::{parse, validate, EngineConfig, Evaluator, PropertyBag, Verdict};
//!
//! let tree = parse(r#"{"and": [
//!     {"property": "port", "operator": "num_less_than", "value": 1024},
//!     {"property": "enabled", "operator": "is_true"}
//! ]}"#).unwrap();
//! let condition = validate(&tree, &EngineConfig::default()).unwrap();
//!
//! let bag = PropertyBag::new().with("port", 80).with("enabled", true);
//! assert_eq!(Evaluator::new().evaluate(&condition, &bag).unwrap(), Verdict::Pass);
//! ```

pub mod batch;
pub mod condition;
pub mod config;
pub mod error;
pub mod operator;
pub mod property;
pub mod rule;
pub mod target;

pub use batch::{assess_all, assess_all_with, AssessmentResult};
pub use condition::{
    parse, parse_with, validate, ConditionNode, Evaluator, NodeOutcome, NodePath,
    ValidatedCondition, Verdict,
};
pub use config::{EngineConfig, ShapePolicy};
pub use error::{
    EvaluationError, Result, RuleError, StructuralError, ValidationError, Violation,
    ViolationKind,
};
pub use operator::{Operator, OperatorTag};
pub use property::{PropertyBag, PropertyValue};
pub use rule::{ComplianceStatus, CompiledRule, Resource, Rule, RuleOutcome};
pub use target::{Target, TargetAttribute};
