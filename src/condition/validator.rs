//! Validator - turns an authored tree into an evaluable one
//!
//! Every violation in the tree is collected before returning, so authoring
//! tools can show the complete list at once. A tree that passes validation
//! has every leaf operand typed by its operator.

use crate::condition::ast::{ConditionNode, Junction, LeafCondition};
use crate::condition::path::{NodePath, PathSegment};
use crate::config::EngineConfig;
use crate::error::{ValidationError, Violation, ViolationKind};
use crate::operator::{Operand, Operator, OperatorTag};
use serde::{Serialize, Serializer};
use std::fmt;

/// A validated, immutable condition tree
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCondition {
    root: CheckedNode,
    source: ConditionNode,
    warnings: Vec<ValidationWarning>,
}

impl ValidatedCondition {
    #[inline]
    pub fn root(&self) -> &CheckedNode {
        &self.root
    }

    /// The tree as it was authored
    #[inline]
    pub fn source(&self) -> &ConditionNode {
        &self.source
    }

    #[inline]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }
}

impl Serialize for ValidatedCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.source.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckedNode {
    Leaf(CheckedLeaf),
    And(CheckedJunction),
    Or(CheckedJunction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedLeaf {
    description: Option<String>,
    property: String,
    operator: Operator,
    operand: Operand,
}

impl CheckedLeaf {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedJunction {
    description: Option<String>,
    children: Vec<CheckedNode>,
}

impl CheckedJunction {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn children(&self) -> &[CheckedNode] {
        &self.children
    }
}

/// Non-fatal advisory about a valid tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub path: NodePath,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// `and: []` always passes
    VacuousAnd,
    /// `or: []` always fails
    VacuousOr,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::VacuousAnd => write!(f, "{}: empty `and` always passes", self.path),
            WarningKind::VacuousOr => write!(f, "{}: empty `or` always fails", self.path),
        }
    }
}

/// Validate a tree, collecting every violation
pub fn validate(
    node: &ConditionNode,
    config: &EngineConfig,
) -> Result<ValidatedCondition, ValidationError> {
    let mut pass = ValidationPass {
        max_depth: config.max_depth,
        violations: Vec::new(),
        warnings: Vec::new(),
    };

    let root = pass.check(node, &NodePath::root(), false);

    match root {
        Some(root) if pass.violations.is_empty() => {
            for warning in &pass.warnings {
                tracing::warn!(%warning, "vacuous condition");
            }
            tracing::debug!(nodes = node.node_count(), "condition tree validated");
            Ok(ValidatedCondition {
                root,
                source: node.clone(),
                warnings: pass.warnings,
            })
        }
        _ => {
            tracing::debug!(
                violations = pass.violations.len(),
                "condition tree rejected"
            );
            Err(ValidationError {
                violations: pass.violations,
            })
        }
    }
}

#[derive(Clone, Copy)]
enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn segment(self, index: usize) -> PathSegment {
        match self {
            Combinator::And => PathSegment::And(index),
            Combinator::Or => PathSegment::Or(index),
        }
    }
}

struct ValidationPass {
    max_depth: Option<usize>,
    violations: Vec<Violation>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationPass {
    fn violation(&mut self, path: &NodePath, kind: ViolationKind) {
        self.violations.push(Violation {
            path: path.clone(),
            kind,
        });
    }

    /// Returns `None` when the subtree has violations
    fn check(
        &mut self,
        node: &ConditionNode,
        path: &NodePath,
        depth_reported: bool,
    ) -> Option<CheckedNode> {
        match node {
            ConditionNode::Leaf(leaf) => self.check_leaf(leaf, path).map(CheckedNode::Leaf),
            ConditionNode::And(junction) => self
                .check_junction(junction, path, depth_reported, Combinator::And)
                .map(CheckedNode::And),
            ConditionNode::Or(junction) => self
                .check_junction(junction, path, depth_reported, Combinator::Or)
                .map(CheckedNode::Or),
        }
    }

    fn check_junction(
        &mut self,
        junction: &Junction,
        path: &NodePath,
        mut depth_reported: bool,
        combinator: Combinator,
    ) -> Option<CheckedJunction> {
        if let Some(max) = self.max_depth {
            // Report once per branch, at the shallowest offending node
            if path.depth() > max && !depth_reported {
                self.violation(path, ViolationKind::DepthExceeded { max });
                depth_reported = true;
            }
        }

        if junction.children.is_empty() {
            let kind = match combinator {
                Combinator::And => WarningKind::VacuousAnd,
                Combinator::Or => WarningKind::VacuousOr,
            };
            self.warnings.push(ValidationWarning {
                path: path.clone(),
                kind,
            });
        }

        let checked: Vec<Option<CheckedNode>> = junction
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| self.check(child, &path.child(combinator.segment(i)), depth_reported))
            .collect();

        let children = checked.into_iter().collect::<Option<Vec<_>>>()?;
        Some(CheckedJunction {
            description: junction.description.clone(),
            children,
        })
    }

    fn check_leaf(&mut self, leaf: &LeafCondition, path: &NodePath) -> Option<CheckedLeaf> {
        let before = self.violations.len();

        if leaf.property.trim().is_empty() {
            self.violation(path, ViolationKind::EmptyProperty);
        }

        let operator = match &leaf.operator {
            OperatorTag::Known(op) => Some(*op),
            OperatorTag::Unknown(tag) => {
                self.violation(path, ViolationKind::UnknownOperator(tag.clone()));
                None
            }
        };

        let operand = operator.and_then(|op| match Operand::from_json(op, leaf.value.as_ref()) {
            Ok(operand) => Some(operand),
            Err(kind) => {
                self.violation(path, kind);
                None
            }
        });

        if self.violations.len() > before {
            return None;
        }

        Some(CheckedLeaf {
            description: leaf.description.clone(),
            property: leaf.property.clone(),
            operator: operator?,
            operand: operand?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::parser::parse;
    use crate::operator::ValueShape;
    use serde_json::json;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_valid_tree_types_operands() {
        let tree = ConditionNode::and(vec![
            ConditionNode::leaf("port", Operator::NumLessThan, Some(json!(1024))),
            ConditionNode::leaf("enabled", Operator::IsTrue, None),
        ]);
        let validated = validate(&tree, &config()).unwrap();

        match validated.root() {
            CheckedNode::And(junction) => match &junction.children()[0] {
                CheckedNode::Leaf(leaf) => {
                    assert_eq!(leaf.property(), "port");
                    assert_eq!(leaf.operand(), &Operand::Number(1024.0));
                }
                _ => panic!("Expected leaf"),
            },
            _ => panic!("Expected and"),
        }
        assert!(validated.warnings().is_empty());
        assert_eq!(validated.source(), &tree);
    }

    #[test]
    fn test_collects_every_violation() {
        let tree = parse(
            r#"{"and": [
                {"property": "", "operator": "is_true"},
                {"property": "a", "operator": "string_like", "value": "x"},
                {"or": [
                    {"property": "b", "operator": "num_equals", "value": "ten"},
                    {"property": "c", "operator": "is_false", "value": false},
                    {"property": "d", "operator": "strings_in_list"}
                ]}
            ]}"#,
        )
        .unwrap();

        let err = validate(&tree, &config()).unwrap_err();
        let found: Vec<(String, ViolationKind)> = err
            .violations
            .iter()
            .map(|v| (v.path.to_string(), v.kind.clone()))
            .collect();

        assert_eq!(
            found,
            vec![
                ("$.and[0]".to_string(), ViolationKind::EmptyProperty),
                (
                    "$.and[1]".to_string(),
                    ViolationKind::UnknownOperator("string_like".to_string())
                ),
                (
                    "$.and[2].or[0]".to_string(),
                    ViolationKind::WrongValueShape {
                        operator: Operator::NumEquals,
                        expected: ValueShape::Number,
                        found: "a string",
                    }
                ),
                (
                    "$.and[2].or[1]".to_string(),
                    ViolationKind::UnexpectedValue(Operator::IsFalse)
                ),
                (
                    "$.and[2].or[2]".to_string(),
                    ViolationKind::MissingValue(Operator::StringsInList)
                ),
            ]
        );
    }

    #[test]
    fn test_leaf_with_two_problems() {
        let tree = parse(r#"{"property": " ", "operator": "bogus"}"#).unwrap();
        let err = validate(&tree, &config()).unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_vacuous_junctions_warn() {
        let tree = ConditionNode::and(vec![ConditionNode::or(vec![]), ConditionNode::and(vec![])]);
        let validated = validate(&tree, &config()).unwrap();
        let kinds: Vec<(String, WarningKind)> = validated
            .warnings()
            .iter()
            .map(|w| (w.path.to_string(), w.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("$.and[0]".to_string(), WarningKind::VacuousOr),
                ("$.and[1]".to_string(), WarningKind::VacuousAnd),
            ]
        );
    }

    #[test]
    fn test_max_depth() {
        let tree = ConditionNode::and(vec![ConditionNode::or(vec![ConditionNode::and(vec![
            ConditionNode::or(vec![ConditionNode::leaf("a", Operator::IsTrue, None)]),
        ])])]);

        let mut config = config();
        config.max_depth = Some(1);
        let err = validate(&tree, &config).unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation {
                path: NodePath::root()
                    .child(PathSegment::And(0))
                    .child(PathSegment::Or(0)),
                kind: ViolationKind::DepthExceeded { max: 1 },
            }]
        );

        config.max_depth = Some(3);
        assert!(validate(&tree, &config).is_ok());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let invalid = parse(r#"{"or": [{"property": "a", "operator": "num_equals"}]}"#).unwrap();
        let first = validate(&invalid, &config()).unwrap_err();
        let second = validate(&invalid, &config()).unwrap_err();
        assert_eq!(first, second);

        let valid = ConditionNode::leaf("a", Operator::IsTrue, None);
        let once = validate(&valid, &config()).unwrap();
        let twice = validate(once.source(), &config()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_error_message_lists_violations() {
        let tree = parse(r#"{"property": "a", "operator": "num_equals"}"#).unwrap();
        let err = validate(&tree, &config()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "1 violation(s): $: operator `num_equals` requires a value"
        );
    }
}
