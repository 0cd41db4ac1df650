//! Condition evaluator
//!
//! Tri-state evaluation of a validated tree against a property bag. Missing
//! properties and values of the wrong type yield `NotApplicable`; only
//! malformed rule operands (addresses, CIDRs, patterns) are errors.

use crate::condition::cache::get_or_compile_pattern;
use crate::condition::validator::{CheckedJunction, CheckedLeaf, CheckedNode, ValidatedCondition};
use crate::error::EvaluationError;
use crate::operator::{Operand, Operator};
use crate::property::{PropertyBag, PropertyValue};
use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;

/// Outcome of evaluating one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// The property is absent or its value cannot be compared
    NotApplicable,
}

impl Verdict {
    /// Tri-state conjunction: `Fail` dominates `NotApplicable`, which
    /// dominates `Pass`
    #[inline]
    pub fn and(self, other: Verdict) -> Verdict {
        match (self, other) {
            (Verdict::Fail, _) | (_, Verdict::Fail) => Verdict::Fail,
            (Verdict::NotApplicable, _) | (_, Verdict::NotApplicable) => Verdict::NotApplicable,
            (Verdict::Pass, Verdict::Pass) => Verdict::Pass,
        }
    }

    /// Tri-state disjunction: `Pass` dominates `NotApplicable`, which
    /// dominates `Fail`
    #[inline]
    pub fn or(self, other: Verdict) -> Verdict {
        match (self, other) {
            (Verdict::Pass, _) | (_, Verdict::Pass) => Verdict::Pass,
            (Verdict::NotApplicable, _) | (_, Verdict::NotApplicable) => Verdict::NotApplicable,
            (Verdict::Fail, Verdict::Fail) => Verdict::Fail,
        }
    }

    /// Conjunction of every verdict; `Pass` when empty
    pub fn all<I: IntoIterator<Item = Verdict>>(verdicts: I) -> Verdict {
        verdicts.into_iter().fold(Verdict::Pass, Verdict::and)
    }

    /// Disjunction of every verdict; `Fail` when empty
    pub fn any<I: IntoIterator<Item = Verdict>>(verdicts: I) -> Verdict {
        verdicts.into_iter().fold(Verdict::Fail, Verdict::or)
    }

    #[inline]
    fn from_bool(passed: bool) -> Verdict {
        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Per-node evaluation record, mirroring the tree's shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutcome {
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeOutcome>,
}

impl NodeOutcome {
    /// Leaf outcomes with the given verdict, depth first
    pub fn leaves_with(&self, verdict: Verdict) -> Vec<&NodeOutcome> {
        let mut found = Vec::new();
        self.collect_leaves(verdict, &mut found);
        found
    }

    fn collect_leaves<'a>(&'a self, verdict: Verdict, found: &mut Vec<&'a NodeOutcome>) {
        if self.property.is_some() {
            if self.verdict == verdict {
                found.push(self);
            }
            return;
        }
        for child in &self.children {
            child.collect_leaves(verdict, found);
        }
    }
}

/// Evaluates validated trees at a fixed point in time
///
/// The clock only matters for `days_less_than`; pin it with [`Evaluator::at`]
/// to make evaluation reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    now: DateTime<Utc>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Evaluate a validated tree against a property bag
    pub fn evaluate(
        &self,
        condition: &ValidatedCondition,
        bag: &PropertyBag,
    ) -> Result<Verdict, EvaluationError> {
        self.evaluate_node(condition.root(), bag)
    }

    /// Evaluate and keep the verdict of every node
    pub fn explain(
        &self,
        condition: &ValidatedCondition,
        bag: &PropertyBag,
    ) -> Result<NodeOutcome, EvaluationError> {
        self.explain_node(condition.root(), bag)
    }

    fn evaluate_node(
        &self,
        node: &CheckedNode,
        bag: &PropertyBag,
    ) -> Result<Verdict, EvaluationError> {
        match node {
            CheckedNode::Leaf(leaf) => self.evaluate_leaf(leaf, bag),
            // Children are all evaluated: a later NotApplicable or error still
            // has to surface even once the result is decided.
            CheckedNode::And(junction) => Ok(Verdict::all(self.evaluate_children(junction, bag)?)),
            CheckedNode::Or(junction) => Ok(Verdict::any(self.evaluate_children(junction, bag)?)),
        }
    }

    fn evaluate_children(
        &self,
        junction: &CheckedJunction,
        bag: &PropertyBag,
    ) -> Result<Vec<Verdict>, EvaluationError> {
        junction
            .children()
            .iter()
            .map(|child| self.evaluate_node(child, bag))
            .collect()
    }

    fn explain_node(
        &self,
        node: &CheckedNode,
        bag: &PropertyBag,
    ) -> Result<NodeOutcome, EvaluationError> {
        match node {
            CheckedNode::Leaf(leaf) => Ok(NodeOutcome {
                verdict: self.evaluate_leaf(leaf, bag)?,
                description: leaf.description().map(str::to_string),
                property: Some(leaf.property().to_string()),
                operator: Some(leaf.operator()),
                children: Vec::new(),
            }),
            CheckedNode::And(junction) | CheckedNode::Or(junction) => {
                let children = junction
                    .children()
                    .iter()
                    .map(|child| self.explain_node(child, bag))
                    .collect::<Result<Vec<_>, _>>()?;
                let verdicts = children.iter().map(|c| c.verdict);
                let verdict = match node {
                    CheckedNode::And(_) => Verdict::all(verdicts),
                    _ => Verdict::any(verdicts),
                };
                Ok(NodeOutcome {
                    verdict,
                    description: junction.description().map(str::to_string),
                    property: None,
                    operator: None,
                    children,
                })
            }
        }
    }

    /// Evaluate a single comparison
    #[inline]
    pub fn evaluate_leaf(
        &self,
        leaf: &CheckedLeaf,
        bag: &PropertyBag,
    ) -> Result<Verdict, EvaluationError> {
        self.compare(
            leaf.property(),
            leaf.operator(),
            leaf.operand(),
            bag.get(leaf.property()),
        )
    }

    /// Apply one operator; shared with the target attribute matcher
    pub(crate) fn compare(
        &self,
        property: &str,
        operator: Operator,
        operand: &Operand,
        found: Option<&PropertyValue>,
    ) -> Result<Verdict, EvaluationError> {
        let Some(found) = found else {
            return Ok(Verdict::NotApplicable);
        };

        let verdict = match (operator, operand) {
            // Presence and boolean
            (Operator::IsEmpty, _) => Some(found.is_empty_value()),
            (Operator::IsNotEmpty, _) => Some(!found.is_empty_value()),
            (Operator::IsTrue, _) => found.as_bool(),
            (Operator::IsFalse, _) => found.as_bool().map(|b| !b),

            // Strings
            (Operator::StringEquals, Operand::Text(expected)) => {
                found.as_text().map(|s| s == expected)
            }
            (Operator::StringNotEquals, Operand::Text(expected)) => {
                found.as_text().map(|s| s != expected)
            }
            (Operator::StringContains, Operand::Text(needle)) => {
                found.as_text().map(|s| s.contains(needle.as_str()))
            }
            (Operator::StringNotContains, Operand::Text(needle)) => {
                found.as_text().map(|s| !s.contains(needle.as_str()))
            }
            (Operator::StringMatch, Operand::Text(pattern)) => match found.as_text() {
                Some(s) => Some(matches_pattern(property, pattern, s)?),
                None => None,
            },
            (Operator::StringNotMatch, Operand::Text(pattern)) => match found.as_text() {
                Some(s) => Some(!matches_pattern(property, pattern, s)?),
                None => None,
            },

            // String lists
            (Operator::StringsAllowed, Operand::List(allowed)) => found
                .as_list()
                .map(|items| items.iter().all(|item| allowed.contains(item))),
            (Operator::StringsRequired, Operand::List(required)) => found
                .as_list()
                .map(|items| required.iter().all(|item| items.contains(item))),
            (Operator::StringsInList, Operand::List(list)) => {
                found.as_text().map(|s| list.iter().any(|item| item == s))
            }

            // Numbers
            (Operator::NumEquals, Operand::Number(n)) => found.as_number().map(|v| v == *n),
            (Operator::NumNotEquals, Operand::Number(n)) => found.as_number().map(|v| v != *n),
            (Operator::NumGreaterThan, Operand::Number(n)) => found.as_number().map(|v| v > *n),
            (Operator::NumGreaterThanEquals, Operand::Number(n)) => {
                found.as_number().map(|v| v >= *n)
            }
            (Operator::NumLessThan, Operand::Number(n)) => found.as_number().map(|v| v < *n),
            (Operator::NumLessThanEquals, Operand::Number(n)) => {
                found.as_number().map(|v| v <= *n)
            }

            // Addresses
            (Operator::IpsEquals, Operand::Text(expected)) => {
                let expected = parse_address(property, expected)?;
                found.as_ip().map(|ip| ip == expected)
            }
            (Operator::IpsNotEquals, Operand::Text(expected)) => {
                let expected = parse_address(property, expected)?;
                found.as_ip().map(|ip| ip != expected)
            }
            (Operator::IpsInRange, Operand::Text(cidr)) => {
                let network = parse_network(property, cidr)?;
                found.as_ip().map(|ip| network.contains(ip))
            }

            // Time
            (Operator::DaysLessThan, Operand::Number(days)) => found
                .as_timestamp()
                .map(|ts| ((self.now - ts).num_days() as f64) < *days),

            // Operand shape does not fit the operator
            _ => None,
        };

        Ok(verdict.map_or(Verdict::NotApplicable, Verdict::from_bool))
    }
}

/// Regex search, case-sensitive and unanchored
fn matches_pattern(property: &str, pattern: &str, text: &str) -> Result<bool, EvaluationError> {
    let regex = get_or_compile_pattern(pattern).map_err(|e| EvaluationError::InvalidPattern {
        property: property.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(regex.is_match(text))
}

fn parse_address(property: &str, value: &str) -> Result<IpAddr, EvaluationError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| EvaluationError::MalformedAddress {
            property: property.to_string(),
            value: value.to_string(),
        })
}

fn parse_network(property: &str, value: &str) -> Result<IpNetwork, EvaluationError> {
    IpNetwork::from_str(value.trim()).map_err(|e| EvaluationError::MalformedCidr {
        property: property.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
