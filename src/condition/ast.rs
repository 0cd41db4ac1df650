//! Condition tree as authored

use crate::operator::{Operator, OperatorTag};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A node of a rule's `required_config` tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// Single comparison like `port num_less_than 1024`
    Leaf(LeafCondition),
    /// Every child must hold
    And(Junction),
    /// At least one child must hold
    Or(Junction),
}

/// A single property comparison
#[derive(Debug, Clone, PartialEq)]
pub struct LeafCondition {
    pub description: Option<String>,
    pub property: String,
    pub operator: OperatorTag,
    pub value: Option<Value>,
}

/// Children of an `and` / `or` node, in authored order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Junction {
    pub description: Option<String>,
    pub children: Vec<ConditionNode>,
}

impl ConditionNode {
    pub fn leaf(property: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        ConditionNode::Leaf(LeafCondition {
            description: None,
            property: property.into(),
            operator: operator.into(),
            value,
        })
    }

    pub fn and(children: Vec<ConditionNode>) -> Self {
        ConditionNode::And(Junction {
            description: None,
            children,
        })
    }

    pub fn or(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Or(Junction {
            description: None,
            children,
        })
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            ConditionNode::Leaf(leaf) => &mut leaf.description,
            ConditionNode::And(junction) | ConditionNode::Or(junction) => &mut junction.description,
        };
        *slot = Some(text.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ConditionNode::Leaf(leaf) => leaf.description.as_deref(),
            ConditionNode::And(junction) | ConditionNode::Or(junction) => {
                junction.description.as_deref()
            }
        }
    }

    /// Total number of nodes, this one included
    pub fn node_count(&self) -> usize {
        match self {
            ConditionNode::Leaf(_) => 1,
            ConditionNode::And(junction) | ConditionNode::Or(junction) => {
                1 + junction.children.iter().map(ConditionNode::node_count).sum::<usize>()
            }
        }
    }
}

// The wire format has no type tag: the variant is implied by which keys are
// present, so serialization writes the bare shape.
impl Serialize for ConditionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(description) = self.description() {
            map.serialize_entry("description", description)?;
        }
        match self {
            ConditionNode::Leaf(leaf) => {
                map.serialize_entry("property", &leaf.property)?;
                map.serialize_entry("operator", &leaf.operator)?;
                if let Some(value) = &leaf.value {
                    map.serialize_entry("value", value)?;
                }
            }
            ConditionNode::And(junction) => map.serialize_entry("and", &junction.children)?,
            ConditionNode::Or(junction) => map.serialize_entry("or", &junction.children)?,
        }
        map.end()
    }
}
