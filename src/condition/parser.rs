//! Structural discriminator
//!
//! Condition nodes carry no type tag on the wire. The variant is decided by
//! which keys are present, checked in this order:
//!
//! 1. non-null `and` - conjunction
//! 2. non-null `or` - disjunction
//! 3. `property` and `operator` - leaf
//!
//! Anything else is unrecognized. Under [`ShapePolicy::Lenient`] an object
//! matching several shapes resolves to the first one in that order; under
//! [`ShapePolicy::Strict`] it is rejected.

use crate::condition::ast::{ConditionNode, Junction, LeafCondition};
use crate::condition::path::{NodePath, PathSegment};
use crate::config::ShapePolicy;
use crate::error::StructuralError;
use crate::operator::OperatorTag;
use crate::property::json_kind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Parse a JSON document into a condition tree using the lenient policy
pub fn parse(json: &str) -> Result<ConditionNode, StructuralError> {
    parse_with(json, ShapePolicy::Lenient)
}

pub fn parse_with(json: &str, policy: ShapePolicy) -> Result<ConditionNode, StructuralError> {
    let value: Value =
        from_str_unbounded(json).map_err(|e| StructuralError::Json(e.to_string()))?;
    parse_value(&value, policy)
}

/// Decode JSON text with no nesting limit
///
/// Trees may nest arbitrarily deep, so serde_json's recursion limit is off
/// and the decoder grows its stack on the heap instead.
pub(crate) fn from_str_unbounded<T: DeserializeOwned>(json: &str) -> serde_json::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Discriminate an already-decoded JSON value
pub fn parse_value(value: &Value, policy: ShapePolicy) -> Result<ConditionNode, StructuralError> {
    discriminate(value, &NodePath::root(), policy)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    And,
    Or,
    Leaf,
}

impl Shape {
    fn name(self) -> &'static str {
        match self {
            Shape::And => "and",
            Shape::Or => "or",
            Shape::Leaf => "leaf",
        }
    }
}

/// Shapes an object matches, in precedence order
fn shapes_of(object: &Map<String, Value>) -> Vec<Shape> {
    let present = |key: &str| object.get(key).is_some_and(|v| !v.is_null());

    let mut shapes = Vec::with_capacity(1);
    if present("and") {
        shapes.push(Shape::And);
    }
    if present("or") {
        shapes.push(Shape::Or);
    }
    if present("property") && present("operator") {
        shapes.push(Shape::Leaf);
    }
    shapes
}

fn discriminate(
    value: &Value,
    path: &NodePath,
    policy: ShapePolicy,
) -> Result<ConditionNode, StructuralError> {
    let object = value.as_object().ok_or_else(|| StructuralError::NotAnObject {
        path: path.clone(),
        found: json_kind(value),
    })?;

    let shapes = shapes_of(object);
    let shape = match shapes.as_slice() {
        [] => return Err(StructuralError::Unrecognized { path: path.clone() }),
        [only] => *only,
        [first, second, ..] => match policy {
            ShapePolicy::Strict => {
                return Err(StructuralError::Ambiguous {
                    path: path.clone(),
                    first: first.name(),
                    second: second.name(),
                })
            }
            ShapePolicy::Lenient => {
                tracing::debug!(
                    path = %path,
                    chosen = first.name(),
                    discarded = second.name(),
                    "ambiguous condition object resolved by precedence"
                );
                *first
            }
        },
    };

    let description = optional_string(object, "description", path)?;

    match shape {
        Shape::And => Ok(ConditionNode::And(Junction {
            description,
            children: parse_children(object, "and", path, policy, PathSegment::And)?,
        })),
        Shape::Or => Ok(ConditionNode::Or(Junction {
            description,
            children: parse_children(object, "or", path, policy, PathSegment::Or)?,
        })),
        Shape::Leaf => {
            let property = required_string(object, "property", path)?;
            let operator = required_string(object, "operator", path)?;
            let value = object.get("value").filter(|v| !v.is_null()).cloned();
            Ok(ConditionNode::Leaf(LeafCondition {
                description,
                property,
                operator: OperatorTag::parse(&operator),
                value,
            }))
        }
    }
}

fn parse_children(
    object: &Map<String, Value>,
    key: &'static str,
    path: &NodePath,
    policy: ShapePolicy,
    segment: fn(usize) -> PathSegment,
) -> Result<Vec<ConditionNode>, StructuralError> {
    let items = match object.get(key) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(StructuralError::InvalidField {
                path: path.clone(),
                field: key,
                expected: "an array",
                found: json_kind(other),
            })
        }
        None => return Ok(Vec::new()),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| discriminate(item, &path.child(segment(i)), policy))
        .collect()
}

fn required_string(
    object: &Map<String, Value>,
    field: &'static str,
    path: &NodePath,
) -> Result<String, StructuralError> {
    optional_string(object, field, path)?.ok_or_else(|| StructuralError::InvalidField {
        path: path.clone(),
        field,
        expected: "a string",
        found: "null",
    })
}

fn optional_string(
    object: &Map<String, Value>,
    field: &'static str,
    path: &NodePath,
) -> Result<Option<String>, StructuralError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StructuralError::InvalidField {
            path: path.clone(),
            field,
            expected: "a string",
            found: json_kind(other),
        }),
    }
}

impl<'de> Deserialize<'de> for ConditionNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_value(&value, ShapePolicy::Lenient).map_err(serde::de::Error::custom)
    }
}
