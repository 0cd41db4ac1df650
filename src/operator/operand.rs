//! Typed rule-side operands

use crate::error::ViolationKind;
use crate::operator::{Operator, ValueShape};
use crate::property::json_kind;
use serde_json::Value;

/// A rule operand, typed by the operator that consumes it
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl Operand {
    /// Type the `value` of a condition leaf according to `operator`
    pub fn from_json(operator: Operator, value: Option<&Value>) -> Result<Operand, ViolationKind> {
        let shape = operator.value_shape();
        let value = match (shape, value) {
            (ValueShape::None, None) => return Ok(Operand::None),
            (ValueShape::None, Some(_)) => return Err(ViolationKind::UnexpectedValue(operator)),
            (_, None) => return Err(ViolationKind::MissingValue(operator)),
            (_, Some(value)) => value,
        };

        let wrong_shape = |found: &'static str| ViolationKind::WrongValueShape {
            operator,
            expected: shape,
            found,
        };

        match (shape, value) {
            (ValueShape::String, Value::String(s)) => Ok(Operand::Text(s.clone())),
            (ValueShape::Number, Value::Number(n)) => n
                .as_f64()
                .map(Operand::Number)
                .ok_or_else(|| wrong_shape("an unrepresentable number")),
            (ValueShape::StringList, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Operand::List)
                .ok_or_else(|| wrong_shape("a list with non-string elements")),
            (_, other) => Err(wrong_shape(json_kind(other))),
        }
    }

    /// Type the string `value` of a target attribute according to `operator`
    ///
    /// Attribute values are always strings on the wire: numbers are parsed and
    /// string lists are comma-separated. Value-less operators ignore the text.
    pub fn from_attribute(operator: Operator, value: &str) -> Result<Operand, ViolationKind> {
        match operator.value_shape() {
            ValueShape::None => Ok(Operand::None),
            ValueShape::String => Ok(Operand::Text(value.to_string())),
            ValueShape::Number => match value.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Operand::Number(n)),
                _ => Err(ViolationKind::WrongValueShape {
                    operator,
                    expected: ValueShape::Number,
                    found: "a non-numeric string",
                }),
            },
            ValueShape::StringList => Ok(Operand::List(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }
}
