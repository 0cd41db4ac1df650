//! Dynamically typed resource property values and their coercions

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::net::IpAddr;

/// A discovered resource property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// Convert a JSON scalar or array of scalars
    ///
    /// Returns `None` for objects and for arrays holding objects or arrays;
    /// nested objects are flattened by `PropertyBag` instead.
    pub fn from_json(value: &Value) -> Option<PropertyValue> {
        match value {
            Value::Null => Some(PropertyValue::Null),
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Null => {}
                        Value::String(s) => list.push(s.clone()),
                        Value::Bool(b) => list.push(b.to_string()),
                        Value::Number(n) => list.push(n.to_string()),
                        Value::Array(_) | Value::Object(_) => return None,
                    }
                }
                Some(PropertyValue::List(list))
            }
            Value::Object(_) => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Finite numbers, or strings holding one
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    /// Booleans only; `"true"` as a string is not a boolean
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        self.as_text()
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .map(|ip| ip.to_canonical())
    }

    /// RFC 3339 strings, or numbers read as unix seconds
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            PropertyValue::Number(n) if n.is_finite() => {
                Utc.timestamp_opt(n.trunc() as i64, 0).single()
            }
            _ => None,
        }
    }

    /// Null, the empty string and the empty list are empty
    pub fn is_empty_value(&self) -> bool {
        match self {
            PropertyValue::Null => true,
            PropertyValue::String(s) => s.is_empty(),
            PropertyValue::List(items) => items.is_empty(),
            PropertyValue::Bool(_) | PropertyValue::Number(_) => false,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Number(f64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(value: Vec<&str>) -> Self {
        PropertyValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Human-readable name of a JSON value's type, for error messages
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
