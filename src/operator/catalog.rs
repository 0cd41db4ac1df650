//! Operator tags and their operand contracts

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Comparison operators, tagged on the wire in snake_case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    StringEquals,
    StringNotEquals,
    StringContains,
    StringNotContains,
    StringMatch,
    StringNotMatch,
    StringsAllowed,
    StringsRequired,
    StringsInList,
    NumEquals,
    NumNotEquals,
    NumGreaterThan,
    NumGreaterThanEquals,
    NumLessThan,
    NumLessThanEquals,
    IpsEquals,
    IpsNotEquals,
    IpsInRange,
    DaysLessThan,
    IsEmpty,
    IsNotEmpty,
    IsTrue,
    IsFalse,
}

/// The kind of resource value an operator compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    String,
    StringList,
    Numeric,
    Ip,
    Temporal,
    Presence,
}

/// JSON shape the rule-side `value` must have for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    None,
    String,
    Number,
    StringList,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueShape::None => "no value",
            ValueShape::String => "a string",
            ValueShape::Number => "a number",
            ValueShape::StringList => "a list of strings",
        })
    }
}

/// Lookup table from wire tag to operator, built once at first use
static CATALOG: Lazy<AHashMap<&'static str, Operator>> = Lazy::new(|| {
    let mut map = AHashMap::with_capacity(Operator::ALL.len());
    for op in Operator::ALL {
        map.insert(op.tag(), op);
    }
    map
});

impl Operator {
    pub const ALL: [Operator; 23] = [
        Operator::StringEquals,
        Operator::StringNotEquals,
        Operator::StringContains,
        Operator::StringNotContains,
        Operator::StringMatch,
        Operator::StringNotMatch,
        Operator::StringsAllowed,
        Operator::StringsRequired,
        Operator::StringsInList,
        Operator::NumEquals,
        Operator::NumNotEquals,
        Operator::NumGreaterThan,
        Operator::NumGreaterThanEquals,
        Operator::NumLessThan,
        Operator::NumLessThanEquals,
        Operator::IpsEquals,
        Operator::IpsNotEquals,
        Operator::IpsInRange,
        Operator::DaysLessThan,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::IsTrue,
        Operator::IsFalse,
    ];

    /// Resolve a wire tag. Tags are case-sensitive.
    #[inline]
    pub fn from_tag(tag: &str) -> Option<Operator> {
        CATALOG.get(tag).copied()
    }

    pub fn tag(self) -> &'static str {
        match self {
            Operator::StringEquals => "string_equals",
            Operator::StringNotEquals => "string_not_equals",
            Operator::StringContains => "string_contains",
            Operator::StringNotContains => "string_not_contains",
            Operator::StringMatch => "string_match",
            Operator::StringNotMatch => "string_not_match",
            Operator::StringsAllowed => "strings_allowed",
            Operator::StringsRequired => "strings_required",
            Operator::StringsInList => "strings_in_list",
            Operator::NumEquals => "num_equals",
            Operator::NumNotEquals => "num_not_equals",
            Operator::NumGreaterThan => "num_greater_than",
            Operator::NumGreaterThanEquals => "num_greater_than_equals",
            Operator::NumLessThan => "num_less_than",
            Operator::NumLessThanEquals => "num_less_than_equals",
            Operator::IpsEquals => "ips_equals",
            Operator::IpsNotEquals => "ips_not_equals",
            Operator::IpsInRange => "ips_in_range",
            Operator::DaysLessThan => "days_less_than",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::IsTrue => "is_true",
            Operator::IsFalse => "is_false",
        }
    }

    pub fn family(self) -> OperatorFamily {
        match self {
            Operator::StringEquals
            | Operator::StringNotEquals
            | Operator::StringContains
            | Operator::StringNotContains
            | Operator::StringMatch
            | Operator::StringNotMatch => OperatorFamily::String,
            Operator::StringsAllowed | Operator::StringsRequired | Operator::StringsInList => {
                OperatorFamily::StringList
            }
            Operator::NumEquals
            | Operator::NumNotEquals
            | Operator::NumGreaterThan
            | Operator::NumGreaterThanEquals
            | Operator::NumLessThan
            | Operator::NumLessThanEquals => OperatorFamily::Numeric,
            Operator::IpsEquals | Operator::IpsNotEquals | Operator::IpsInRange => {
                OperatorFamily::Ip
            }
            Operator::DaysLessThan => OperatorFamily::Temporal,
            Operator::IsEmpty | Operator::IsNotEmpty | Operator::IsTrue | Operator::IsFalse => {
                OperatorFamily::Presence
            }
        }
    }

    /// Shape of the rule-side operand
    pub fn value_shape(self) -> ValueShape {
        match self.family() {
            OperatorFamily::String | OperatorFamily::Ip => ValueShape::String,
            OperatorFamily::StringList => ValueShape::StringList,
            OperatorFamily::Numeric | OperatorFamily::Temporal => ValueShape::Number,
            OperatorFamily::Presence => ValueShape::None,
        }
    }

    /// Number of operands: 0 for presence/boolean operators, 1 otherwise
    #[inline]
    pub fn arity(self) -> usize {
        match self.value_shape() {
            ValueShape::None => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Operator as written by a rule author
///
/// Unrecognized tags are kept verbatim so that the validator can report them
/// and serialization stays lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperatorTag {
    Known(Operator),
    Unknown(String),
}

impl OperatorTag {
    pub fn parse(tag: &str) -> Self {
        match Operator::from_tag(tag) {
            Some(op) => OperatorTag::Known(op),
            None => OperatorTag::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperatorTag::Known(op) => op.tag(),
            OperatorTag::Unknown(tag) => tag,
        }
    }

    pub fn known(&self) -> Option<Operator> {
        match self {
            OperatorTag::Known(op) => Some(*op),
            OperatorTag::Unknown(_) => None,
        }
    }
}

impl From<Operator> for OperatorTag {
    fn from(op: Operator) -> Self {
        OperatorTag::Known(op)
    }
}

impl fmt::Display for OperatorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperatorTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperatorTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(OperatorTag::parse(&tag))
    }
}
