//! Property bag - the discovered configuration of one resource

use crate::error::RuleError;
use crate::property::PropertyValue;
use ahash::AHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Resource properties keyed by dotted path (e.g. `"encryption.enabled"`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: AHashMap<String, PropertyValue>,
}

impl PropertyBag {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `self` for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a bag from a JSON object, flattening nested objects into
    /// dotted keys
    ///
    /// `{"encryption": {"enabled": true}}` yields `encryption.enabled`.
    /// Arrays holding objects or arrays have no bag representation and are
    /// left out, so conditions on them evaluate as not applicable.
    pub fn from_json(value: &Value) -> Result<Self, RuleError> {
        let object = value.as_object().ok_or_else(|| {
            RuleError::DeserializationError(format!(
                "property bag must be a JSON object, found {}",
                crate::property::json_kind(value)
            ))
        })?;

        let mut bag = PropertyBag::new();
        bag.flatten_into(None, object);
        Ok(bag)
    }

    fn flatten_into(&mut self, prefix: Option<&str>, object: &Map<String, Value>) {
        for (key, value) in object {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, key),
                None => key.clone(),
            };

            match value {
                Value::Object(nested) => self.flatten_into(Some(&path), nested),
                other => match PropertyValue::from_json(other) {
                    Some(converted) => {
                        self.values.insert(path, converted);
                    }
                    None => {
                        tracing::trace!(
                            property = %path,
                            "skipping property with nested array elements"
                        );
                    }
                },
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyBag
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

impl TryFrom<&Value> for PropertyBag {
    type Error = RuleError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        PropertyBag::from_json(value)
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PropertyBag::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattens_nested_objects() {
        let bag = PropertyBag::from_json(&json!({
            "encryption": {"enabled": true, "key": {"rotation_days": 90}},
            "port": 443,
        }))
        .unwrap();

        assert_eq!(bag.len(), 3);
        assert_eq!(bag.get("encryption.enabled"), Some(&PropertyValue::Bool(true)));
        assert_eq!(
            bag.get("encryption.key.rotation_days"),
            Some(&PropertyValue::Number(90.0))
        );
        assert!(!bag.contains("encryption"));
    }

    #[test]
    fn test_dotted_keys_are_kept_verbatim() {
        let bag = PropertyBag::from_json(&json!({"encryption.enabled": false})).unwrap();
        assert_eq!(bag.get("encryption.enabled"), Some(&PropertyValue::Bool(false)));
    }

    #[test]
    fn test_null_is_present_but_nested_arrays_are_not() {
        let bag = PropertyBag::from_json(&json!({
            "tags": null,
            "rules": [{"port": 22}],
        }))
        .unwrap();

        assert_eq!(bag.get("tags"), Some(&PropertyValue::Null));
        assert!(!bag.contains("rules"));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(PropertyBag::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_deserialize_and_collect() {
        let bag: PropertyBag = serde_json::from_str(r#"{"a": {"b": "c"}}"#).unwrap();
        let collected: PropertyBag = [("a.b", "c")].into_iter().collect();
        assert_eq!(bag, collected);
    }
}
