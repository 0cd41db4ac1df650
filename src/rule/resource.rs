//! Resources presented for assessment

use crate::property::{PropertyBag, PropertyValue};
use serde::Deserialize;

/// One discovered resource
///
/// `attributes` feed the target matcher and `properties` feed the
/// condition tree. Both accept nested JSON and flatten it to dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Resource {
    pub service_name: String,
    pub resource_kind: String,
    #[serde(default)]
    pub attributes: PropertyBag,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl Resource {
    pub fn new(service_name: impl Into<String>, resource_kind: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            resource_kind: resource_kind.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key, value);
        self
    }
}
