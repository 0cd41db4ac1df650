//! Target attribute matching
//!
//! A target names the service and resource kind a rule covers, narrowed by a
//! flat list of attribute comparisons that are implicitly ANDed. Attribute
//! comparisons share the leaf semantics of condition trees.

use crate::condition::{Evaluator, NodePath, PathSegment, Verdict};
use crate::error::{EvaluationError, ValidationError, Violation, ViolationKind};
use crate::operator::{Operand, Operator, OperatorTag};
use crate::property::PropertyBag;
use serde::{Deserialize, Serialize};

/// The resources a rule applies to, as authored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub service_name: String,
    pub resource_kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_target_attributes: Vec<TargetAttribute>,
}

/// One attribute comparison; the value is always a string on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAttribute {
    pub name: String,
    pub operator: OperatorTag,
    #[serde(default)]
    pub value: String,
}

impl TargetAttribute {
    pub fn new(name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl Target {
    pub fn new(service_name: impl Into<String>, resource_kind: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            resource_kind: resource_kind.into(),
            additional_target_attributes: Vec::new(),
        }
    }

    /// Builder-style helper for adding an attribute comparison
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        self.additional_target_attributes
            .push(TargetAttribute::new(name, operator, value));
        self
    }

    /// Type every attribute operand, collecting all violations
    pub fn check(&self) -> Result<CheckedTarget, ValidationError> {
        let mut violations = Vec::new();
        let mut attributes = Vec::with_capacity(self.additional_target_attributes.len());

        for (i, attribute) in self.additional_target_attributes.iter().enumerate() {
            let path = NodePath::root().child(PathSegment::Attribute(i));
            let before = violations.len();

            if attribute.name.trim().is_empty() {
                violations.push(Violation {
                    path: path.clone(),
                    kind: ViolationKind::EmptyAttributeName,
                });
            }

            let operator = match &attribute.operator {
                OperatorTag::Known(op) => *op,
                OperatorTag::Unknown(tag) => {
                    violations.push(Violation {
                        path,
                        kind: ViolationKind::UnknownOperator(tag.clone()),
                    });
                    continue;
                }
            };

            match Operand::from_attribute(operator, &attribute.value) {
                Ok(operand) if violations.len() == before => attributes.push(CheckedAttribute {
                    name: attribute.name.clone(),
                    operator,
                    operand,
                }),
                Ok(_) => {}
                Err(kind) => violations.push(Violation { path, kind }),
            }
        }

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        Ok(CheckedTarget {
            service_name: self.service_name.clone(),
            resource_kind: self.resource_kind.clone(),
            attributes,
        })
    }
}

/// A target whose attribute operands have been typed
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedTarget {
    service_name: String,
    resource_kind: String,
    attributes: Vec<CheckedAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedAttribute {
    name: String,
    operator: Operator,
    operand: Operand,
}

impl CheckedAttribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

impl CheckedTarget {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn resource_kind(&self) -> &str {
        &self.resource_kind
    }

    pub fn attributes(&self) -> &[CheckedAttribute] {
        &self.attributes
    }

    /// Exact, case-sensitive match on service name and resource kind
    #[inline]
    pub fn covers_kind(&self, service_name: &str, resource_kind: &str) -> bool {
        self.service_name == service_name && self.resource_kind == resource_kind
    }

    /// Conjunction of every attribute comparison; `Pass` when there are none
    pub fn match_attributes(
        &self,
        attributes: &PropertyBag,
        evaluator: &Evaluator,
    ) -> Result<Verdict, EvaluationError> {
        let verdicts = self
            .attributes
            .iter()
            .map(|attribute| {
                evaluator.compare(
                    &attribute.name,
                    attribute.operator,
                    &attribute.operand,
                    attributes.get(&attribute.name),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Verdict::all(verdicts))
    }

    /// Whether a resource is in scope: kind matches and attributes `Pass`
    pub fn selects(
        &self,
        service_name: &str,
        resource_kind: &str,
        attributes: &PropertyBag,
        evaluator: &Evaluator,
    ) -> Result<bool, EvaluationError> {
        if !self.covers_kind(service_name, resource_kind) {
            tracing::trace!(service_name, resource_kind, "resource kind not targeted");
            return Ok(false);
        }
        let verdict = self.match_attributes(attributes, evaluator)?;
        tracing::trace!(?verdict, "target attributes evaluated");
        Ok(verdict == Verdict::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::ValueShape;
    use serde_json::json;

    fn bucket_target() -> Target {
        Target::new("cloud-object-storage", "bucket")
            .with_attribute("location", Operator::StringEquals, "us-south")
            .with_attribute("replicas", Operator::NumGreaterThanEquals, "2")
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let target: Target = serde_json::from_value(json!({
            "service_name": "iam-identity",
            "resource_kind": "accountsettings",
            "additional_target_attributes": [
                {"name": "region", "operator": "strings_in_list", "value": "us-south, eu-de"}
            ]
        }))
        .unwrap();

        assert_eq!(target.additional_target_attributes.len(), 1);
        let checked = target.check().unwrap();
        assert_eq!(
            checked.attributes()[0].operand(),
            &Operand::List(vec!["us-south".to_string(), "eu-de".to_string()])
        );
    }

    #[test]
    fn test_serialize_omits_empty_attributes() {
        let target = Target::new("iam-identity", "accountsettings");
        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({"service_name": "iam-identity", "resource_kind": "accountsettings"})
        );
    }

    #[test]
    fn test_check_collects_violations() {
        let target: Target = serde_json::from_value(json!({
            "service_name": "s",
            "resource_kind": "k",
            "additional_target_attributes": [
                {"name": "", "operator": "string_equals", "value": "x"},
                {"name": "a", "operator": "string_like", "value": "x"},
                {"name": "b", "operator": "num_less_than", "value": "many"}
            ]
        }))
        .unwrap();

        let err = target.check().unwrap_err();
        let found: Vec<String> = err.violations.iter().map(ToString::to_string).collect();
        assert_eq!(
            found,
            vec![
                "$.additional_target_attributes[0]: attribute name is empty".to_string(),
                "$.additional_target_attributes[1]: unknown operator `string_like`".to_string(),
                format!(
                    "$.additional_target_attributes[2]: {}",
                    ViolationKind::WrongValueShape {
                        operator: Operator::NumLessThan,
                        expected: ValueShape::Number,
                        found: "a non-numeric string",
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_match_attributes() {
        let checked = bucket_target().check().unwrap();
        let evaluator = Evaluator::new();

        let matching = PropertyBag::new()
            .with("location", "us-south")
            .with("replicas", 3);
        assert_eq!(checked.match_attributes(&matching, &evaluator).unwrap(), Verdict::Pass);

        let wrong_region = PropertyBag::new()
            .with("location", "eu-de")
            .with("replicas", 3);
        assert_eq!(checked.match_attributes(&wrong_region, &evaluator).unwrap(), Verdict::Fail);

        let partial = PropertyBag::new().with("location", "us-south");
        assert_eq!(
            checked.match_attributes(&partial, &evaluator).unwrap(),
            Verdict::NotApplicable
        );
    }

    #[test]
    fn test_no_attributes_pass() {
        let checked = Target::new("s", "k").check().unwrap();
        assert_eq!(
            checked
                .match_attributes(&PropertyBag::new(), &Evaluator::new())
                .unwrap(),
            Verdict::Pass
        );
    }

    #[test]
    fn test_selects_requires_kind_and_pass() {
        let checked = bucket_target().check().unwrap();
        let evaluator = Evaluator::new();
        let attributes = PropertyBag::new()
            .with("location", "us-south")
            .with("replicas", "2");

        assert!(checked
            .selects("cloud-object-storage", "bucket", &attributes, &evaluator)
            .unwrap());
        assert!(!checked
            .selects("cloud-object-storage", "instance", &attributes, &evaluator)
            .unwrap());
        assert!(!checked
            .selects("cloud-object-storage", "bucket", &PropertyBag::new(), &evaluator)
            .unwrap());
    }

    #[test]
    fn test_malformed_attribute_cidr_is_an_error() {
        let checked = Target::new("s", "k")
            .with_attribute("ip", Operator::IpsInRange, "10.0.0.0/99")
            .check()
            .unwrap();
        let attributes = PropertyBag::new().with("ip", "10.0.0.1");
        assert!(matches!(
            checked.match_attributes(&attributes, &Evaluator::new()),
            Err(EvaluationError::MalformedCidr { .. })
        ));
    }
}
