//! Compiled rules - validated once, assessed against many resources

use crate::condition::{validate, Evaluator, NodeOutcome, ValidatedCondition, Verdict};
use crate::config::EngineConfig;
use crate::error::{EvaluationError, ValidationError};
use crate::rule::{ComplianceStatus, EnforcementAction, Resource, Rule};
use crate::target::CheckedTarget;
use serde::Serialize;

/// Result of assessing one resource against one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule's target does not select the resource
    OutOfScope,
    Assessed {
        verdict: Verdict,
        status: ComplianceStatus,
    },
}

impl RuleOutcome {
    pub fn status(&self) -> Option<ComplianceStatus> {
        match self {
            RuleOutcome::OutOfScope => None,
            RuleOutcome::Assessed { status, .. } => Some(*status),
        }
    }
}

/// A rule whose tree and target have both been validated
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    name: String,
    condition: ValidatedCondition,
    target: CheckedTarget,
    enforcement_actions: Vec<EnforcementAction>,
}

impl Rule {
    /// Validate the tree and the target attributes together
    ///
    /// Violations from both are returned in one error, tree first.
    pub fn compile(&self, config: &EngineConfig) -> Result<CompiledRule, ValidationError> {
        let condition = validate(&self.required_config, config);
        let target = self.target.check();

        match (condition, target) {
            (Ok(condition), Ok(target)) => {
                tracing::debug!(
                    rule = %self.name,
                    attributes = target.attributes().len(),
                    warnings = condition.warnings().len(),
                    "rule compiled"
                );
                Ok(CompiledRule {
                    name: self.name.clone(),
                    condition,
                    target,
                    enforcement_actions: self.enforcement_actions.clone(),
                })
            }
            (condition, target) => {
                let mut violations = Vec::new();
                if let Err(err) = condition {
                    violations.extend(err.violations);
                }
                if let Err(err) = target {
                    violations.extend(err.violations);
                }
                tracing::debug!(rule = %self.name, violations = violations.len(), "rule rejected");
                Err(ValidationError { violations })
            }
        }
    }
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self) -> &ValidatedCondition {
        &self.condition
    }

    pub fn target(&self) -> &CheckedTarget {
        &self.target
    }

    pub fn enforcement_actions(&self) -> &[EnforcementAction] {
        &self.enforcement_actions
    }

    /// Assess one resource
    ///
    /// The condition tree is only evaluated for resources the target selects.
    pub fn assess(
        &self,
        resource: &Resource,
        evaluator: &Evaluator,
    ) -> Result<RuleOutcome, EvaluationError> {
        if !self.in_scope(resource, evaluator)? {
            return Ok(RuleOutcome::OutOfScope);
        }

        let verdict = evaluator.evaluate(&self.condition, &resource.properties)?;
        tracing::trace!(rule = %self.name, ?verdict, "resource assessed");
        Ok(RuleOutcome::Assessed {
            verdict,
            status: verdict.into(),
        })
    }

    /// Per-node breakdown for an in-scope resource; `None` when out of scope
    pub fn explain(
        &self,
        resource: &Resource,
        evaluator: &Evaluator,
    ) -> Result<Option<NodeOutcome>, EvaluationError> {
        if !self.in_scope(resource, evaluator)? {
            return Ok(None);
        }
        evaluator
            .explain(&self.condition, &resource.properties)
            .map(Some)
    }

    #[inline]
    fn in_scope(
        &self,
        resource: &Resource,
        evaluator: &Evaluator,
    ) -> Result<bool, EvaluationError> {
        self.target.selects(
            &resource.service_name,
            &resource.resource_kind,
            &resource.attributes,
            evaluator,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{parse, ConditionNode, NodePath, PathSegment};
    use crate::error::ViolationKind;
    use crate::operator::Operator;
    use crate::target::Target;
    use serde_json::json;

    fn bucket_rule() -> Rule {
        let tree = parse(
            r#"{"and": [
                {"property": "encryption.enabled", "operator": "is_true"},
                {"property": "versioning", "operator": "string_equals", "value": "Enabled"}
            ]}"#,
        )
        .unwrap();
        Rule::new(
            "bucket hardening",
            Target::new("cloud-object-storage", "bucket")
                .with_attribute("location", Operator::StringsInList, "us-south,us-east"),
            tree,
        )
    }

    fn bucket() -> Resource {
        Resource::new("cloud-object-storage", "bucket").with_attribute("location", "us-east")
    }

    #[test]
    fn test_assess_compliant() {
        let rule = bucket_rule().compile(&EngineConfig::default()).unwrap();
        let resource = bucket()
            .with_property("encryption.enabled", true)
            .with_property("versioning", "Enabled");

        let outcome = rule.assess(&resource, &Evaluator::new()).unwrap();
        assert_eq!(
            outcome,
            RuleOutcome::Assessed {
                verdict: Verdict::Pass,
                status: ComplianceStatus::Compliant,
            }
        );
    }

    #[test]
    fn test_assess_not_compliant_and_unable() {
        let rule = bucket_rule().compile(&EngineConfig::default()).unwrap();
        let evaluator = Evaluator::new();

        let failing = bucket()
            .with_property("encryption.enabled", false)
            .with_property("versioning", "Enabled");
        assert_eq!(
            rule.assess(&failing, &evaluator).unwrap().status(),
            Some(ComplianceStatus::NotCompliant)
        );

        let unknown = bucket().with_property("encryption.enabled", true);
        assert_eq!(
            rule.assess(&unknown, &evaluator).unwrap().status(),
            Some(ComplianceStatus::UnableToPerform)
        );
    }

    #[test]
    fn test_out_of_scope() {
        let rule = bucket_rule().compile(&EngineConfig::default()).unwrap();
        let evaluator = Evaluator::new();

        let other_kind = Resource::new("cloud-object-storage", "instance")
            .with_attribute("location", "us-east");
        assert_eq!(rule.assess(&other_kind, &evaluator).unwrap(), RuleOutcome::OutOfScope);

        let other_region = Resource::new("cloud-object-storage", "bucket")
            .with_attribute("location", "eu-de");
        assert_eq!(rule.assess(&other_region, &evaluator).unwrap(), RuleOutcome::OutOfScope);

        let no_attributes = Resource::new("cloud-object-storage", "bucket");
        assert_eq!(rule.assess(&no_attributes, &evaluator).unwrap(), RuleOutcome::OutOfScope);
        assert_eq!(rule.explain(&no_attributes, &evaluator).unwrap(), None);
    }

    #[test]
    fn test_compile_merges_violations() {
        let mut rule = bucket_rule();
        rule.required_config = ConditionNode::or(vec![ConditionNode::leaf(
            "port",
            Operator::NumLessThan,
            None,
        )]);
        rule.target = rule
            .target
            .with_attribute("", Operator::StringEquals, "x");

        let err = rule.compile(&EngineConfig::default()).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert_eq!(err.violations[0].path, NodePath::root().child(PathSegment::Or(0)));
        assert_eq!(
            err.violations[0].kind,
            ViolationKind::MissingValue(Operator::NumLessThan)
        );
        assert_eq!(
            err.violations[1].path,
            NodePath::root().child(PathSegment::Attribute(1))
        );
        assert_eq!(err.violations[1].kind, ViolationKind::EmptyAttributeName);
    }

    #[test]
    fn test_explain_in_scope() {
        let rule = bucket_rule().compile(&EngineConfig::default()).unwrap();
        let resource = bucket()
            .with_property("encryption.enabled", false)
            .with_property("versioning", "Enabled");

        let outcome = rule.explain(&resource, &Evaluator::new()).unwrap().unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        let failed: Vec<_> = outcome
            .leaves_with(Verdict::Fail)
            .into_iter()
            .filter_map(|leaf| leaf.property.as_deref())
            .collect();
        assert_eq!(failed, vec!["encryption.enabled"]);
    }

    #[test]
    fn test_outcome_serialization() {
        let assessed = RuleOutcome::Assessed {
            verdict: Verdict::NotApplicable,
            status: ComplianceStatus::UnableToPerform,
        };
        assert_eq!(
            serde_json::to_value(assessed).unwrap(),
            json!({
                "outcome": "assessed",
                "verdict": "not_applicable",
                "status": "unable_to_perform"
            })
        );
        assert_eq!(
            serde_json::to_value(RuleOutcome::OutOfScope).unwrap(),
            json!({"outcome": "out_of_scope"})
        );
    }
}
