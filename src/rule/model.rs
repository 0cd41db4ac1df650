//! Rule definitions as exchanged on the wire

use crate::condition::{parser, ConditionNode, Verdict};
use crate::config::{EngineConfig, ShapePolicy};
use crate::error::Result;
use crate::target::Target;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What the service does when a request does not comply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Block the request
    Disallow,
    /// Let the request through and record it
    AuditLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementAction {
    pub action: Enforcement,
}

/// Compliance state reported for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NotCompliant,
    UnableToPerform,
    /// Reserved for checks that need a human; never produced from a verdict
    UserEvaluationRequired,
}

impl From<Verdict> for ComplianceStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => ComplianceStatus::Compliant,
            Verdict::Fail => ComplianceStatus::NotCompliant,
            Verdict::NotApplicable => ComplianceStatus::UnableToPerform,
        }
    }
}

/// A compliance rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub target: Target,
    pub required_config: ConditionNode,
    pub enforcement_actions: Vec<EnforcementAction>,
}

/// Wire shape with the tree left as raw JSON, so the shape policy can be
/// chosen when it is discriminated
#[derive(Deserialize)]
struct RawRule {
    account_id: Option<String>,
    rule_id: Option<String>,
    name: String,
    #[serde(default)]
    description: String,
    rule_type: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    target: Target,
    required_config: Value,
    #[serde(default)]
    enforcement_actions: Vec<EnforcementAction>,
}

impl RawRule {
    fn into_rule(self, policy: ShapePolicy) -> Result<Rule> {
        let required_config = parser::parse_value(&self.required_config, policy)?;
        Ok(Rule {
            account_id: self.account_id,
            rule_id: self.rule_id,
            name: self.name,
            description: self.description,
            rule_type: self.rule_type,
            labels: self.labels,
            target: self.target,
            required_config,
            enforcement_actions: self.enforcement_actions,
        })
    }
}

impl Rule {
    pub fn new(name: impl Into<String>, target: Target, required_config: ConditionNode) -> Self {
        Self {
            account_id: None,
            rule_id: None,
            name: name.into(),
            description: String::new(),
            rule_type: None,
            labels: Vec::new(),
            target,
            required_config,
            enforcement_actions: Vec::new(),
        }
    }

    /// Parse a rule, discriminating `required_config` under the configured
    /// shape policy
    pub fn from_json_str(json: &str, config: &EngineConfig) -> Result<Rule> {
        let raw: RawRule = parser::from_str_unbounded(json)?;
        let rule = raw.into_rule(config.shape_policy)?;
        tracing::debug!(
            rule = %rule.name,
            nodes = rule.required_config.node_count(),
            "rule parsed"
        );
        Ok(rule)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawRule::deserialize(deserializer)?;
        raw.into_rule(ShapePolicy::Lenient)
            .map_err(serde::de::Error::custom)
    }
}
