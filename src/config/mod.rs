//! Engine configuration
//!
//! Deserialized from JSON; every field has a default so an empty object is
//! a valid configuration.

use crate::error::{Result, RuleError};
use serde::Deserialize;

/// How the discriminator treats an object that matches more than one shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapePolicy {
    /// `and` wins over `or`, and either wins over leaf fields, which are dropped
    #[default]
    Lenient,
    /// Ambiguous objects are rejected
    Strict,
}

/// Configuration shared by the discriminator, validator and batch runner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub shape_policy: ShapePolicy,
    /// Deepest `and`/`or` nesting accepted by the validator; the root is depth 0
    pub max_depth: Option<usize>,
    /// Resources handed to one blocking task by the batch runner
    pub batch_chunk_size: usize,
}

fn default_batch_chunk_size() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shape_policy: ShapePolicy::default(),
            max_depth: None,
            batch_chunk_size: default_batch_chunk_size(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if config.batch_chunk_size == 0 {
            return Err(RuleError::DeserializationError(
                "batch_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn strict() -> Self {
        Self {
            shape_policy: ShapePolicy::Strict,
            ..Self::default()
        }
    }
}
