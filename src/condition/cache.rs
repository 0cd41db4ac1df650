//! Process-wide caches for compiled patterns and validated trees

use crate::condition::evaluator::{Evaluator, Verdict};
use crate::condition::parser;
use crate::condition::validator::{validate, ValidatedCondition};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::property::PropertyBag;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::sync::Arc;

/// Compiled `string_match` patterns keyed by source text
static PATTERN_CACHE: Lazy<RwLock<AHashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(256)));

/// Validated trees keyed by their JSON text, built with the default config
static CONDITION_CACHE: Lazy<RwLock<AHashMap<String, Arc<ValidatedCondition>>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(1024)));

/// Get or compile a regex pattern
#[inline]
pub fn get_or_compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    // Fast path: check read lock first
    {
        let cache = PATTERN_CACHE.read();
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
    }

    // Slow path: compile and cache
    let regex = Regex::new(pattern)?;

    {
        let mut cache = PATTERN_CACHE.write();
        cache.insert(pattern.to_string(), regex.clone());
    }

    Ok(regex)
}

/// Get or parse and validate a `required_config` JSON document
///
/// Uses `EngineConfig::default()`; callers with a custom configuration
/// should parse and validate directly.
pub fn get_or_compile(json: &str) -> Result<Arc<ValidatedCondition>> {
    {
        let cache = CONDITION_CACHE.read();
        if let Some(condition) = cache.get(json) {
            return Ok(Arc::clone(condition));
        }
    }

    let config = EngineConfig::default();
    let tree = parser::parse_with(json, config.shape_policy)?;
    let condition = Arc::new(validate(&tree, &config)?);

    {
        let mut cache = CONDITION_CACHE.write();
        cache.insert(json.to_string(), Arc::clone(&condition));
    }

    Ok(condition)
}

/// Evaluate a `required_config` JSON document against a bag, using the cached tree
#[inline]
pub fn check_condition(json: &str, bag: &PropertyBag, evaluator: &Evaluator) -> Result<Verdict> {
    let condition = get_or_compile(json)?;
    Ok(evaluator.evaluate(&condition, bag)?)
}

/// Clear both caches (useful for testing)
pub fn clear_cache() {
    PATTERN_CACHE.write().clear();
    CONDITION_CACHE.write().clear();
}

/// Number of cached trees
pub fn cache_size() -> usize {
    CONDITION_CACHE.read().len()
}
