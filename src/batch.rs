//! Batch assessment on the tokio blocking pool
//!
//! Evaluation is synchronous and CPU-bound, so a batch is split into chunks
//! and each chunk runs in its own `spawn_blocking` task. Results come back in
//! input order. Dropping the returned future abandons chunks not yet awaited.

use crate::condition::Evaluator;
use crate::config::EngineConfig;
use crate::error::{EvaluationError, Result, RuleError};
use crate::rule::{CompiledRule, Resource, RuleOutcome};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Outcome for one resource; an evaluation error only affects its own resource
pub type AssessmentResult = std::result::Result<RuleOutcome, EvaluationError>;

/// Assess every resource against one rule, `chunk_size` resources per task
pub async fn assess_all(
    rule: Arc<CompiledRule>,
    resources: Vec<Resource>,
    evaluator: Evaluator,
    chunk_size: usize,
) -> Result<Vec<AssessmentResult>> {
    let chunk_size = chunk_size.max(1);
    let total = resources.len();
    let start_time = std::time::Instant::now();

    let mut handles: Vec<JoinHandle<Vec<AssessmentResult>>> =
        Vec::with_capacity(total.div_ceil(chunk_size));
    let mut remaining = resources.into_iter().peekable();

    while remaining.peek().is_some() {
        let chunk: Vec<Resource> = remaining.by_ref().take(chunk_size).collect();
        let rule = Arc::clone(&rule);
        handles.push(tokio::task::spawn_blocking(move || {
            chunk
                .iter()
                .map(|resource| rule.assess(resource, &evaluator))
                .collect()
        }));
    }

    tracing::debug!(
        rule = rule.name(),
        resources = total,
        chunks = handles.len(),
        "batch assessment started"
    );

    let mut results = Vec::with_capacity(total);
    for handle in handles {
        let chunk = handle
            .await
            .map_err(|e| RuleError::TaskFailed(e.to_string()))?;
        results.extend(chunk);
    }

    tracing::debug!(
        rule = rule.name(),
        resources = total,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "batch assessment finished"
    );

    Ok(results)
}

/// Same as [`assess_all`], with the chunk size taken from the configuration
pub async fn assess_all_with(
    rule: Arc<CompiledRule>,
    resources: Vec<Resource>,
    evaluator: Evaluator,
    config: &EngineConfig,
) -> Result<Vec<AssessmentResult>> {
    assess_all(rule, resources, evaluator, config.batch_chunk_size).await
}
