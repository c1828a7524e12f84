//! Key layout in the shared key-value store.

/// Cached rankings across all metrics.
pub const ALL_RANKINGS: &str = "benchmarks:all";

/// Distributed mutual-exclusion token for pipeline runs.
pub const PIPELINE_LOCK: &str = "retry:lock";

/// Cached rankings for one metric.
pub fn metric_rankings(metric_name: &str) -> String {
    format!("benchmarks:metric:{metric_name}")
}

/// Attempt counter for one (model, metric) work item.
pub fn retry(model_name: &str, metric_name: &str) -> String {
    format!("retry:{model_name}:{metric_name}")
}
