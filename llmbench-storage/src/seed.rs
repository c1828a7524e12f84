//! Default catalog contents.

/// Models seeded into an empty catalog: (name, company key).
pub const DEFAULT_MODELS: [(&str, &str); 3] = [
    ("GPT-4o", "openai"),
    ("Llama 3.1 70B", "meta"),
    ("Claude 3.5 Sonnet", "anthropic"),
];

/// Metrics seeded into an empty catalog.
pub const DEFAULT_METRICS: [&str; 4] = [
    "ttft",        // Time to first token
    "tps",         // Tokens per second
    "e2e_latency", // End-to-end latency
    "rps",         // Requests per second
];

/// What a seeding pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub models_inserted: usize,
    pub metrics_inserted: usize,
}
