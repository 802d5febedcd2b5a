//! # Generation Metrics
//!
//! Metrics for generated values and the Secret writes that carry them.
//! Only counts are recorded, never values.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::IntCounter;
use std::sync::LazyLock;

static FIELDS_GENERATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_generator_fields_generated_total",
        "Total number of Secret fields filled with a generated value",
    )
    .expect("Failed to create FIELDS_GENERATED_TOTAL metric - this should never happen")
});

static GENERATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_generator_generation_errors_total",
        "Total number of random source failures",
    )
    .expect("Failed to create GENERATION_ERRORS_TOTAL metric - this should never happen")
});

static SECRETS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_generator_secrets_created_total",
        "Total number of Secrets created for String resources",
    )
    .expect("Failed to create SECRETS_CREATED_TOTAL metric - this should never happen")
});

static SECRETS_UPDATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_generator_secrets_updated_total",
        "Total number of Secret updates",
    )
    .expect("Failed to create SECRETS_UPDATED_TOTAL metric - this should never happen")
});

static SECRETS_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_generator_secrets_skipped_total",
        "Total number of passes that left a Secret alone because it is not owned by a String",
    )
    .expect("Failed to create SECRETS_SKIPPED_TOTAL metric - this should never happen")
});

/// Register generation metrics with the registry
pub(crate) fn register_generation_metrics() -> Result<()> {
    REGISTRY.register(Box::new(FIELDS_GENERATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_SKIPPED_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_fields_generated(count: usize) {
    FIELDS_GENERATED_TOTAL.inc_by(count as u64);
}

pub fn increment_generation_errors() {
    GENERATION_ERRORS_TOTAL.inc();
}

pub fn increment_secrets_created() {
    SECRETS_CREATED_TOTAL.inc();
}

pub fn increment_secrets_updated() {
    SECRETS_UPDATED_TOTAL.inc();
}

pub fn increment_secrets_skipped() {
    SECRETS_SKIPPED_TOTAL.inc();
}
