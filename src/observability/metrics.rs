//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `alertmanager_config_reconciliations_total{outcome}` - Passes by outcome
//! - `alertmanager_config_reconciliation_errors_total{kind}` - Failed passes by error kind
//! - `alertmanager_config_reconciliation_duration_seconds` - Duration of passes
//! - `alertmanager_config_updates_total` - Writes of the configuration secret
//! - `alertmanager_config_channel_changes_total{integration,change}` - Merge results per integration
//! - `alertmanager_config_integration_enabled{integration}` - 1 when the integration was configured by the last pass
//! - `alertmanager_config_requeues_total` - Triggers scheduled for redelivery
//! - `alertmanager_config_watch_errors_total` - Errors surfaced by the watch stream

use crate::alertmanager::{ChannelChange, Integration};
use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "alertmanager_config_reconciliations_total",
            "Total number of reconciliation passes by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "alertmanager_config_reconciliation_errors_total",
            "Total number of failed reconciliation passes by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "alertmanager_config_reconciliation_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static CONFIG_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "alertmanager_config_updates_total",
        "Total number of writes of the Alertmanager configuration secret",
    )
    .expect("Failed to create CONFIG_UPDATES_TOTAL metric - this should never happen")
});

static CHANNEL_CHANGES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "alertmanager_config_channel_changes_total",
            "Total number of merge results per integration",
        ),
        &["integration", "change"],
    )
    .expect("Failed to create CHANNEL_CHANGES_TOTAL metric - this should never happen")
});

static INTEGRATION_ENABLED: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "alertmanager_config_integration_enabled",
            "Whether the integration was configured by the last successful pass",
        ),
        &["integration"],
    )
    .expect("Failed to create INTEGRATION_ENABLED metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "alertmanager_config_requeues_total",
        "Total number of triggers scheduled for redelivery",
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static WATCH_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "alertmanager_config_watch_errors_total",
        "Total number of errors surfaced by the secret watch stream",
    )
    .expect("Failed to create WATCH_ERRORS_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry
///
/// # Errors
///
/// Returns an error if a metric is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CONFIG_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CHANNEL_CHANGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(INTEGRATION_ENABLED.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WATCH_ERRORS_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(outcome: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_config_updates() {
    CONFIG_UPDATES_TOTAL.inc();
}

pub fn record_channel_change(integration: Integration, change: ChannelChange) {
    CHANNEL_CHANGES_TOTAL
        .with_label_values(&[integration.as_str(), change.as_str()])
        .inc();
}

pub fn set_integration_enabled(integration: Integration, enabled: bool) {
    INTEGRATION_ENABLED
        .with_label_values(&[integration.as_str()])
        .set(i64::from(enabled));
}

/// Current value of the integration gauge, 1 when configured
#[must_use]
pub fn integration_enabled(integration: Integration) -> i64 {
    INTEGRATION_ENABLED
        .with_label_values(&[integration.as_str()])
        .get()
}

pub fn increment_requeues() {
    REQUEUES_TOTAL.inc();
}

pub fn increment_watch_errors() {
    WATCH_ERRORS_TOTAL.inc();
}
