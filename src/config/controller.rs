//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
    DEFAULT_METRICS_PORT, DEFAULT_WATCH_NAMESPACE, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::str::FromStr;
use std::time::Duration;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human readable lines
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(format!("unknown log format '{other}', expected json or text")),
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace holding the Alertmanager and credential secrets
    pub watch_namespace: String,
    /// Label selector applied when listing sibling secrets
    /// `None` lists every secret in the namespace
    pub secret_label_selector: Option<String>,
    /// HTTP port for metrics and probes
    pub metrics_port: u16,
    /// Smallest delay before a failed trigger is redelivered (seconds)
    pub backoff_min_secs: u64,
    /// Largest delay before a failed trigger is redelivered (seconds)
    pub backoff_max_secs: u64,
    /// Delay before the watch stream is restarted after it ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Maximum number of passes running at once
    pub max_concurrent_reconciliations: usize,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: DEFAULT_WATCH_NAMESPACE.to_string(),
            secret_label_selector: None,
            metrics_port: DEFAULT_METRICS_PORT,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            watch_namespace: lookup("WATCH_NAMESPACE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.watch_namespace),
            secret_label_selector: lookup("SECRET_LABEL_SELECTOR")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            metrics_port: parse_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            backoff_min_secs: parse_or(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min_secs),
            backoff_max_secs: parse_or(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max_secs),
            watch_restart_delay_secs: parse_or(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                defaults.watch_restart_delay_secs,
            ),
            max_concurrent_reconciliations: parse_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            )
            .max(1),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format),
        }
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// Parse a value from the lookup or return the default
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ControllerConfig::from_lookup(|_| None);
        assert_eq!(config.watch_namespace, "openshift-monitoring");
        assert_eq!(config.secret_label_selector, None);
        assert_eq!(config.metrics_port, 5000);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("WATCH_NAMESPACE", "monitoring"),
            ("SECRET_LABEL_SELECTOR", "k8s-app=alertmanager-config-operator"),
            ("METRICS_PORT", "9090"),
            ("LOG_FORMAT", "text"),
            ("MAX_CONCURRENT_RECONCILIATIONS", "8"),
        ]));
        assert_eq!(config.watch_namespace, "monitoring");
        assert_eq!(
            config.secret_label_selector.as_deref(),
            Some("k8s-app=alertmanager-config-operator")
        );
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.max_concurrent_reconciliations, 8);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("METRICS_PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("MAX_CONCURRENT_RECONCILIATIONS", "0"),
            ("SECRET_LABEL_SELECTOR", "   "),
        ]));
        assert_eq!(config.metrics_port, 5000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_concurrent_reconciliations, 1);
        assert_eq!(config.secret_label_selector, None);
    }
}
