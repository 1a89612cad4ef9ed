//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! Secret and field names are fixed by the surrounding monitoring stack. The
//! runtime values are defaults that can be overridden via environment variables.

/// Secret holding the full Alertmanager configuration
pub const ALERTMANAGER_SECRET_NAME: &str = "alertmanager-main";

/// Data field of [`ALERTMANAGER_SECRET_NAME`] holding the YAML document
pub const ALERTMANAGER_CONFIG_KEY: &str = "alertmanager.yaml";

/// Secret holding the PagerDuty integration key
pub const PAGERDUTY_SECRET_NAME: &str = "pd-secret";

/// Data field of [`PAGERDUTY_SECRET_NAME`] holding the routing key
pub const PAGERDUTY_SECRET_KEY: &str = "PAGERDUTY_KEY";

/// Secret holding the Dead Man's Snitch check-in URL
pub const SNITCH_SECRET_NAME: &str = "dms-secret";

/// Data field of [`SNITCH_SECRET_NAME`] holding the webhook URL
pub const SNITCH_SECRET_KEY: &str = "SNITCH_URL";

/// Receiver name owned by the PagerDuty integration
pub const PAGERDUTY_RECEIVER_NAME: &str = "pagerduty";

/// Receiver name owned by the Dead Man's Snitch integration
pub const WATCHDOG_RECEIVER_NAME: &str = "watchdog";

/// Alert that fires continuously so the heartbeat receiver keeps checking in
pub const WATCHDOG_ALERT_NAME: &str = "Watchdog";

/// Renotification cadence for the heartbeat route
pub const WATCHDOG_REPEAT_INTERVAL: &str = "5m";

/// Namespaces whose alerts are paged out
pub const PAGERDUTY_NAMESPACE_REGEX: &str =
    "^openshift$|openshift-.*|default$|kube$|kube-.*|logging$";

/// Default namespace the controller watches
pub const DEFAULT_WATCH_NAMESPACE: &str = "openshift-monitoring";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default minimum backoff before a failed trigger is redelivered (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum backoff before a failed trigger is redelivered (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default number of passes allowed to run at once
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: usize = 4;

/// Field manager recorded on writes to the configuration secret
pub const FIELD_MANAGER: &str = "alertmanager-config-controller";
