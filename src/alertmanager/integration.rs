//! # Integrations
//!
//! The two notification integrations whose presence is driven by credential
//! secrets, and the canonical receiver/route each one owns.
//!
//! Canonical payloads are built purely from the credential value: no
//! timestamps, no randomness. Rebuilding them from the same value always
//! yields an equal structure, which is what makes the merge idempotent.

use crate::alertmanager::types::{PagerdutyConfig, Receiver, Route, WebhookConfig};
use crate::constants::{
    PAGERDUTY_NAMESPACE_REGEX, PAGERDUTY_RECEIVER_NAME, PAGERDUTY_SECRET_KEY,
    PAGERDUTY_SECRET_NAME, SNITCH_SECRET_KEY, SNITCH_SECRET_NAME, WATCHDOG_ALERT_NAME,
    WATCHDOG_RECEIVER_NAME, WATCHDOG_REPEAT_INTERVAL,
};
use std::collections::BTreeMap;
use std::fmt;

const PAGERDUTY_DESCRIPTION: &str =
    "{{ .CommonLabels.alertname }} {{ .CommonLabels.severity | toUpper }} ({{ len .Alerts }})";

const PAGERDUTY_DETAILS: [(&str, &str); 6] = [
    ("link", "{{ .CommonAnnotations.link }}?"),
    ("group", "{{ .CommonLabels.alertname }}"),
    ("component", "{{ .CommonLabels.alertname }}"),
    ("num_firing", "{{ .Alerts.Firing | len }}"),
    ("num_resolved", "{{ .Alerts.Resolved | len }}"),
    (
        "resolved",
        "{{ template \"pagerduty.default.instances\" .Alerts.Resolved }}",
    ),
];

/// A monitored integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Integration {
    /// PagerDuty paging, keyed by `pd-secret`
    PagerDuty,
    /// Dead Man's Snitch heartbeat, keyed by `dms-secret`
    Watchdog,
}

impl Integration {
    /// Every integration, in the order a pass evaluates them
    pub const ALL: [Integration; 2] = [Integration::PagerDuty, Integration::Watchdog];

    /// Resolve the integration that owns a credential secret
    #[must_use]
    pub fn from_secret_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.secret_name() == name)
    }

    /// Name of the credential secret
    #[must_use]
    pub const fn secret_name(self) -> &'static str {
        match self {
            Self::PagerDuty => PAGERDUTY_SECRET_NAME,
            Self::Watchdog => SNITCH_SECRET_NAME,
        }
    }

    /// Data field of the credential secret carrying the value
    #[must_use]
    pub const fn secret_key(self) -> &'static str {
        match self {
            Self::PagerDuty => PAGERDUTY_SECRET_KEY,
            Self::Watchdog => SNITCH_SECRET_KEY,
        }
    }

    /// Receiver name this integration owns in the configuration
    #[must_use]
    pub const fn receiver_name(self) -> &'static str {
        match self {
            Self::PagerDuty => PAGERDUTY_RECEIVER_NAME,
            Self::Watchdog => WATCHDOG_RECEIVER_NAME,
        }
    }

    /// Canonical receiver for the given credential value
    #[must_use]
    pub fn receiver(self, secret_value: &str) -> Receiver {
        let mut receiver = Receiver::named(self.receiver_name());
        self.apply_channel(&mut receiver, secret_value);
        receiver
    }

    /// Overwrite this integration's channel on an existing receiver
    ///
    /// Channels of other kinds on the receiver are left alone.
    pub fn apply_channel(self, receiver: &mut Receiver, secret_value: &str) {
        match self {
            Self::PagerDuty => {
                receiver.pagerduty_configs = vec![pagerduty_config(secret_value)];
            }
            Self::Watchdog => {
                receiver.webhook_configs = vec![WebhookConfig {
                    send_resolved: Some(false),
                    url: Some(secret_value.to_string()),
                    ..WebhookConfig::default()
                }];
            }
        }
    }

    /// Canonical route delivering to this integration's receiver
    #[must_use]
    pub fn route(self) -> Route {
        match self {
            Self::PagerDuty => Route {
                receiver: Some(PAGERDUTY_RECEIVER_NAME.to_string()),
                continue_matching: true,
                group_by: vec!["alertname".to_string(), "severity".to_string()],
                match_re: BTreeMap::from([(
                    "namespace".to_string(),
                    PAGERDUTY_NAMESPACE_REGEX.to_string(),
                )]),
                ..Route::default()
            },
            Self::Watchdog => Route {
                receiver: Some(WATCHDOG_RECEIVER_NAME.to_string()),
                repeat_interval: Some(WATCHDOG_REPEAT_INTERVAL.to_string()),
                match_labels: BTreeMap::from([(
                    "alertname".to_string(),
                    WATCHDOG_ALERT_NAME.to_string(),
                )]),
                ..Route::default()
            },
        }
    }

    /// Short label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PagerDuty => "pagerduty",
            Self::Watchdog => "watchdog",
        }
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn pagerduty_config(routing_key: &str) -> PagerdutyConfig {
    PagerdutyConfig {
        send_resolved: Some(true),
        routing_key: Some(routing_key.to_string()),
        description: Some(PAGERDUTY_DESCRIPTION.to_string()),
        details: PAGERDUTY_DETAILS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        ..PagerdutyConfig::default()
    }
}
