//! # Document Model
//!
//! Typed view of the parts of an Alertmanager configuration the controller
//! reads or writes. Every struct carries a flattened `extra` mapping so fields
//! that are not modelled here (`global`, `inhibit_rules`, `group_wait`,
//! `email_configs`, ...) survive a decode/encode cycle.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature")]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Top-level Alertmanager configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AlertmanagerConfig {
    /// Root of the routing tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    /// Notification receivers, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<Receiver>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl AlertmanagerConfig {
    /// Child routes of the root route, empty when there is no root route
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.route.as_ref().map_or(&[], |route| route.routes.as_slice())
    }

    /// Receiver with the given name, if any
    #[must_use]
    pub fn receiver(&self, name: &str) -> Option<&Receiver> {
        self.receivers.iter().find(|r| r.name == name)
    }
}

/// A named notification channel configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Receiver {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pagerduty_configs: Vec<PagerdutyConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhook_configs: Vec<WebhookConfig>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Receiver {
    /// Empty receiver with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// PagerDuty notification settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PagerdutyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Generic webhook notification settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WebhookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// A node of the routing tree
///
/// Alertmanager evaluates sibling routes in order, so the position of a route
/// inside `routes` is significant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(rename = "continue", default, skip_serializing_if = "is_false")]
    pub continue_matching: bool,
    /// Exact-value label matchers
    #[serde(rename = "match", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    /// Regex label matchers, anchored by Alertmanager
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_re: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Route {
    /// Whether this route delivers to the named receiver
    #[must_use]
    pub fn targets(&self, receiver: &str) -> bool {
        self.receiver.as_deref() == Some(receiver)
    }
}
