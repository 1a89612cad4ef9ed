//! # Channel Merge
//!
//! Inserts, overwrites, or removes the receiver and route owned by an
//! [`Integration`] while leaving every other receiver and route exactly where
//! it was.
//!
//! Both operations are idempotent and normalize documents that were edited by
//! hand: after an upsert exactly one receiver and one child route carry the
//! integration's name, and after a removal none do.

use crate::alertmanager::integration::Integration;
use crate::alertmanager::types::{AlertmanagerConfig, Receiver, Route};
use std::fmt;
use tracing::warn;

/// What a merge operation did to an integration's entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelChange {
    /// Receiver or route did not exist before and was added
    Created,
    /// Existing entries were rewritten
    Updated,
    /// Existing entries were deleted
    Removed,
    /// The document already had the desired shape
    Unchanged,
}

impl ChannelChange {
    /// Whether the document was modified
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Short label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChannelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insert or overwrite the integration's receiver and route
///
/// The first receiver named after the integration keeps its position and has
/// its channel replaced; other channel kinds on it are kept. The first route
/// delivering to it is replaced with the canonical route in place. Missing
/// entries are appended, later duplicates are dropped.
///
/// A document without a root route gets one holding only the child route.
/// That root has no `receiver`, which Alertmanager rejects, so the owner of
/// the base document must add one.
pub fn upsert_channel(
    config: &mut AlertmanagerConfig,
    integration: Integration,
    secret_value: &str,
) -> ChannelChange {
    let name = integration.receiver_name();
    let before = owned_entries(config, name);

    keep_first(&mut config.receivers, |r| r.name == name);
    match config.receivers.iter_mut().find(|r| r.name == name) {
        Some(receiver) => integration.apply_channel(receiver, secret_value),
        None => config.receivers.push(integration.receiver(secret_value)),
    }

    if config.route.is_none() {
        warn!(
            %integration,
            "Configuration has no root route, creating one without a receiver"
        );
    }
    let routes = &mut config.route.get_or_insert_with(Route::default).routes;
    keep_first(routes, |r| r.targets(name));
    match routes.iter_mut().find(|r| r.targets(name)) {
        Some(route) => *route = integration.route(),
        None => routes.push(integration.route()),
    }

    let after = owned_entries(config, name);
    if before.0.is_empty() || before.1.is_empty() {
        ChannelChange::Created
    } else if before == after {
        ChannelChange::Unchanged
    } else {
        ChannelChange::Updated
    }
}

/// Remove every receiver and child route owned by the integration
///
/// Removing an integration that is not configured leaves the document
/// untouched.
pub fn remove_channel(config: &mut AlertmanagerConfig, integration: Integration) -> ChannelChange {
    let name = integration.receiver_name();

    let receivers_before = config.receivers.len();
    config.receivers.retain(|r| r.name != name);
    let mut removed = config.receivers.len() != receivers_before;

    if let Some(root) = config.route.as_mut() {
        let routes_before = root.routes.len();
        root.routes.retain(|r| !r.targets(name));
        removed |= root.routes.len() != routes_before;
    }

    if removed {
        ChannelChange::Removed
    } else {
        ChannelChange::Unchanged
    }
}

/// Snapshot of the receivers and child routes carrying `name`
fn owned_entries(config: &AlertmanagerConfig, name: &str) -> (Vec<Receiver>, Vec<Route>) {
    (
        config
            .receivers
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect(),
        config
            .routes()
            .iter()
            .filter(|r| r.targets(name))
            .cloned()
            .collect(),
    )
}

/// Drop every element matching `pred` except the first
fn keep_first<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) {
    let mut seen = false;
    items.retain(|item| {
        if !pred(item) {
            return true;
        }
        !std::mem::replace(&mut seen, true)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alertmanager::codec::decode;
    use crate::alertmanager::types::WebhookConfig;

    fn receiver_names(config: &AlertmanagerConfig) -> Vec<&str> {
        config.receivers.iter().map(|r| r.name.as_str()).collect()
    }

    fn route_targets(config: &AlertmanagerConfig) -> Vec<&str> {
        config
            .routes()
            .iter()
            .map(|r| r.receiver.as_deref().unwrap_or(""))
            .collect()
    }

    fn foo_only() -> AlertmanagerConfig {
        decode(
            br"
route:
  receiver: foo
  routes:
    - receiver: foo
      match:
        team: foo
receivers:
  - name: foo
    email_configs:
      - to: foo@example.com
",
        )
        .unwrap()
    }

    fn with_watchdog() -> AlertmanagerConfig {
        decode(
            br"
route:
  receiver: foo
  routes:
    - receiver: watchdog
      match:
        alertname: Watchdog
      repeat_interval: 5m
    - receiver: foo
      match:
        team: foo
receivers:
  - name: watchdog
    webhook_configs:
      - url: https://nosnch.in/abc
  - name: foo
",
        )
        .unwrap()
    }

    fn corrupted() -> AlertmanagerConfig {
        decode(
            br"
route:
  routes:
    - receiver: pagerduty
      match:
        severity: critical
    - receiver: foo
    - receiver: pagerduty
    - receiver: bar
    - receiver: pagerduty
receivers:
  - name: pagerduty
    pagerduty_configs:
      - routing_key: OLD1
  - name: foo
  - name: pagerduty
    pagerduty_configs:
      - routing_key: OLD2
  - name: bar
",
        )
        .unwrap()
    }

    #[test]
    fn test_paging_secret_appears() {
        let mut config = foo_only();
        let original_foo = config.receivers[0].clone();

        let change = upsert_channel(&mut config, Integration::PagerDuty, "ABC123");

        assert_eq!(change, ChannelChange::Created);
        assert_eq!(receiver_names(&config), vec!["foo", "pagerduty"]);
        assert_eq!(config.receivers[0], original_foo);
        assert_eq!(
            config.receivers[1].pagerduty_configs[0].routing_key.as_deref(),
            Some("ABC123")
        );
        assert_eq!(route_targets(&config), vec!["foo", "pagerduty"]);
        assert_eq!(config.routes()[1], Integration::PagerDuty.route());
    }

    #[test]
    fn test_heartbeat_secret_disappears() {
        let mut config = with_watchdog();
        let foo_receiver = config.receiver("foo").cloned();
        let foo_route = config.routes()[1].clone();

        let change = remove_channel(&mut config, Integration::Watchdog);

        assert_eq!(change, ChannelChange::Removed);
        assert_eq!(receiver_names(&config), vec!["foo"]);
        assert_eq!(config.receiver("foo").cloned(), foo_receiver);
        assert_eq!(config.routes(), &[foo_route]);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        for base in [foo_only(), with_watchdog(), corrupted(), AlertmanagerConfig::default()] {
            for integration in Integration::ALL {
                let mut once = base.clone();
                upsert_channel(&mut once, integration, "value");
                let mut twice = once.clone();
                let change = upsert_channel(&mut twice, integration, "value");
                assert_eq!(twice, once);
                assert_eq!(change, ChannelChange::Unchanged);
            }
        }
    }

    #[test]
    fn test_upsert_normalizes_duplicates_to_one() {
        let mut config = corrupted();
        let change = upsert_channel(&mut config, Integration::PagerDuty, "NEW");

        assert_eq!(change, ChannelChange::Updated);
        assert_eq!(receiver_names(&config), vec!["pagerduty", "foo", "bar"]);
        assert_eq!(
            config.receivers[0].pagerduty_configs[0].routing_key.as_deref(),
            Some("NEW")
        );
        assert_eq!(route_targets(&config), vec!["pagerduty", "foo", "bar"]);
        assert_eq!(config.routes()[0], Integration::PagerDuty.route());
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let mut config = with_watchdog();
        let change = upsert_channel(&mut config, Integration::Watchdog, "https://nosnch.in/new");

        assert_eq!(change, ChannelChange::Updated);
        assert_eq!(receiver_names(&config), vec!["watchdog", "foo"]);
        assert_eq!(route_targets(&config), vec!["watchdog", "foo"]);
        assert_eq!(
            config.receivers[0].webhook_configs,
            vec![WebhookConfig {
                send_resolved: Some(false),
                url: Some("https://nosnch.in/new".to_string()),
                ..WebhookConfig::default()
            }]
        );
    }

    #[test]
    fn test_upsert_existing_canonical_is_unchanged() {
        let mut config = with_watchdog();
        upsert_channel(&mut config, Integration::Watchdog, "https://nosnch.in/abc");
        let change = upsert_channel(&mut config, Integration::Watchdog, "https://nosnch.in/abc");
        assert_eq!(change, ChannelChange::Unchanged);
    }

    #[test]
    fn test_upsert_creates_missing_root_route() {
        let mut config = AlertmanagerConfig::default();
        upsert_channel(&mut config, Integration::Watchdog, "https://nosnch.in/abc");
        let root = config.route.as_ref().unwrap();
        assert_eq!(root.receiver, None);
        assert_eq!(root.routes, vec![Integration::Watchdog.route()]);
    }

    #[test]
    fn test_upsert_on_routeless_document_keeps_receivers() {
        let mut config = foo_only();
        config.route = None;
        let change = upsert_channel(&mut config, Integration::PagerDuty, "ABC123");

        assert_eq!(change, ChannelChange::Created);
        assert_eq!(receiver_names(&config), vec!["foo", "pagerduty"]);
        let root = config.route.as_ref().unwrap();
        assert_eq!(root.receiver, None);
        assert_eq!(root.routes, vec![Integration::PagerDuty.route()]);
    }

    #[test]
    fn test_upsert_creates_route_when_only_receiver_exists() {
        let mut config = foo_only();
        config.receivers.push(Integration::PagerDuty.receiver("ABC123"));
        let change = upsert_channel(&mut config, Integration::PagerDuty, "ABC123");
        assert_eq!(change, ChannelChange::Created);
        assert_eq!(route_targets(&config), vec!["foo", "pagerduty"]);
    }

    #[test]
    fn test_remove_is_exhaustive() {
        let mut config = corrupted();
        remove_channel(&mut config, Integration::PagerDuty);
        assert_eq!(receiver_names(&config), vec!["foo", "bar"]);
        assert_eq!(route_targets(&config), vec!["foo", "bar"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        for base in [foo_only(), with_watchdog(), corrupted()] {
            for integration in Integration::ALL {
                let mut once = base.clone();
                remove_channel(&mut once, integration);
                let mut twice = once.clone();
                let change = remove_channel(&mut twice, integration);
                assert_eq!(twice, once);
                assert_eq!(change, ChannelChange::Unchanged);
            }
        }
    }

    #[test]
    fn test_remove_absent_channel_leaves_document_equal() {
        let original = foo_only();
        let mut config = original.clone();
        assert_eq!(
            remove_channel(&mut config, Integration::PagerDuty),
            ChannelChange::Unchanged
        );
        assert_eq!(config, original);

        let mut empty = AlertmanagerConfig::default();
        assert_eq!(
            remove_channel(&mut empty, Integration::Watchdog),
            ChannelChange::Unchanged
        );
        assert_eq!(empty, AlertmanagerConfig::default());
    }

    #[test]
    fn test_unrelated_entries_keep_order_across_operations() {
        let mut config = decode(
            br"
route:
  routes:
    - receiver: a
    - receiver: b
    - receiver: c
receivers:
  - name: a
  - name: b
    slack_configs:
      - channel: '#b'
  - name: c
",
        )
        .unwrap();
        let unrelated_receivers = config.receivers.clone();
        let unrelated_routes = config.routes().to_vec();

        upsert_channel(&mut config, Integration::PagerDuty, "K1");
        upsert_channel(&mut config, Integration::Watchdog, "https://nosnch.in/1");
        remove_channel(&mut config, Integration::PagerDuty);
        upsert_channel(&mut config, Integration::PagerDuty, "K2");
        remove_channel(&mut config, Integration::Watchdog);
        remove_channel(&mut config, Integration::PagerDuty);

        assert_eq!(config.receivers, unrelated_receivers);
        assert_eq!(config.routes(), unrelated_routes.as_slice());
    }

    #[test]
    fn test_keep_first() {
        let mut items = vec![1, 2, 1, 3, 1];
        keep_first(&mut items, |i| *i == 1);
        assert_eq!(items, vec![1, 2, 3]);
    }
}
