//! Common fixtures for reconciler and runtime tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use alertmanager_config_controller::alertmanager::{decode, AlertmanagerConfig};
use alertmanager_config_controller::controller::{Reconciler, SecretTrigger};
use alertmanager_config_controller::store::InMemorySecretStore;
use std::sync::Arc;

pub const NAMESPACE: &str = "openshift-monitoring";

/// Base document with one unrelated receiver and route
pub const BASE_CONFIG: &str = r#"
global:
  resolve_timeout: 5m
route:
  receiver: "null"
  group_by:
    - job
  routes:
    - receiver: foo
      match:
        team: foo
receivers:
  - name: "null"
  - name: foo
    webhook_configs:
      - url: http://foo.example.com/hook
"#;

pub fn trigger(name: &str) -> SecretTrigger {
    SecretTrigger::new(NAMESPACE, name)
}

pub fn store_with_base(config: &str) -> Arc<InMemorySecretStore> {
    let store = Arc::new(InMemorySecretStore::new());
    store.insert(NAMESPACE, "alertmanager-main", [("alertmanager.yaml", config)]);
    store
}

pub fn add_pagerduty(store: &InMemorySecretStore, key: &str) {
    store.insert(NAMESPACE, "pd-secret", [("PAGERDUTY_KEY", key)]);
}

pub fn add_snitch(store: &InMemorySecretStore, url: &str) {
    store.insert(NAMESPACE, "dms-secret", [("SNITCH_URL", url)]);
}

pub fn reconciler(store: &Arc<InMemorySecretStore>) -> Reconciler {
    let shared = Arc::clone(store);
    Reconciler::new(shared, None)
}

/// Decode the configuration currently stored in `alertmanager-main`
pub fn stored_config(store: &InMemorySecretStore) -> AlertmanagerConfig {
    let data = store
        .data(NAMESPACE, "alertmanager-main")
        .expect("alertmanager-main should exist");
    decode(&data["alertmanager.yaml"]).expect("stored configuration should decode")
}

pub fn receiver_names(config: &AlertmanagerConfig) -> Vec<&str> {
    config.receivers.iter().map(|r| r.name.as_str()).collect()
}

pub fn route_receivers(config: &AlertmanagerConfig) -> Vec<&str> {
    config
        .routes()
        .iter()
        .filter_map(|r| r.receiver.as_deref())
        .collect()
}
