//! # Watch Loop Tests
//!
//! Trigger dispatch and redelivery of failed passes, driven with paused time.

mod common;

use alertmanager_config_controller::runtime::{run_workers, ErrorPolicy};
use alertmanager_config_controller::store::StoreOperation;
use common::*;
use futures::channel::mpsc;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_failed_pass_is_redelivered_after_backoff() {
    let store = store_with_base(BASE_CONFIG);
    add_pagerduty(&store, "ABC123");
    store.fail(StoreOperation::Put);

    let policy = Arc::new(ErrorPolicy::new(1, 10));
    let (tx, rx) = mpsc::unbounded();
    tx.unbounded_send(trigger("pd-secret")).unwrap();

    let workers = tokio::spawn(run_workers(
        rx,
        tx.clone(),
        Arc::new(reconciler(&store)),
        Arc::clone(&policy),
        2,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.write_count(), 0);
    assert_eq!(policy.error_count(&trigger("pd-secret")), 1);

    store.clear_failures();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(store.write_count(), 1);
    assert_eq!(policy.error_count(&trigger("pd-secret")), 0);
    let config = stored_config(&store);
    assert!(config.receiver("pagerduty").is_some());

    workers.abort();
}

#[tokio::test(start_paused = true)]
async fn test_triggers_for_every_secret_converge() {
    let store = store_with_base(BASE_CONFIG);
    add_pagerduty(&store, "ABC123");
    add_snitch(&store, "https://nosnch.in/abc");

    let policy = Arc::new(ErrorPolicy::new(1, 10));
    let (tx, rx) = mpsc::unbounded();
    for name in ["alertmanager-main", "pd-secret", "dms-secret", "unrelated"] {
        tx.unbounded_send(trigger(name)).unwrap();
    }

    let workers = tokio::spawn(run_workers(
        rx,
        tx.clone(),
        Arc::new(reconciler(&store)),
        Arc::clone(&policy),
        1,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;

    // the first pass converges the document, the rest find nothing to do
    assert_eq!(store.write_count(), 1);
    let config = stored_config(&store);
    assert_eq!(receiver_names(&config), ["null", "foo", "pagerduty", "watchdog"]);

    workers.abort();
}
