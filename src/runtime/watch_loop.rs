//! # Watch Loop
//!
//! Watches secrets in the configured namespace and turns every change, including
//! deletions, into a [`SecretTrigger`] for the reconciler.
//!
//! Triggers flow through one channel consumed by a bounded pool of passes.
//! Failed passes are redelivered into the same channel after their backoff.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{Reconciler, SecretTrigger};
use crate::controller::server::ServerState;
use crate::runtime::error_policy::{handle_watch_stream_error, ErrorPolicy, WatchErrorAction};
use anyhow::Context;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube_runtime::watcher::{self, watcher, Event};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run the controller until a shutdown signal is received
///
/// # Errors
///
/// Returns an error if the secrets in the namespace cannot be listed at startup.
pub async fn run_watch_loop(
    secrets: Api<Secret>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    secrets
        .list_metadata(&ListParams::default().limit(1))
        .await
        .context("Failed to list secrets, check that the service account may list secrets")?;

    let policy = Arc::new(ErrorPolicy::new(
        config.backoff_min_secs,
        config.backoff_max_secs,
    ));
    let (tx, rx) = mpsc::unbounded();

    let workers = run_workers(
        rx,
        tx.clone(),
        reconciler,
        policy,
        config.max_concurrent_reconciliations,
    );
    let watch = watch_secrets(secrets, tx, config.watch_restart_delay_duration());

    server_state.set_ready(true);

    tokio::select! {
        () = workers => warn!("Reconciliation workers stopped"),
        () = watch => warn!("Secret watch stopped"),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        }
    }

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

/// Consume triggers with at most `max_concurrent` passes in flight
///
/// A failed pass schedules its trigger back onto `requeue` once the error
/// policy's backoff has elapsed. Returns when every sender is dropped.
pub async fn run_workers(
    triggers: UnboundedReceiver<SecretTrigger>,
    requeue: UnboundedSender<SecretTrigger>,
    reconciler: Arc<Reconciler>,
    policy: Arc<ErrorPolicy>,
    max_concurrent: usize,
) {
    triggers
        .for_each_concurrent(max_concurrent.max(1), |trigger| {
            let reconciler = Arc::clone(&reconciler);
            let policy = Arc::clone(&policy);
            let requeue = requeue.clone();
            async move {
                match reconciler.reconcile(&trigger).await {
                    Ok(outcome) => {
                        policy.reset(&trigger);
                        debug!(secret = %trigger, outcome = outcome.as_str(), "Pass finished");
                    }
                    Err(error) => {
                        let delay = policy.handle_reconciliation_error(&trigger, &error);
                        schedule_requeue(requeue, trigger, delay);
                    }
                }
            }
        })
        .await;
}

fn schedule_requeue(requeue: UnboundedSender<SecretTrigger>, trigger: SecretTrigger, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if requeue.unbounded_send(trigger).is_err() {
            debug!("Trigger channel closed, dropping requeue");
        }
    });
}

/// Forward secret events as triggers, restarting the watch when it fails
async fn watch_secrets(
    secrets: Api<Secret>,
    triggers: UnboundedSender<SecretTrigger>,
    restart_delay: Duration,
) {
    loop {
        info!("Starting secret watch");
        let mut stream = pin!(watcher(secrets.clone(), watcher::Config::default()));
        let mut delay = restart_delay;

        while let Some(event) = stream.next().await {
            match event {
                Ok(Event::Apply(secret) | Event::InitApply(secret) | Event::Delete(secret)) => {
                    let Some(trigger) = SecretTrigger::from_secret(&secret) else {
                        continue;
                    };
                    if triggers.unbounded_send(trigger).is_err() {
                        debug!("Trigger channel closed, stopping secret watch");
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) => match handle_watch_stream_error(&e.to_string(), restart_delay) {
                    WatchErrorAction::Continue => {}
                    WatchErrorAction::Restart(after) => {
                        delay = after;
                        break;
                    }
                },
            }
        }

        warn!(
            "Secret watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }
}
