//! # Alertmanager Config Controller
//!
//! Binary entry point: loads configuration, starts the probe server, and runs
//! the secret watch loop until shutdown.

use alertmanager_config_controller::config::{ControllerConfig, LogFormat};
use alertmanager_config_controller::controller::server::{start_server, ServerState};
use alertmanager_config_controller::controller::Reconciler;
use alertmanager_config_controller::observability::{logging, metrics};
use alertmanager_config_controller::runtime::run_watch_loop;
use alertmanager_config_controller::store::KubeSecretStore;
use anyhow::{Context, Result};
use clap::Parser;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Keeps Alertmanager receivers in sync with PagerDuty and Dead Man's Snitch secrets
#[derive(Debug, Parser)]
#[command(name = "alertmanager-config-controller", version)]
struct Args {
    /// Namespace holding the Alertmanager and credential secrets
    #[arg(short, long)]
    namespace: Option<String>,

    /// Port for the metrics and probe server
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Log output format (json or text)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn apply(self, config: &mut ControllerConfig) {
        if let Some(namespace) = self.namespace {
            config.watch_namespace = namespace;
        }
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ControllerConfig::from_env();
    Args::parse().apply(&mut config);

    logging::init_tracing(&config)?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting Alertmanager Config Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        namespace = %config.watch_namespace,
        label_selector = config.secret_label_selector.as_deref().unwrap_or(""),
        "Loaded controller configuration"
    );

    metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let secrets: Api<Secret> = Api::namespaced(client.clone(), &config.watch_namespace);

    let store = Arc::new(KubeSecretStore::new(client));
    let reconciler = Arc::new(Reconciler::new(
        store,
        config.secret_label_selector.clone(),
    ));

    run_watch_loop(secrets, reconciler, server_state, &config).await
}
