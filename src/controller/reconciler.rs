//! # Reconciler
//!
//! Core reconciliation logic for the Alertmanager configuration secret.
//!
//! A pass is triggered by a change to a single secret but always evaluates
//! every integration.
//!
//! ## Reconciliation Flow
//!
//! 1. **Filtering** - ignore secrets the controller does not monitor
//! 2. **Loading** - fetch the triggering secret; a missing secret counts as absent
//! 3. **Resolving** - list sibling secrets and resolve which integrations exist;
//!    defer when `alertmanager-main` does not exist yet
//! 4. **Merging** - decode the configuration and upsert or remove each integration
//! 5. **Persisting** - write the configuration back if any integration changed it

use crate::alertmanager::{
    codec, remove_channel, upsert_channel, ChannelChange, CodecError, Integration,
};
use crate::constants::{ALERTMANAGER_CONFIG_KEY, ALERTMANAGER_SECRET_NAME};
use crate::controller::presence::{is_monitored, Presence};
use crate::observability::metrics;
use crate::store::{SecretData, SecretStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use zeroize::{Zeroize, Zeroizing};

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("malformed Alertmanager configuration in secret {secret}: {source}")]
    MalformedConfig {
        secret: String,
        #[source]
        source: CodecError,
    },

    #[error("secret store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("failed to encode Alertmanager configuration: {0}")]
    EncodeFailure(#[source] CodecError),
}

impl ReconcilerError {
    /// Short label used in logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedConfig { .. } => "malformed_config",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::EncodeFailure(_) => "encode_failure",
        }
    }
}

/// A change notification naming one secret
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretTrigger {
    pub namespace: String,
    pub name: String,
}

impl SecretTrigger {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Trigger for a watched secret, `None` if it lacks a name or namespace
    #[must_use]
    pub fn from_secret(secret: &Secret) -> Option<Self> {
        Some(Self::new(
            secret.metadata.namespace.as_deref()?,
            secret.metadata.name.as_deref()?,
        ))
    }
}

impl fmt::Display for SecretTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Result of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The triggering secret is not monitored
    Ignored,
    /// `alertmanager-main` does not exist yet, nothing was done
    Deferred,
    /// The configuration already matched the credential secrets
    Unchanged,
    /// The configuration was rewritten
    Updated {
        changes: Vec<(Integration, ChannelChange)>,
    },
}

impl PassOutcome {
    /// Short label used in logs and metrics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Deferred => "deferred",
            Self::Unchanged => "unchanged",
            Self::Updated { .. } => "updated",
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn SecretStore>,
    label_selector: Option<String>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("label_selector", &self.label_selector)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler over a secret store
    ///
    /// `label_selector` narrows the listing used to resolve presence.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>, label_selector: Option<String>) -> Self {
        Self {
            store,
            label_selector,
        }
    }

    /// Run one reconciliation pass for a trigger
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError`] when the store fails or the configuration
    /// cannot be decoded or encoded. Nothing is written in either case.
    pub async fn reconcile(&self, trigger: &SecretTrigger) -> Result<PassOutcome, ReconcilerError> {
        let span = info_span!(
            "reconcile",
            namespace = %trigger.namespace,
            secret = %trigger.name
        );
        let start = Instant::now();
        let result = self.run_pass(trigger).instrument(span).await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => metrics::increment_reconciliations(outcome.as_str()),
            Err(e) => {
                metrics::increment_reconciliations("error");
                metrics::increment_reconciliation_errors(e.kind());
            }
        }
        result
    }

    async fn run_pass(&self, trigger: &SecretTrigger) -> Result<PassOutcome, ReconcilerError> {
        let namespace = trigger.namespace.as_str();

        // Filtering
        if !is_monitored(&trigger.name) {
            debug!("Skipping unmonitored secret");
            return Ok(PassOutcome::Ignored);
        }
        info!("Reconciling Alertmanager configuration");

        // Loading
        let triggering = self
            .store
            .get(namespace, &trigger.name)
            .await?
            .map(SensitiveData);
        if triggering.is_none() {
            info!("Triggering secret not found, treating it as absent");
        }

        // Resolving
        let names = self
            .store
            .list(namespace, self.label_selector.as_deref())
            .await?;
        let mut presence = Presence::resolve(&names);
        if triggering.is_none() {
            match Integration::from_secret_name(&trigger.name) {
                Some(integration) => presence.mark_absent(integration),
                None => presence.alertmanager_config = false,
            }
        }
        if presence.is_deferred() {
            info!("Secret {ALERTMANAGER_SECRET_NAME} not found, deferring until it exists");
            return Ok(PassOutcome::Deferred);
        }

        // Merging
        let base = if trigger.name == ALERTMANAGER_SECRET_NAME {
            triggering.as_ref().map(|data| data.0.clone())
        } else {
            self.store.get(namespace, ALERTMANAGER_SECRET_NAME).await?
        };
        let Some(mut base) = base else {
            info!("Secret {ALERTMANAGER_SECRET_NAME} disappeared during the pass, deferring");
            return Ok(PassOutcome::Deferred);
        };

        let original =
            codec::decode_secret(&base).map_err(|source| ReconcilerError::MalformedConfig {
                secret: format!("{namespace}/{ALERTMANAGER_SECRET_NAME}"),
                source,
            })?;
        let mut config = original.clone();
        let mut changes = Vec::with_capacity(Integration::ALL.len());
        let mut enabled = Vec::with_capacity(Integration::ALL.len());

        for integration in Integration::ALL {
            let credential = if presence.has(integration) {
                let cached = (trigger.name == integration.secret_name())
                    .then_some(triggering.as_ref())
                    .flatten();
                self.load_credential(namespace, integration, cached).await?
            } else {
                None
            };

            let change = match &credential {
                Some(value) => {
                    info!(%integration, "Credential secret present, configuring receiver");
                    upsert_channel(&mut config, integration, value)
                }
                None => {
                    info!(%integration, "Credential secret absent, removing receiver");
                    remove_channel(&mut config, integration)
                }
            };
            debug!(%integration, %change, "Merged integration");
            metrics::record_channel_change(integration, change);
            enabled.push((integration, credential.is_some()));
            changes.push((integration, change));
        }

        if config == original {
            info!("Alertmanager configuration already up to date");
            record_enabled(&enabled);
            return Ok(PassOutcome::Unchanged);
        }

        // Persisting
        let encoded = codec::encode(&config).map_err(ReconcilerError::EncodeFailure)?;
        base.insert(ALERTMANAGER_CONFIG_KEY.to_string(), encoded);
        self.store
            .put(namespace, ALERTMANAGER_SECRET_NAME, base)
            .await?;
        metrics::increment_config_updates();
        record_enabled(&enabled);
        info!("Secret {ALERTMANAGER_SECRET_NAME} successfully updated");

        Ok(PassOutcome::Updated { changes })
    }

    /// Read an integration's credential value
    ///
    /// A secret that vanished, lacks the field, or holds an empty or non UTF-8
    /// value is treated as absent.
    async fn load_credential(
        &self,
        namespace: &str,
        integration: Integration,
        cached: Option<&SensitiveData>,
    ) -> Result<Option<Zeroizing<String>>, ReconcilerError> {
        let fetched;
        let data = match cached {
            Some(data) => data,
            None => match self.store.get(namespace, integration.secret_name()).await? {
                Some(data) => {
                    fetched = SensitiveData(data);
                    &fetched
                }
                None => {
                    warn!(%integration, "Credential secret disappeared during the pass");
                    return Ok(None);
                }
            },
        };

        let Some(raw) = data.0.get(integration.secret_key()) else {
            warn!(
                %integration,
                field = integration.secret_key(),
                "Credential secret has no value field"
            );
            return Ok(None);
        };

        match std::str::from_utf8(raw).map(str::trim) {
            Ok(value) if !value.is_empty() => Ok(Some(Zeroizing::new(value.to_string()))),
            Ok(_) => {
                warn!(%integration, "Credential value is empty");
                Ok(None)
            }
            Err(_) => {
                warn!(%integration, "Credential value is not valid UTF-8");
                Ok(None)
            }
        }
    }
}

/// Publish which integrations the persisted configuration carries
fn record_enabled(enabled: &[(Integration, bool)]) {
    for &(integration, is_enabled) in enabled {
        metrics::set_integration_enabled(integration, is_enabled);
    }
}

/// Secret data whose values are zeroed when dropped
struct SensitiveData(SecretData);

impl SensitiveData {
    fn wipe(&mut self) {
        self.0.values_mut().for_each(Zeroize::zeroize);
    }
}

impl Drop for SensitiveData {
    fn drop(&mut self) {
        self.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wipe_clears_every_value() {
        let mut data = SensitiveData(SecretData::from([
            ("PAGERDUTY_KEY".to_string(), b"ABC123".to_vec()),
            ("other".to_string(), b"x".to_vec()),
        ]));
        data.wipe();
        assert_eq!(data.0.len(), 2);
        assert!(data.0.values().all(Vec::is_empty));
    }
}
