//! # Kubernetes Secret Store
//!
//! [`SecretStore`] backed by core/v1 `Secret` objects.

use crate::constants::FIELD_MANAGER;
use crate::store::{SecretData, SecretStore, StoreError, StoreOperation};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError> {
        let secret = self
            .api(namespace)
            .get_opt(name)
            .await
            .map_err(|e| StoreError::new(StoreOperation::Get, format!("{namespace}/{name}"), e))?;

        Ok(secret.map(|s| {
            s.data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }

        let secrets = self
            .api(namespace)
            .list_metadata(&params)
            .await
            .map_err(|e| StoreError::new(StoreOperation::List, namespace, e))?;

        let names: Vec<String> = secrets
            .items
            .into_iter()
            .filter_map(|s| s.metadata.name)
            .collect();
        debug!(namespace, count = names.len(), "Listed secrets");
        Ok(names)
    }

    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<(), StoreError> {
        let data: BTreeMap<String, ByteString> = data
            .into_iter()
            .map(|(key, value)| (key, ByteString(value)))
            .collect();
        let patch = serde_json::json!({ "data": data });

        self.api(namespace)
            .patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::new(StoreOperation::Put, format!("{namespace}/{name}"), e))?;
        Ok(())
    }
}
