//! # In-Memory Secret Store
//!
//! Process-local [`SecretStore`] with failure injection, used by tests.
//!
//! Label selectors support the equality form only (`key=value`, comma
//! separated), which is all the controller passes.

use crate::store::{SecretData, SecretStore, StoreError, StoreOperation};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct StoredSecret {
    labels: BTreeMap<String, String>,
    data: SecretData,
}

#[derive(Debug, Default)]
struct State {
    secrets: BTreeMap<(String, String), StoredSecret>,
    failing: HashSet<StoreOperation>,
    writes: Vec<(String, String, SecretData)>,
}

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    state: Mutex<State>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test must not poison every later assertion
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Create or replace a secret
    pub fn insert<I, K, V>(&self, namespace: &str, name: &str, data: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        self.insert_labeled(namespace, name, BTreeMap::new(), data);
    }

    /// Create or replace a secret carrying labels
    pub fn insert_labeled<I, K, V>(
        &self,
        namespace: &str,
        name: &str,
        labels: BTreeMap<String, String>,
        data: I,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.lock().secrets.insert(
            (namespace.to_string(), name.to_string()),
            StoredSecret { labels, data },
        );
    }

    /// Delete a secret
    pub fn remove(&self, namespace: &str, name: &str) {
        self.lock()
            .secrets
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Current data of a secret
    #[must_use]
    pub fn data(&self, namespace: &str, name: &str) -> Option<SecretData> {
        self.lock()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .map(|s| s.data.clone())
    }

    /// Make every call of `operation` fail until cleared
    pub fn fail(&self, operation: StoreOperation) {
        self.lock().failing.insert(operation);
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Number of successful `put` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Every successful `put` in call order
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String, SecretData)> {
        self.lock().writes.clone()
    }

    fn check(&self, operation: StoreOperation, target: &str) -> Result<(), StoreError> {
        if self.lock().failing.contains(&operation) {
            return Err(StoreError::new(
                operation,
                target,
                anyhow!("injected {operation} failure"),
            ));
        }
        Ok(())
    }
}

fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => {
                labels.get(key.trim()).map(String::as_str) == Some(value.trim_start_matches('=').trim())
            }
            None => labels.contains_key(term),
        })
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError> {
        self.check(StoreOperation::Get, &format!("{namespace}/{name}"))?;
        Ok(self.data(namespace, name))
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        self.check(StoreOperation::List, namespace)?;
        Ok(self
            .lock()
            .secrets
            .iter()
            .filter(|((ns, _), secret)| {
                ns == namespace
                    && label_selector.map_or(true, |selector| matches_selector(&secret.labels, selector))
            })
            .map(|((_, name), _)| name.clone())
            .collect())
    }

    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<(), StoreError> {
        let target = format!("{namespace}/{name}");
        self.check(StoreOperation::Put, &target)?;

        let mut state = self.lock();
        let secret = state
            .secrets
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| {
                StoreError::new(StoreOperation::Put, target.clone(), anyhow!("secret does not exist"))
            })?;
        secret.data.extend(data.clone());
        state
            .writes
            .push((namespace.to_string(), name.to_string(), data));
        Ok(())
    }
}
