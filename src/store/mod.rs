//! # Secret Store
//!
//! Abstract interface over the key/value secret objects the controller reads
//! and writes.
//!
//! The reconciler only ever talks to a [`SecretStore`], which keeps it testable
//! without a cluster:
//! - `kubernetes`: Kubernetes `Secret` objects via kube-rs
//! - `memory`: process-local store used by tests and dry runs

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod kubernetes;
pub mod memory;

pub use self::kubernetes::KubeSecretStore;
pub use self::memory::InMemorySecretStore;

/// Decoded `data` of a secret: field name to raw bytes
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    List,
    Put,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Put => "put",
        })
    }
}

/// Failure talking to the backing store
///
/// A secret that does not exist is not an error; `get` reports it as `None`.
#[derive(Debug, Error)]
#[error("failed to {operation} secret {target}: {source}")]
pub struct StoreError {
    pub operation: StoreOperation,
    /// `namespace/name`, or just `namespace` for listings
    pub target: String,
    #[source]
    pub source: anyhow::Error,
}

impl StoreError {
    pub fn new(
        operation: StoreOperation,
        target: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            operation,
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Provider trait for secret storage
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret's data, `None` when the secret does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError>;

    /// Names of the secrets in a namespace, optionally filtered by a label selector
    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<String>, StoreError>;

    /// Replace the given data fields of an existing secret
    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<(), StoreError>;
}
