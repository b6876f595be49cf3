//! # Secret Store
//!
//! The boundary between the reconciliation logic and the cluster.
//!
//! The provisioner only needs three calls (get, create and patch by namespace and
//! name), captured by the [`SecretStore`] trait. [`KubeSecretStore`] backs it with
//! the Kubernetes API; tests back it with an in-memory map.
//!
//! [`fetch_state`] is the object state reader: it turns a `get` into
//! [`ObjectState::Found`], [`ObjectState::NotFound`] or a transient [`StoreError`].

mod kubernetes;

pub use kubernetes::KubeSecretStore;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a store call other than "not found"
///
/// Every variant is treated as transient by the provisioner.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes API request failed (network, auth, conflict, rate limit, ...)
    #[error("Kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),
    /// Non-Kubernetes backend failure
    #[error("secret store backend failed: {0}")]
    Backend(String),
}

/// Minimal object store interface consumed by the provisioner
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a Secret, returning `Ok(None)` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Create a Secret in `namespace`
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Apply a strategic merge patch to an existing Secret
    async fn patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        (**self).get(namespace, name).await
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        (**self).create(namespace, secret).await
    }

    async fn patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<(), StoreError> {
        (**self).patch(namespace, name, patch).await
    }
}

/// Current state of the target Secret as seen by a single read
#[derive(Debug, Clone)]
pub enum ObjectState {
    /// The Secret exists
    Found(Box<Secret>),
    /// The Secret does not exist (a normal outcome, not a failure)
    NotFound,
}

/// Read the target Secret and classify the result
///
/// # Errors
///
/// Returns the underlying [`StoreError`] for any failure other than "not found".
pub async fn fetch_state<S: SecretStore + ?Sized>(
    store: &S,
    namespace: &str,
    name: &str,
) -> Result<ObjectState, StoreError> {
    Ok(match store.get(namespace, name).await? {
        Some(secret) => ObjectState::Found(Box::new(secret)),
        None => ObjectState::NotFound,
    })
}
