//! # Test Support
//!
//! In-memory [`SecretStore`] used by the integration tests.
//!
//! It behaves like the API server for the calls the provisioner makes:
//! - `create` fails with a conflict when the Secret already exists
//! - `patch` applies the document as a merge patch and honours a
//!   `metadata.resourceVersion` precondition
//! - every write bumps the resource version
//!
//! Failures can be scripted per call type, including "lost acknowledgements"
//! where the write is applied but an error is still returned.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use rand::RngCore;
use secret_provisioner::{SecretStore, StoreError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

type Key = (String, String);
type Hook = Box<dyn FnOnce(&mut Secret) + Send>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub gets: usize,
    pub creates: usize,
    pub patches: usize,
}

#[derive(Default)]
struct Faults {
    failing_gets: usize,
    failing_creates: usize,
    failing_patches: usize,
    lost_create_acks: usize,
    lost_patch_acks: usize,
}

#[derive(Default)]
struct Inner {
    secrets: HashMap<Key, Secret>,
    calls: CallCounts,
    faults: Faults,
    created: Vec<Secret>,
    patches: Vec<Value>,
    scheduled: Vec<(usize, Secret)>,
    after_get: Option<Hook>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `secret` (namespace and name taken from its metadata)
    pub fn with_secret(secret: Secret) -> Self {
        let store = Self::new();
        store.insert(secret);
        store
    }

    pub fn insert(&self, mut secret: Secret) {
        let key = key_of(&secret);
        secret.metadata.resource_version.get_or_insert_with(|| "1".to_string());
        self.inner.lock().unwrap().secrets.insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.inner
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().unwrap().calls
    }

    pub fn writes(&self) -> usize {
        let calls = self.calls();
        calls.creates + calls.patches
    }

    pub fn created(&self) -> Vec<Secret> {
        self.inner.lock().unwrap().created.clone()
    }

    pub fn patches(&self) -> Vec<Value> {
        self.inner.lock().unwrap().patches.clone()
    }

    pub fn fail_next_gets(&self, n: usize) {
        self.inner.lock().unwrap().faults.failing_gets = n;
    }

    pub fn fail_next_creates(&self, n: usize) {
        self.inner.lock().unwrap().faults.failing_creates = n;
    }

    pub fn fail_next_patches(&self, n: usize) {
        self.inner.lock().unwrap().faults.failing_patches = n;
    }

    /// Apply the next `n` creates but report them as failed
    pub fn lose_create_acks(&self, n: usize) {
        self.inner.lock().unwrap().faults.lost_create_acks = n;
    }

    /// Apply the next `n` patches but report them as failed
    pub fn lose_patch_acks(&self, n: usize) {
        self.inner.lock().unwrap().faults.lost_patch_acks = n;
    }

    /// Make `secret` appear right after the `gets`-th read has been served
    pub fn insert_after_gets(&self, gets: usize, secret: Secret) {
        self.inner.lock().unwrap().scheduled.push((gets, secret));
    }

    /// Mutate the stored Secret right after the next successful read,
    /// as another writer racing with the job would
    pub fn after_next_get(&self, hook: impl FnOnce(&mut Secret) + Send + 'static) {
        self.inner.lock().unwrap().after_get = Some(Box::new(hook));
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.gets += 1;

        let result = if inner.faults.failing_gets > 0 {
            inner.faults.failing_gets -= 1;
            Err(StoreError::Backend("connection refused".to_string()))
        } else {
            let key = (namespace.to_string(), name.to_string());
            let found = inner.secrets.get(&key).cloned();
            if found.is_some() {
                if let Some(hook) = inner.after_get.take() {
                    let stored = inner.secrets.get_mut(&key).unwrap();
                    hook(stored);
                    bump(stored);
                }
            }
            Ok(found)
        };

        let served = inner.calls.gets;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.scheduled)
            .into_iter()
            .partition(|(after, _)| *after <= served);
        inner.scheduled = pending;
        for (_, mut secret) in due {
            secret.metadata.resource_version.get_or_insert_with(|| "1".to_string());
            inner.secrets.insert(key_of(&secret), secret);
        }

        result
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.creates += 1;

        if inner.faults.failing_creates > 0 {
            inner.faults.failing_creates -= 1;
            return Err(StoreError::Backend("service unavailable".to_string()));
        }

        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        if inner.secrets.contains_key(&key) {
            return Err(StoreError::Backend(format!(
                "409 AlreadyExists: secrets \"{name}\" already exists"
            )));
        }

        let mut stored = secret.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some("1".to_string());
        inner.secrets.insert(key, stored);
        inner.created.push(secret.clone());

        if inner.faults.lost_create_acks > 0 {
            inner.faults.lost_create_acks -= 1;
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }

    async fn patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.patches += 1;

        if inner.faults.failing_patches > 0 {
            inner.faults.failing_patches -= 1;
            return Err(StoreError::Backend("too many requests".to_string()));
        }

        let key = (namespace.to_string(), name.to_string());
        let Some(stored) = inner.secrets.get_mut(&key) else {
            return Err(StoreError::Backend(format!("404 secrets \"{name}\" not found")));
        };

        let precondition = patch
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str);
        if let Some(expected) = precondition {
            if stored.metadata.resource_version.as_deref() != Some(expected) {
                return Err(StoreError::Backend(
                    "409 Conflict: the object has been modified".to_string(),
                ));
            }
        }

        let mut document = serde_json::to_value(&*stored).unwrap();
        merge(&mut document, patch);
        *stored = serde_json::from_value(document).unwrap();
        bump(stored);
        inner.patches.push(patch.clone());

        if inner.faults.lost_patch_acks > 0 {
            inner.faults.lost_patch_acks -= 1;
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }
}

fn key_of(secret: &Secret) -> Key {
    (
        secret.metadata.namespace.clone().unwrap_or_default(),
        secret.metadata.name.clone().unwrap_or_default(),
    )
}

fn bump(secret: &mut Secret) {
    let next = secret
        .metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    secret.metadata.resource_version = Some(next.to_string());
}

/// JSON merge patch application (null deletes, objects recurse, anything else replaces)
fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let target = target.as_object_mut().unwrap();
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            merge(target.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Randomness source that always fails
pub struct BrokenRng;

impl RngCore for BrokenRng {
    fn next_u32(&mut self) -> u32 {
        unimplemented!()
    }

    fn next_u64(&mut self) -> u64 {
        unimplemented!()
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        unimplemented!()
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new(std::io::Error::other("entropy pool closed")))
    }
}
