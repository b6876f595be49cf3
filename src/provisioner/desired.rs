//! # Desired State
//!
//! Builds the Secret the job wants to see, either from scratch (create) or as
//! a copy of the fetched object (patch). The fetched object is never modified.
//!
//! The generated value goes through `stringData`; the API server encodes it
//! into `data`.

use crate::constants::PROVISIONING_MARKER;
use crate::generator::GeneratedSecret;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// A brand-new Secret carrying the marker and the generated value
#[must_use]
pub fn new_secret(
    namespace: &str,
    name: &str,
    key: &str,
    value: &GeneratedSecret,
    timestamp: &str,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            annotations: Some(BTreeMap::from([(
                PROVISIONING_MARKER.to_string(),
                timestamp.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        string_data: Some(BTreeMap::from([(
            key.to_string(),
            value.expose().to_string(),
        )])),
        ..Secret::default()
    }
}

/// `original` plus the marker annotation and the generated value under `key`
#[must_use]
pub fn desired_state(
    original: &Secret,
    key: &str,
    value: &GeneratedSecret,
    timestamp: &str,
) -> Secret {
    let mut desired = original.clone();
    desired
        .metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(PROVISIONING_MARKER.to_string(), timestamp.to_string());
    desired
        .string_data
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.expose().to_string());
    desired
}
