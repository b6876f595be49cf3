//! # Idempotency Guard

use crate::constants::PROVISIONING_MARKER;
use k8s_openapi::api::core::v1::Secret;

/// Whether the Secret already carries the provisioning marker
///
/// Only the presence of the annotation matters, never its value.
#[must_use]
pub fn is_provisioned(secret: &Secret) -> bool {
    secret
        .metadata
        .annotations
        .as_ref()
        .is_some_and(|annotations| annotations.contains_key(PROVISIONING_MARKER))
}
