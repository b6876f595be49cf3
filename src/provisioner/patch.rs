//! # Patch Synthesis
//!
//! Computes a two-way strategic merge patch between two Secret snapshots.
//!
//! Only keys whose value differs appear in the patch, so concurrent changes to
//! unrelated fields of the same Secret survive when the API server applies it.
//!
//! - unchanged keys are omitted
//! - added or changed keys carry the desired value
//! - nested mappings are diffed recursively
//! - keys missing from the desired mapping are deleted with `null`
//! - lists are replaced whole when they differ
//!
//! Secret has no merge-keyed lists in the fields this job touches, so for it the
//! result is identical to what a schema-aware strategic diff would produce.
//!
//! Missing `annotations`, `data` and `stringData` mappings compare equal to
//! empty ones.

use k8s_openapi::api::core::v1::Secret;
use serde_json::{Map, Value};
use thiserror::Error;

/// Patch synthesis failure
#[derive(Debug, Error)]
pub enum PatchError {
    /// A snapshot could not be serialized to JSON
    #[error("failed to serialize {snapshot} Secret: {source}")]
    Serialization {
        snapshot: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A snapshot serialized to something other than a JSON object
    #[error("{snapshot} Secret did not serialize to a JSON object")]
    NotAnObject { snapshot: &'static str },
}

/// Minimal patch turning `original` into `desired`
///
/// # Errors
///
/// Returns [`PatchError`] if either snapshot cannot be serialized.
pub fn diff(original: &Secret, desired: &Secret) -> Result<Value, PatchError> {
    let original = canonical(original, "original")?;
    let desired = canonical(desired, "desired")?;
    Ok(Value::Object(diff_maps(&original, &desired)))
}

/// Add `metadata.resourceVersion` to a patch so the API server rejects it with
/// 409 Conflict if the Secret changed since it was read
#[must_use]
pub fn with_resource_version(patch: Value, resource_version: Option<&str>) -> Value {
    let Some(resource_version) = resource_version else {
        return patch;
    };
    match patch {
        Value::Object(mut root) => {
            let metadata = root
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(metadata) = metadata {
                metadata.insert(
                    "resourceVersion".to_string(),
                    Value::String(resource_version.to_string()),
                );
            }
            Value::Object(root)
        }
        other => other,
    }
}

fn canonical(secret: &Secret, snapshot: &'static str) -> Result<Map<String, Value>, PatchError> {
    let value = serde_json::to_value(secret)
        .map_err(|source| PatchError::Serialization { snapshot, source })?;
    let Value::Object(mut object) = value else {
        return Err(PatchError::NotAnObject { snapshot });
    };

    for field in ["data", "stringData"] {
        ensure_object(&mut object, field);
    }
    if let Value::Object(metadata) = object
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()))
    {
        ensure_object(metadata, "annotations");
    }
    Ok(object)
}

fn ensure_object(map: &mut Map<String, Value>, field: &str) {
    let slot = map.entry(field).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
}

fn diff_maps(original: &Map<String, Value>, desired: &Map<String, Value>) -> Map<String, Value> {
    let mut patch = Map::new();

    for (key, wanted) in desired {
        match (original.get(key), wanted) {
            (Some(current), _) if current == wanted => {}
            (Some(Value::Object(current)), Value::Object(wanted)) => {
                let nested = diff_maps(current, wanted);
                if !nested.is_empty() {
                    patch.insert(key.clone(), Value::Object(nested));
                }
            }
            _ => {
                patch.insert(key.clone(), wanted.clone());
            }
        }
    }

    for key in original.keys() {
        if !desired.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }

    patch
}
