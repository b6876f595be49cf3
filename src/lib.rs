//! Secret Provisioner Library
//!
//! Core of the `secret-provisioner` job: generates a random value and writes it
//! into a Kubernetes Secret exactly once, guarded by a marker annotation.
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod generator;
pub mod provisioner;
pub mod runtime;
pub mod store;

pub use config::{JobConfig, ProvisionMode, ProvisionSettings};
pub use generator::{SecretEncoding, SecretGenerator};
pub use provisioner::{Outcome, ProvisionError, Provisioner};
pub use store::{KubeSecretStore, SecretStore, StoreError};
