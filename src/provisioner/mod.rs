//! # Provisioner
//!
//! One-shot reconciliation of a single generated value inside a single Secret.
//!
//! ## Flow
//!
//! 1. **Read** the Secret.
//! 2. **Not found**: in create-if-absent mode, create it with the marker annotation
//!    and a fresh value; in update-only mode, wait on a fixed interval for someone
//!    else to create it.
//! 3. **Found, marker present**: nothing to do. Re-running the job is a no-op.
//! 4. **Found, marker absent**: build the desired Secret (marker + fresh value),
//!    diff it against what was read and send the strategic merge patch, guarded by
//!    the `resourceVersion` that was read.
//!
//! Any failure (store call, entropy, patch synthesis) restarts the cycle from
//! step 1 after a linear backoff, so a patch is never synthesized against stale
//! data. If a write succeeded but was reported as failed, the next read sees the
//! marker and the run ends without writing again.
//!
//! The run ends in [`Outcome`] or [`ProvisionError`]; turning the latter into a
//! process exit code is left to the binary.

pub mod desired;
pub mod guard;
pub mod patch;
pub mod retry;

use crate::config::{ProvisionMode, ProvisionSettings};
use crate::generator::{EntropyUnavailable, SecretGenerator};
use crate::store::{fetch_state, ObjectState, SecretStore, StoreError};
use patch::PatchError;
use rand::rngs::OsRng;
use rand::RngCore;
use retry::{RetryDecision, RetryPolicy, RetryState};
use thiserror::Error;
use tracing::{debug, error, info, warn, Instrument};

/// Successful end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The Secret did not exist and was created
    Created,
    /// The Secret existed without the marker and was patched
    Patched,
    /// The Secret already carried the marker; nothing was written
    AlreadyProvisioned,
}

impl Outcome {
    /// Human-readable description for logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Patched => "patched",
            Outcome::AlreadyProvisioned => "already provisioned",
        }
    }
}

/// Transient cause of a failed attempt
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Entropy(#[from] EntropyUnavailable),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Terminal failure of a run
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Too many consecutive failed attempts
    #[error("unable to create/update Secret {namespace}/{name} after {failures} failed attempts")]
    RetriesExhausted {
        namespace: String,
        name: String,
        failures: u32,
        #[source]
        last_error: AttemptError,
    },
    /// Update-only mode and the Secret never showed up
    #[error("Secret {namespace}/{name} still does not exist after {waits} reads")]
    SecretNeverAppeared {
        namespace: String,
        name: String,
        waits: u32,
    },
}

/// Result of a single read-decide-write cycle
enum Step {
    Done(Outcome),
    AwaitingSecret,
}

/// Drives the reconciliation of one Secret
#[derive(Debug)]
pub struct Provisioner<S, R = OsRng> {
    store: S,
    generator: SecretGenerator<R>,
    settings: ProvisionSettings,
    policy: RetryPolicy,
}

impl<S: SecretStore> Provisioner<S, OsRng> {
    /// Provisioner using the operating system CSPRNG
    pub fn new(store: S, settings: ProvisionSettings) -> Self {
        Self::with_generator(store, SecretGenerator::os(), settings)
    }
}

impl<S: SecretStore, R: RngCore> Provisioner<S, R> {
    /// Provisioner using a caller-provided generator
    pub fn with_generator(
        store: S,
        generator: SecretGenerator<R>,
        settings: ProvisionSettings,
    ) -> Self {
        let policy = RetryPolicy::from_settings(&settings);
        Self {
            store,
            generator,
            settings,
            policy,
        }
    }

    /// Run until the Secret is provisioned or a bound is hit
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when the failure or not-found bound is reached.
    pub async fn run(&mut self) -> Result<Outcome, ProvisionError> {
        let span = tracing::info_span!(
            "secret_provisioner.reconcile",
            namespace = %self.settings.namespace,
            name = %self.settings.name,
            key = %self.settings.key,
        );
        self.run_loop().instrument(span).await
    }

    async fn run_loop(&mut self) -> Result<Outcome, ProvisionError> {
        let mut state = RetryState::default();

        loop {
            let (next, decision) = match self.attempt().await {
                Ok(Step::Done(outcome)) => {
                    info!("Secret {}", outcome.as_str());
                    return Ok(outcome);
                }
                Ok(Step::AwaitingSecret) => {
                    let (next, decision) = self.policy.on_not_found(state);
                    if decision == RetryDecision::GiveUp {
                        error!(
                            waits = next.not_found_waits(),
                            "Secret never appeared, giving up"
                        );
                        return Err(ProvisionError::SecretNeverAppeared {
                            namespace: self.settings.namespace.clone(),
                            name: self.settings.name.clone(),
                            waits: next.not_found_waits(),
                        });
                    }
                    info!(
                        waits = next.not_found_waits(),
                        "Secret does not exist yet, waiting for it to be created"
                    );
                    (next, decision)
                }
                Err(err) => {
                    let (next, decision) = self.policy.on_failure(state);
                    warn!(attempt = next.failures(), error = %err, "Provisioning attempt failed");
                    if decision == RetryDecision::GiveUp {
                        error!(
                            failures = next.failures(),
                            "Unable to create/update Secret, giving up"
                        );
                        return Err(ProvisionError::RetriesExhausted {
                            namespace: self.settings.namespace.clone(),
                            name: self.settings.name.clone(),
                            failures: next.failures(),
                            last_error: err,
                        });
                    }
                    (next, decision)
                }
            };

            state = next;
            if let RetryDecision::RetryAfter(delay) = decision {
                debug!("Retrying in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn attempt(&mut self) -> Result<Step, AttemptError> {
        let namespace = self.settings.namespace.as_str();
        let name = self.settings.name.as_str();

        match fetch_state(&self.store, namespace, name).await? {
            ObjectState::NotFound => match self.settings.mode {
                ProvisionMode::UpdateOnly => Ok(Step::AwaitingSecret),
                ProvisionMode::CreateIfAbsent => {
                    let value = self
                        .generator
                        .generate(self.settings.length, self.settings.encoding)?;
                    let secret = desired::new_secret(
                        namespace,
                        name,
                        &self.settings.key,
                        &value,
                        &timestamp(),
                    );
                    self.store.create(namespace, &secret).await?;
                    Ok(Step::Done(Outcome::Created))
                }
            },
            ObjectState::Found(original) => {
                if guard::is_provisioned(&original) {
                    info!(
                        "Secret contains annotation '{}', exiting",
                        crate::constants::PROVISIONING_MARKER
                    );
                    return Ok(Step::Done(Outcome::AlreadyProvisioned));
                }

                let value = self
                    .generator
                    .generate(self.settings.length, self.settings.encoding)?;
                let desired =
                    desired::desired_state(&original, &self.settings.key, &value, &timestamp());
                let doc = patch::with_resource_version(
                    patch::diff(&original, &desired)?,
                    original.metadata.resource_version.as_deref(),
                );
                self.store.patch(namespace, name, &doc).await?;
                Ok(Step::Done(Outcome::Patched))
            }
        }
    }
}

/// Value of the marker annotation
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
