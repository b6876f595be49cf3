//! # Initialization
//!
//! Job initialization: tracing subscriber, rustls crypto provider and the
//! Kubernetes client.

use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{Context, Result};
use kube::Client;
use tracing::{debug, info};

/// Install the tracing subscriber
///
/// Logs go to stderr. The filter comes from `RUST_LOG` and defaults to
/// `secret_provisioner=info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        // Only happens if a subscriber is already installed (e.g. in tests)
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Configure the rustls crypto provider and build a Kubernetes client
///
/// The client uses in-cluster configuration when running in a pod and falls
/// back to the local kubeconfig otherwise.
pub async fn initialize() -> Result<Client> {
    // Required for rustls 0.23+ before any TLS connection is opened
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting secret-provisioner v{}", env!("CARGO_PKG_VERSION"));

    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}
