//! # Secret Provisioner
//!
//! A one-shot Kubernetes job that writes a randomly generated value into a Secret,
//! once.
//!
//! ## Overview
//!
//! Run as an init container or Helm hook. The job:
//!
//! 1. **Checks the OS random source** - aborts immediately if it cannot be read
//! 2. **Reads the target Secret** - `NAMESPACE` / `SECRET_NAME`
//! 3. **Skips** - if the Secret already carries the `secret-generation-time` annotation
//! 4. **Creates or patches** - writes a fresh value under `SECRET_KEY` together with
//!    the annotation
//!
//! Transient API failures are retried with a linear backoff; once the bound is
//! reached the job exits non-zero so the orchestrator reports the failure.
//!
//! ## Usage
//!
//! ```bash
//! NAMESPACE=ns1 SECRET_NAME=db-pass SECRET_KEY=password secret-provisioner
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use secret_provisioner::{generator, runtime, JobConfig, KubeSecretStore, Provisioner};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    runtime::init_tracing();

    // A broken random source is unrecoverable; never fall through to provisioning
    generator::assert_entropy_available().context("crypto random source is unavailable")?;

    // Exits non-zero with a usage message if NAMESPACE, SECRET_NAME or SECRET_KEY is missing
    let config = JobConfig::parse();
    info!(
        "Namespace: '{}' Name: '{}' Key: {}",
        config.namespace, config.secret_name, config.secret_key
    );

    let client = runtime::initialize().await?;
    let mut provisioner = Provisioner::new(KubeSecretStore::new(client), config.into());
    provisioner.run().await?;

    Ok(())
}
