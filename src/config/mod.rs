//! # Job Configuration
//!
//! Inputs of the job, read from command-line flags or, more commonly, from
//! environment variables set on the Job / init container.
//!
//! `NAMESPACE`, `SECRET_NAME` and `SECRET_KEY` are required; a missing or empty
//! value aborts the process before any cluster call is made. Everything else
//! has a default from [`crate::constants`].

use crate::constants::{
    DEFAULT_BACKOFF_STEP_SECS, DEFAULT_MAX_FAILURES, DEFAULT_MAX_NOT_FOUND_WAITS,
    DEFAULT_NOT_FOUND_INTERVAL_SECS, DEFAULT_SECRET_LENGTH,
};
use crate::generator::SecretEncoding;
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// What to do when the target Secret does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProvisionMode {
    /// Create the Secret with the marker and generated value
    #[default]
    CreateIfAbsent,
    /// Wait for someone else to create the Secret; never create it
    UpdateOnly,
}

/// Command-line / environment surface of the job
#[derive(Debug, Clone, Parser)]
#[command(name = "secret-provisioner", version)]
#[command(about = "Provision a random value into a Kubernetes Secret, once", long_about = None)]
pub struct JobConfig {
    /// Namespace of the target Secret
    #[arg(long, env = "NAMESPACE", value_parser = NonEmptyStringValueParser::new())]
    pub namespace: String,

    /// Name of the target Secret
    #[arg(long, env = "SECRET_NAME", value_parser = NonEmptyStringValueParser::new())]
    pub secret_name: String,

    /// Data key that receives the generated value
    #[arg(long, env = "SECRET_KEY", value_parser = NonEmptyStringValueParser::new())]
    pub secret_key: String,

    /// Behaviour when the Secret does not exist
    #[arg(long, env = "PROVISION_MODE", value_enum, default_value_t = ProvisionMode::CreateIfAbsent)]
    pub mode: ProvisionMode,

    /// Encoding of the generated value
    #[arg(long, env = "SECRET_ENCODING", value_enum, default_value_t = SecretEncoding::UrlSafe)]
    pub encoding: SecretEncoding,

    /// Random bytes (url-safe) or characters (alphanumeric) to generate
    #[arg(long, env = "SECRET_LENGTH", default_value_t = DEFAULT_SECRET_LENGTH, value_parser = parse_length)]
    pub length: usize,

    /// Consecutive failed attempts before giving up
    #[arg(long, env = "MAX_FAILURES", default_value_t = DEFAULT_MAX_FAILURES,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_failures: u32,

    /// Linear backoff step in seconds (the n-th failure sleeps n * step)
    #[arg(long, env = "BACKOFF_STEP_SECS", default_value_t = DEFAULT_BACKOFF_STEP_SECS)]
    pub backoff_step_secs: u64,

    /// Seconds between reads while waiting for the Secret to appear (update-only mode)
    #[arg(long, env = "NOT_FOUND_INTERVAL_SECS", default_value_t = DEFAULT_NOT_FOUND_INTERVAL_SECS)]
    pub not_found_interval_secs: u64,

    /// Reads that may find the Secret missing before giving up (update-only mode)
    #[arg(long, env = "MAX_NOT_FOUND_WAITS", default_value_t = DEFAULT_MAX_NOT_FOUND_WAITS,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_not_found_waits: u32,
}

fn parse_length(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("length must be at least 1".to_string()),
        Ok(length) => Ok(length),
        Err(e) => Err(e.to_string()),
    }
}

/// Settings consumed by [`crate::provisioner::Provisioner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    /// Namespace of the target Secret
    pub namespace: String,
    /// Name of the target Secret
    pub name: String,
    /// Data key that receives the generated value
    pub key: String,
    /// Behaviour when the Secret does not exist
    pub mode: ProvisionMode,
    /// Encoding of the generated value
    pub encoding: SecretEncoding,
    /// Random bytes (url-safe) or characters (alphanumeric) to generate
    pub length: usize,
    /// Consecutive failed attempts before giving up
    pub max_failures: u32,
    /// Linear backoff step; the n-th failure sleeps `n * backoff_step`
    pub backoff_step: Duration,
    /// Fixed sleep between reads of a missing Secret (update-only mode)
    pub not_found_interval: Duration,
    /// Reads of a missing Secret before giving up (update-only mode)
    pub max_not_found_waits: u32,
}

impl ProvisionSettings {
    /// Settings for `namespace/name` and `key` with every other value at its default
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            key: key.into(),
            mode: ProvisionMode::default(),
            encoding: SecretEncoding::default(),
            length: DEFAULT_SECRET_LENGTH,
            max_failures: DEFAULT_MAX_FAILURES,
            backoff_step: Duration::from_secs(DEFAULT_BACKOFF_STEP_SECS),
            not_found_interval: Duration::from_secs(DEFAULT_NOT_FOUND_INTERVAL_SECS),
            max_not_found_waits: DEFAULT_MAX_NOT_FOUND_WAITS,
        }
    }
}

impl From<JobConfig> for ProvisionSettings {
    fn from(config: JobConfig) -> Self {
        Self {
            namespace: config.namespace,
            name: config.secret_name,
            key: config.secret_key,
            mode: config.mode,
            encoding: config.encoding,
            length: config.length,
            max_failures: config.max_failures,
            backoff_step: Duration::from_secs(config.backoff_step_secs),
            not_found_interval: Duration::from_secs(config.not_found_interval_secs),
            max_not_found_waits: config.max_not_found_waits,
        }
    }
}
