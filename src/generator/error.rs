//! # Generator Error Types

use thiserror::Error;

/// The secure randomness source could not supply the requested bytes
///
/// At startup this is fatal. During reconciliation it counts as a transient
/// failure and the whole cycle is retried.
#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct EntropyUnavailable(#[from] rand::Error);
