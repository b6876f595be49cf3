//! # Runtime Module
//!
//! Process-level setup for the job: logging, TLS crypto provider and the
//! Kubernetes client.

pub mod initialization;

pub use initialization::*;
