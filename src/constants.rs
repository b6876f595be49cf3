//! # Constants
//!
//! Shared constants used throughout the provisioner.
//!
//! These values represent the defaults of the job and can be overridden via
//! command-line flags or environment variables where applicable.

/// Annotation whose presence marks a Secret as already provisioned.
///
/// The value is the provisioning timestamp and is never read back.
pub const PROVISIONING_MARKER: &str = "secret-generation-time";

/// Field manager recorded on every write made by the job
pub const FIELD_MANAGER: &str = "secret-provisioner";

/// Default number of generated units (bytes for URL-safe, characters for alphanumeric)
pub const DEFAULT_SECRET_LENGTH: usize = 31;

/// Default number of consecutive failed attempts before giving up
pub const DEFAULT_MAX_FAILURES: u32 = 4;

/// Default linear backoff step (seconds); the n-th failure sleeps `n * step`
pub const DEFAULT_BACKOFF_STEP_SECS: u64 = 2;

/// Default interval between reads while waiting for a Secret to appear (seconds)
pub const DEFAULT_NOT_FOUND_INTERVAL_SECS: u64 = 10;

/// Default number of reads that may observe a missing Secret in update-only mode
pub const DEFAULT_MAX_NOT_FOUND_WAITS: u32 = 30;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "secret_provisioner=info";
