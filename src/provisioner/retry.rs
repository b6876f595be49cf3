//! # Retry Policy
//!
//! Bounded linear backoff for failed attempts, plus a bounded fixed-interval
//! wait for a Secret that does not exist yet (update-only mode).
//!
//! Failures back off linearly rather than exponentially: the n-th consecutive
//! failure sleeps `n * step`. With the defaults (step 2s, bound 4) the job sleeps
//! 2s, 4s and 6s, then gives up on the fourth failure.
//!
//! ## Usage
//!
//! ```rust
//! use secret_provisioner::provisioner::retry::{RetryDecision, RetryPolicy, RetryState};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(4, Duration::from_secs(2), Duration::from_secs(10), 30);
//! let (state, decision) = policy.on_failure(RetryState::default());
//! assert_eq!(state.failures(), 1);
//! assert_eq!(decision, RetryDecision::RetryAfter(Duration::from_secs(2)));
//! ```

use crate::config::ProvisionSettings;
use std::time::Duration;

/// Counters carried from one attempt to the next
///
/// Never mutated in place: every observation returns a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    failures: u32,
    not_found_waits: u32,
}

impl RetryState {
    /// Consecutive failed attempts so far
    #[must_use]
    pub fn failures(self) -> u32 {
        self.failures
    }

    /// Reads that found the Secret missing so far
    #[must_use]
    pub fn not_found_waits(self) -> u32 {
        self.not_found_waits
    }

    #[must_use]
    fn record_failure(self) -> Self {
        Self {
            failures: self.failures.saturating_add(1),
            ..self
        }
    }

    #[must_use]
    fn record_not_found(self) -> Self {
        Self {
            not_found_waits: self.not_found_waits.saturating_add(1),
            ..self
        }
    }
}

/// What the driver does after an unsuccessful attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then start over from reading the Secret
    RetryAfter(Duration),
    /// The bound is reached; abort
    GiveUp,
}

/// Retry bounds and delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_failures: u32,
    backoff_step: Duration,
    not_found_interval: Duration,
    max_not_found_waits: u32,
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Arguments
    ///
    /// * `max_failures` - consecutive failures that abort the run
    /// * `backoff_step` - linear backoff step
    /// * `not_found_interval` - fixed sleep between reads of a missing Secret
    /// * `max_not_found_waits` - missing-Secret reads that abort the run
    #[must_use]
    pub fn new(
        max_failures: u32,
        backoff_step: Duration,
        not_found_interval: Duration,
        max_not_found_waits: u32,
    ) -> Self {
        Self {
            max_failures,
            backoff_step,
            not_found_interval,
            max_not_found_waits,
        }
    }

    /// Policy described by the job settings
    #[must_use]
    pub fn from_settings(settings: &ProvisionSettings) -> Self {
        Self::new(
            settings.max_failures,
            settings.backoff_step,
            settings.not_found_interval,
            settings.max_not_found_waits,
        )
    }

    /// Sleep before retrying after `failures` consecutive failures
    ///
    /// ```rust
    /// use secret_provisioner::provisioner::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(5, Duration::from_secs(2), Duration::from_secs(10), 30);
    /// assert_eq!(policy.backoff_for(3), Duration::from_secs(6));
    /// ```
    #[must_use]
    pub fn backoff_for(&self, failures: u32) -> Duration {
        self.backoff_step.saturating_mul(failures)
    }

    /// Record a failed attempt and decide whether to retry
    #[must_use]
    pub fn on_failure(&self, state: RetryState) -> (RetryState, RetryDecision) {
        let state = state.record_failure();
        let decision = if state.failures >= self.max_failures {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.backoff_for(state.failures))
        };
        (state, decision)
    }

    /// Record a read that found the Secret missing and decide whether to keep waiting
    #[must_use]
    pub fn on_not_found(&self, state: RetryState) -> (RetryState, RetryDecision) {
        let state = state.record_not_found();
        let decision = if state.not_found_waits >= self.max_not_found_waits {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.not_found_interval)
        };
        (state, decision)
    }
}
