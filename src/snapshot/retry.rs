//! Bounded retry around a flaky source.

use super::SnapshotSource;
use crate::entity::{Device, Screen};
use crate::error::Result;
use std::thread;
use std::time::Duration;

/// How often and how patiently to re-ask a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 10, backoff: Duration::from_millis(1500) }
    }
}

/// Re-issues requests that failed with a transient error. Other errors,
/// including short history, pass through on the first attempt.
#[derive(Debug, Clone)]
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: SnapshotSource> Retrying<S> {
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn attempt<T>(&self, what: &str, request: impl Fn(&S) -> Result<T>) -> Result<T> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;
        loop {
            match request(&self.inner) {
                Err(err) if err.is_transient() && attempt < attempts => {
                    log::warn!("{what} request failed (attempt {attempt}/{attempts}): {err}");
                    thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<S: SnapshotSource> SnapshotSource for Retrying<S> {
    fn layout(&self, previous: bool) -> Result<Screen> {
        self.attempt("layout", |s| s.layout(previous))
    }

    fn device_info(&self, previous: bool) -> Result<Device> {
        self.attempt("device info", |s| s.device_info(previous))
    }
}
