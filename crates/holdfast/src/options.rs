//! Wait configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::check::{Attempt, Callback};
use crate::scope::Scope;

/// Configuration for one wait run.
///
/// Resolved once before the run starts and immutable afterwards; clone it to
/// reuse the same options across runs. All fields are public, so options can
/// be built either with the struct-update syntax or the builder methods.
#[derive(Clone)]
pub struct WaitOptions {
    /// Overall deadline for the whole group. `Duration::ZERO` disables the
    /// engine-imposed deadline, leaving only the caller token (if any) to
    /// end an unsuccessful wait. Default: 30 seconds.
    pub timeout: Duration,

    /// Base delay between attempts of one check. Default: 1 second.
    pub delay: Duration,

    /// Maximum random extra added to each delay. Non-zero by default
    /// (100 milliseconds) so concurrently waited checks do not retry in
    /// lockstep.
    pub jitter: Duration,

    /// Caller-supplied cancellation token. Cancelling it ends the run
    /// promptly, independent of the timeout.
    pub cancel: Option<CancellationToken>,

    /// Observer invoked synchronously after every attempt.
    pub callback: Option<Callback>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            delay: Duration::from_secs(1),
            jitter: Duration::from_millis(100),
            cancel: None,
            callback: None,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the base delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the maximum jitter added to each delay.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Supplies an external cancellation token.
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Installs the observer callback.
    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: Fn(&Scope, Attempt<'_>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for WaitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitOptions")
            .field("timeout", &self.timeout)
            .field("delay", &self.delay)
            .field("jitter", &self.jitter)
            .field("cancel", &self.cancel.is_some())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
