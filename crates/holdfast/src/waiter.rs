//! The waiter: fan-out/fan-in coordination across checks.
//!
//! One retry loop is spawned per check; all loops share a single
//! cancellation token. A watcher task links the token to the engine
//! deadline and the caller-supplied token, recording which one fired
//! before cancelling so loops can label their terminal errors. The first
//! loop to fail cancels the token itself, so siblings stop retrying
//! without waiting on the coordinator to notice.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::check::Check;
use crate::error::{CancelCause, WaitError};
use crate::options::WaitOptions;
use crate::retry::run_check;

/// Runs a group of checks concurrently until all succeed or the first
/// terminal failure ends the run.
#[derive(Default)]
pub struct Waiter {
    checks: Vec<Arc<dyn Check>>,
}

impl Waiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a check to the group. Insertion order is preserved, but
    /// execution across checks is concurrent and unordered.
    pub fn check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Adds an already-shared check to the group.
    pub fn check_arc(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs every check until it succeeds, retrying with backoff and
    /// jitter, and returns once all checks are healthy.
    ///
    /// An empty group succeeds immediately. Otherwise the run ends early on
    /// the first fatal check error, on expiry of the configured timeout, or
    /// on cancellation of the caller-supplied token; sibling loops are
    /// cancelled promptly and the first terminal error wins.
    ///
    /// Dropping the returned future cancels the run: the retry loops and
    /// the deadline watcher wind down instead of retrying detached.
    pub async fn wait(&self, options: WaitOptions) -> Result<(), WaitError> {
        if self.checks.is_empty() {
            return Ok(());
        }

        debug!(checks = self.checks.len(), "waiting for checks");

        let cancel = CancellationToken::new();
        let cause: Arc<OnceLock<CancelCause>> = Arc::new(OnceLock::new());

        // Cancels the token when this future is dropped, normal return
        // included, so no spawned task outlives the call.
        let _guard = cancel.clone().drop_guard();

        spawn_deadline_watcher(
            options.timeout,
            options.cancel.clone(),
            cancel.clone(),
            cause.clone(),
        );

        let (tx, mut rx) = mpsc::channel(self.checks.len());
        for check in &self.checks {
            let check = check.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            let cause = cause.clone();
            let callback = options.callback.clone();
            let (delay, jitter) = (options.delay, options.jitter);

            tokio::spawn(async move {
                let res = run_check(check, delay, jitter, callback, cancel.clone(), cause.clone())
                    .await;
                let failed = res.is_err();
                // The channel is buffered to the group size, so this never
                // blocks. Sending before cancelling keeps the instigating
                // error ahead of the cancellations it induces in siblings.
                let _ = tx.send(res).await;
                if failed {
                    // First terminal failure stops the siblings promptly.
                    let _ = cause.set(CancelCause::CheckFailed);
                    cancel.cancel();
                }
            });
        }
        drop(tx);

        // Join-style fan-in: block until every loop has reported, keeping
        // the first error in arrival order.
        let mut first_err = None;
        while let Some(res) = rx.recv().await {
            if let Err(err) = res {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Waits for a single check; equivalent to a one-element [`Waiter`].
pub async fn wait(check: impl Check + 'static, options: WaitOptions) -> Result<(), WaitError> {
    Waiter::new().check(check).wait(options).await
}

fn spawn_deadline_watcher(
    timeout: Duration,
    caller: Option<CancellationToken>,
    cancel: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout), if !timeout.is_zero() => {
                let _ = cause.set(CancelCause::TimedOut);
            }
            _ = caller_cancelled(&caller) => {
                let _ = cause.set(CancelCause::Cancelled);
            }
            // The run ended first, either normally or because a loop
            // failed; nothing left to watch.
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    });
}

/// Resolves when the caller token fires; pends forever without one.
async fn caller_cancelled(token: &Option<CancellationToken>) {
    match token {
        Some(t) => t.cancelled().await,
        None => std::future::pending().await,
    }
}
