//! The per-check retry loop.
//!
//! Drives exactly one check to a terminal state: success, fatal failure, or
//! cancellation. Both the evaluation itself and the backoff sleep race
//! against the group's cancellation token, so a loop never waits out a full
//! backoff interval after the wait has been cancelled.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backoff::next_delay;
use crate::check::{Attempt, Callback, Check};
use crate::error::{is_fatal, CancelCause, WaitError};
use crate::scope::{Scope, ATTEMPT_KEY};

pub(crate) async fn run_check(
    check: Arc<dyn Check>,
    delay: Duration,
    jitter: Duration,
    callback: Option<Callback>,
    cancel: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
) -> Result<(), WaitError> {
    // Descriptive metadata is captured once at loop entry; only the attempt
    // counter changes between iterations.
    let mut scope = Scope::new(cancel.clone(), check.metadata().unwrap_or_default());
    let mut attempt: u32 = 1;

    loop {
        scope.metadata_mut().set(ATTEMPT_KEY, attempt.to_string());

        let outcome = tokio::select! {
            res = check.healthy(&scope) => Some(res),
            _ = cancel.cancelled() => None,
        };

        let last = match outcome {
            Some(Ok(())) => {
                notify(&callback, &scope, attempt, None);
                debug!(attempt, "check healthy");
                return Ok(());
            }
            Some(Err(err)) => {
                notify(&callback, &scope, attempt, Some(&err));
                if is_fatal(&err) {
                    warn!(attempt, error = %err, "check returned a fatal error, aborting retries");
                    return Err(WaitError::Fatal { source: err });
                }
                debug!(attempt, error = %err, "check not yet healthy");
                err
            }
            None => {
                // Cancelled mid-evaluation: the cancellation cause doubles
                // as this attempt's observed error.
                let cause = current_cause(&cause);
                let err = anyhow::Error::new(cause);
                notify(&callback, &scope, attempt, Some(&err));
                return Err(WaitError::Cancelled { cause, last: err });
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(next_delay(delay, jitter)) => {}
            _ = cancel.cancelled() => {
                return Err(WaitError::Cancelled {
                    cause: current_cause(&cause),
                    last,
                });
            }
        }

        attempt += 1;
    }
}

/// Reason the shared token fired. Falls back to caller cancellation if the
/// token was somehow cancelled without a recorded cause.
fn current_cause(cause: &OnceLock<CancelCause>) -> CancelCause {
    cause.get().copied().unwrap_or(CancelCause::Cancelled)
}

fn notify(callback: &Option<Callback>, scope: &Scope, number: u32, error: Option<&anyhow::Error>) {
    if let Some(cb) = callback {
        cb(scope, Attempt { number, error });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use anyhow::anyhow;

    use super::*;
    use crate::check::FnCheck;
    use crate::error::fatal;

    fn params() -> (CancellationToken, Arc<OnceLock<CancelCause>>) {
        (CancellationToken::new(), Arc::new(OnceLock::new()))
    }

    #[tokio::test]
    async fn fatal_error_aborts_without_delay() {
        let (cancel, cause) = params();
        let check = Arc::new(FnCheck::new(|| async { Err(fatal(anyhow!("bad"))) }));

        let start = Instant::now();
        let err = run_check(
            check,
            Duration::from_secs(60),
            Duration::ZERO,
            None,
            cancel,
            cause,
        )
        .await
        .unwrap_err();

        assert!(err.is_fatal());
        // A single backoff here would take a minute.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn attempt_counter_increments_after_retryable_failures() {
        let (cancel, cause) = params();
        let calls = Arc::new(AtomicU32::new(0));

        let c = calls.clone();
        let check = Arc::new(FnCheck::new(move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(anyhow!("not yet"))
                } else {
                    Ok(())
                }
            }
        }));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = seen.clone();
        let callback: Callback = Arc::new(move |scope: &Scope, attempt: Attempt<'_>| {
            let in_scope = scope.metadata().get(ATTEMPT_KEY).unwrap().to_string();
            s.lock().unwrap().push((attempt.number, in_scope));
        });

        run_check(
            check,
            Duration::from_millis(1),
            Duration::ZERO,
            Some(callback),
            cancel,
            cause,
        )
        .await
        .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (3, "3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_during_backoff_keeps_last_error() {
        let (cancel, cause) = params();
        cause.set(CancelCause::TimedOut).unwrap();

        let check = Arc::new(FnCheck::new(|| async { Err(anyhow!("still down")) }));

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let err = run_check(
            check,
            Duration::from_secs(60),
            Duration::ZERO,
            None,
            cancel,
            cause,
        )
        .await
        .unwrap_err();

        // Cancellation interrupted the backoff rather than waiting it out.
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(err.is_timeout());
        match err {
            WaitError::Cancelled { last, .. } => {
                assert_eq!(last.to_string(), "still down");
            }
            other => panic!("expected cancelled, got {other:?}"),
        }
    }
}
