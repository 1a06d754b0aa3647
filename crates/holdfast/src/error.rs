//! Error types for the wait engine.
//!
//! Checks report failures as plain [`anyhow::Error`]s. An error wrapped with
//! [`fatal`] aborts the retry loop instead of scheduling another attempt;
//! [`is_fatal`] detects the marker anywhere in the cause chain, so fatal
//! errors stay fatal through added `.context(..)` layers.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Marker wrapped around a check error to stop retries.
///
/// Constructed via [`fatal`]; displays the inner message and exposes the
/// inner error through `source()`.
#[derive(Debug)]
pub struct FatalError(anyhow::Error);

impl FatalError {
    /// The wrapped error.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for FatalError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Marks the supplied error as fatal.
///
/// When a check returns a fatal error the retry loop stops immediately and
/// surfaces it as [`WaitError::Fatal`].
pub fn fatal(err: impl Into<anyhow::Error>) -> anyhow::Error {
    anyhow::Error::new(FatalError(err.into()))
}

/// Returns true if the error, or any error in its cause chain, was marked
/// fatal with [`fatal`].
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|e| e.downcast_ref::<FatalError>().is_some())
}

/// Why a wait run stopped retrying before its checks succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelCause {
    /// The engine's overall timeout elapsed.
    #[error("timed out waiting for checks")]
    TimedOut,

    /// The caller-supplied cancellation token fired.
    #[error("wait cancelled by caller")]
    Cancelled,

    /// Another check in the group reached a terminal failure first.
    #[error("aborted after another check failed")]
    CheckFailed,
}

/// Terminal error returned by [`Waiter::wait`](crate::Waiter::wait).
#[derive(Debug, Error)]
pub enum WaitError {
    /// A check returned an error marked fatal; retries were aborted.
    #[error("check failed: {source}")]
    Fatal {
        #[source]
        source: anyhow::Error,
    },

    /// The wait ended before the check succeeded. Preserves both the reason
    /// the wait ended and the last error observed from the check.
    #[error("{cause}: last check error: {last}")]
    Cancelled {
        cause: CancelCause,
        #[source]
        last: anyhow::Error,
    },
}

impl WaitError {
    /// True if a check aborted the wait with a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// True if the wait ended because the overall timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Cancelled {
                cause: CancelCause::TimedOut,
                ..
            }
        )
    }

    /// True if the wait ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled {
                cause: CancelCause::Cancelled,
                ..
            }
        )
    }

    /// The cancellation cause, if the wait was cancelled rather than
    /// aborted by a fatal check error.
    pub fn cause(&self) -> Option<CancelCause> {
        match self {
            Self::Fatal { .. } => None,
            Self::Cancelled { cause, .. } => Some(*cause),
        }
    }
}
