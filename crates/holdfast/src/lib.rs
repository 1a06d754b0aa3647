//! holdfast — wait for dependencies to become healthy.
//!
//! A client-side readiness primitive: build checks, hand them to a
//! [`Waiter`], and block until every check succeeds, a fatal error is
//! signaled, or the deadline/caller cancellation ends the run.
//!
//! # Architecture
//!
//! ```text
//! Waiter::wait(options)
//!   ├── deadline watcher (timeout / caller token → shared CancellationToken)
//!   └── one retry loop per check (tokio task)
//!         ├── Scope (cancellation + metadata bag, "attempt" key)
//!         ├── Check::healthy() raced against cancellation
//!         ├── fatal?   → abort immediately
//!         ├── transient → sleep next_delay(delay, jitter), retry
//!         └── callback invoked synchronously once per attempt
//! ```
//!
//! Transient errors are contained inside each loop; `wait` surfaces exactly
//! one terminal [`WaitError`], inspectable for "was this fatal" and "was
//! this a timeout".
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use holdfast::{FnCheck, WaitOptions, Waiter};
//!
//! # async fn demo() -> Result<(), holdfast::WaitError> {
//! Waiter::new()
//!     .check(FnCheck::new(|| async { anyhow::Ok(()) }).with("type", "custom"))
//!     .wait(WaitOptions::new().timeout(Duration::from_secs(10)))
//!     .await
//! # }
//! ```

mod backoff;
pub mod check;
pub mod error;
pub mod options;
mod retry;
pub mod scope;
pub mod waiter;

pub use check::{Attempt, Callback, Check, FnCheck};
pub use error::{fatal, is_fatal, CancelCause, FatalError, WaitError};
pub use options::WaitOptions;
pub use scope::{Metadata, Scope, ATTEMPT_KEY};
pub use waiter::{wait, Waiter};
