//! holdfast-probes — ready-made checks for `holdfast`.
//!
//! One-shot I/O probes implementing the [`holdfast::Check`] capability:
//!
//! - [`FileCheck`] — the target path exists
//! - [`TcpCheck`] — a TCP connection can be established
//! - [`HttpCheck`] — a GET returns the expected status code
//!
//! Each probe reports `type` and `target` metadata (plus `timeout` where it
//! applies), carries its own per-dial timeout independent of the engine's
//! overall deadline, and holds nothing open between evaluations.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use holdfast::{WaitOptions, Waiter};
//! use holdfast_probes::{HttpCheck, TcpCheck};
//!
//! # async fn demo() -> Result<(), holdfast::WaitError> {
//! Waiter::new()
//!     .check(TcpCheck::new("localhost:5432"))
//!     .check(HttpCheck::new("http://localhost:8080/healthz"))
//!     .wait(WaitOptions::new().timeout(Duration::from_secs(60)))
//!     .await
//! # }
//! ```

pub mod file;
pub mod http;
pub mod tcp;

pub use file::FileCheck;
pub use http::HttpCheck;
pub use tcp::TcpCheck;
