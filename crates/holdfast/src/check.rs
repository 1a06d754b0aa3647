//! The check capability.
//!
//! A [`Check`] answers "is this dependency healthy right now?". Reporting
//! descriptive metadata is a second, optional capability: the engine asks
//! via [`Check::metadata`] and checks that have nothing to say keep the
//! default. The engine holds checks as `Arc<dyn Check>` and treats them as
//! stateless between evaluations.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::scope::{Metadata, Scope};

/// A health probe for one dependency.
#[async_trait]
pub trait Check: Send + Sync {
    /// Runs one evaluation of the check.
    ///
    /// `Ok(())` means the dependency is healthy. Errors are retried unless
    /// marked with [`fatal`](crate::fatal), which aborts the retry loop.
    async fn healthy(&self, scope: &Scope) -> anyhow::Result<()>;

    /// Descriptive metadata for the check, if it provides any.
    ///
    /// Captured once per wait run and carried in the [`Scope`] alongside the
    /// attempt counter. Probes conventionally report `type` and `target`.
    fn metadata(&self) -> Option<Metadata> {
        None
    }
}

/// One observation handed to the wait callback.
///
/// Created fresh for every attempt and not retained by the engine.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    /// 1-based attempt number for this check.
    pub number: u32,
    /// Error from this attempt; `None` on success.
    pub error: Option<&'a anyhow::Error>,
}

/// Observer invoked synchronously after every attempt.
///
/// Within one check the invocations are strictly ordered and never overlap;
/// across concurrently waited checks they may run in parallel, so the
/// callback must be safe to call concurrently.
pub type Callback = Arc<dyn Fn(&Scope, Attempt<'_>) + Send + Sync>;

/// Adapts an async closure into a [`Check`].
///
/// ```no_run
/// use holdfast::FnCheck;
///
/// let check = FnCheck::new(|| async { anyhow::Ok(()) })
///     .with("type", "custom")
///     .with("target", "warm cache");
/// ```
pub struct FnCheck<F> {
    f: F,
    metadata: Metadata,
}

impl<F> FnCheck<F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            metadata: Metadata::new(),
        }
    }

    /// Adds a descriptive metadata pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.set(key, value);
        self
    }
}

#[async_trait]
impl<F, Fut> Check for FnCheck<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn healthy(&self, _scope: &Scope) -> anyhow::Result<()> {
        (self.f)().await
    }

    fn metadata(&self) -> Option<Metadata> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(self.metadata.clone())
        }
    }
}
