//! Per-check request scope.
//!
//! Each retry loop owns one [`Scope`]: the shared cancellation token plus a
//! loop-private [`Metadata`] bag. The scope is threaded by reference into
//! both the check and the observer callback, so nothing about an attempt is
//! ambient state. Loops never share a bag, even though every loop in a group
//! shares one cancellation token.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

/// Metadata key under which the engine stores the current attempt number.
pub const ATTEMPT_KEY: &str = "attempt";

/// Ordered key/value metadata describing a check and the current attempt.
///
/// Probes conventionally set at least `type` and `target`; the engine adds
/// [`ATTEMPT_KEY`] before every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata key/value, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Gets the metadata value for the key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Cancellable operation context handed to checks and callbacks.
#[derive(Debug, Clone)]
pub struct Scope {
    cancel: CancellationToken,
    metadata: Metadata,
}

impl Default for Scope {
    /// A detached scope: never cancelled, empty metadata. Useful for
    /// exercising a [`Check`](crate::Check) outside the engine.
    fn default() -> Self {
        Self::new(CancellationToken::new(), Metadata::new())
    }
}

impl Scope {
    pub fn new(cancel: CancellationToken, metadata: Metadata) -> Self {
        Self { cancel, metadata }
    }

    /// Metadata for the current attempt.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// True once the wait has been cancelled.
    ///
    /// Long-running checks can poll this to bail out early; the engine
    /// already races every evaluation against cancellation, so observing it
    /// is an optimization, not a requirement.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the wait has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
