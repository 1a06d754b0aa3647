//! TCP dial probe.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use holdfast::{Check, Metadata, Scope};
use tokio::net::TcpStream;

/// Reports healthy once a TCP connection to the target address can be
/// established. The connection is closed immediately after the dial.
#[derive(Debug, Clone)]
pub struct TcpCheck {
    addr: String,
    timeout: Duration,
}

impl TcpCheck {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Sets the dial timeout. Default: 1 second.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Check for TcpCheck {
    async fn healthy(&self, _scope: &Scope) -> anyhow::Result<()> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .with_context(|| format!("dial {} timed out after {:?}", self.addr, self.timeout))?
            .with_context(|| format!("dial {}", self.addr))?;
        drop(stream);
        Ok(())
    }

    fn metadata(&self) -> Option<Metadata> {
        let mut md = Metadata::new();
        md.set("type", "tcp");
        md.set("target", self.addr.clone());
        md.set("timeout", format!("{:?}", self.timeout));
        Some(md)
    }
}
