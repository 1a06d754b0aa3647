//! HTTP GET probe.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use holdfast::{fatal, Check, Metadata, Scope};
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

/// Reports healthy once a GET against the target URL returns the expected
/// status code.
///
/// A malformed URL or a non-`http` scheme cannot be fixed by retrying and
/// is reported as fatal; connection, transport, and status-code failures
/// are transient.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    url: String,
    status: u16,
    timeout: Duration,
}

impl HttpCheck {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            timeout: Duration::from_secs(1),
        }
    }

    /// Sets the expected status code. Default: 200.
    pub fn expect_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the request timeout. Default: 1 second.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(&self) -> anyhow::Result<(String, http::Request<Empty<Bytes>>)> {
        let uri: http::Uri = self
            .url
            .parse()
            .with_context(|| format!("invalid url {:?}", self.url))?;

        if uri.scheme_str() != Some("http") {
            bail!("unsupported scheme in {:?}: only plain http", self.url);
        }
        let authority = uri.authority().context("url has no host")?.as_str().to_string();
        let host = uri.host().context("url has no host")?.to_string();
        let port = uri.port_u16().unwrap_or(80);

        let path = uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/")
            .to_string();

        let request = http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", authority)
            .header("user-agent", "holdfast-probes/0.1")
            .body(Empty::new())
            .context("build request")?;

        Ok((format!("{host}:{port}"), request))
    }

    async fn roundtrip(
        &self,
        addr: String,
        request: http::Request<Empty<Bytes>>,
    ) -> anyhow::Result<u16> {
        let stream = TcpStream::connect(&addr)
            .await
            .with_context(|| format!("connect {addr}"))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .context("http handshake")?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let response = sender
            .send_request(request)
            .await
            .with_context(|| format!("request to {}", self.url))?;

        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl Check for HttpCheck {
    async fn healthy(&self, _scope: &Scope) -> anyhow::Result<()> {
        // Request construction errors abort the retry loop.
        let (addr, request) = self.build_request().map_err(fatal)?;

        let status = tokio::time::timeout(self.timeout, self.roundtrip(addr, request))
            .await
            .with_context(|| {
                format!("request to {} timed out after {:?}", self.url, self.timeout)
            })??;

        if status != self.status {
            debug!(status, expected = self.status, url = %self.url, "http probe status mismatch");
            bail!("unexpected status code: {status}");
        }

        Ok(())
    }

    fn metadata(&self) -> Option<Metadata> {
        let mut md = Metadata::new();
        md.set("type", "http");
        md.set("target", self.url.clone());
        md.set("timeout", format!("{:?}", self.timeout));
        Some(md)
    }
}
