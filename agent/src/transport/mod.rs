//! C2: transport session — resolve, open a (TLS) connection, issue one HTTP
//! request, stream the response body to a [`ResponseSink`], close.
//!
//! Built on `reqwest` (itself a `hyper` client) rather than bare `hyper`: a
//! fixed Unix socket client never resolves a hostname or negotiates TLS,
//! while this transport needs real DNS resolution, a pinned CA, and SNI —
//! all things `reqwest` handles without reimplementing connection setup by
//! hand (see DESIGN.md for the substitution rationale).

use std::time::Duration;

use http::{Method, StatusCode};
use thiserror::Error;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::{AgentConfig, RESOLVE_MAX_ATTEMPTS, RESOLVE_RETRY_PAUSE, REQUEST_TIMEOUT};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("name resolution failed after {RESOLVE_MAX_ATTEMPTS} attempts")]
    Resolve,
    #[error("HTTP transport error")]
    Http(#[from] reqwest::Error),
    #[error("invalid request URL")]
    Url(#[from] url::ParseError),
}

/// Visitor fed response body slices as they arrive, plus the response's
/// advertised content length before the first slice. Assemblers (C3)
/// implement this; a session never interprets the bytes itself.
pub trait ResponseSink {
    /// Called once, before any [`ResponseSink::chunk`] call, with the
    /// response's `Content-Length` if the server sent one.
    fn start(&mut self, _content_length: Option<u64>) {}

    /// Called once per received slice, and exactly once more with an empty
    /// slice and `is_final = true` after the body is fully read (even for
    /// empty bodies). A single-threaded driver can collapse the completion
    /// signal straight into this flag rather than a separate semaphore.
    fn chunk(&mut self, data: &[u8], is_final: bool);
}

/// Status and metadata of a completed request, independent of whichever
/// [`ResponseSink`] consumed the body.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub content_length: Option<u64>,
}

/// An open session against the rollout server: a resolved, TLS-configured
/// `reqwest::Client` plus the base URL requests are issued relative to.
pub struct Session {
    client: reqwest::Client,
    base: url::Url,
}

impl Session {
    /// Resolves the host, builds a TLS-configured client if requested, and
    /// returns a session ready to issue requests. Resolution is retried up
    /// to [`RESOLVE_MAX_ATTEMPTS`] times with a [`RESOLVE_RETRY_PAUSE`]
    /// pause between attempts before giving up with [`TransportError::Resolve`].
    pub async fn open(config: &AgentConfig) -> Result<Session, TransportError> {
        resolve_with_retries(&config.server_host, config.server_port).await?;

        let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
        if config.tls_enabled {
            builder = builder.use_rustls_tls().tls_sni(true);
            if let Some(ca) = &config.ca_certificate {
                builder = builder.add_root_certificate(ca.clone());
            }
        }
        let client = builder.build()?;

        let scheme = if config.tls_enabled { "https" } else { "http" };
        let base = url::Url::parse(&format!(
            "{scheme}://{}:{}",
            config.server_host, config.server_port
        ))?;

        Ok(Session { client, base })
    }

    /// Issues one request, feeding the response body to `sink` as it
    /// arrives. `path` is resolved relative to the session's base URL.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        sink: &mut dyn ResponseSink,
    ) -> Result<ResponseMeta, TransportError> {
        use futures_util::StreamExt;

        let url = self.base.join(path.trim_start_matches('/'))?;
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json;charset=UTF-8")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_length = response.content_length();
        sink.start(content_length);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.chunk(&chunk, false);
        }
        sink.chunk(&[], true);

        Ok(ResponseMeta {
            status,
            content_length,
        })
    }

    /// Releases the session. `reqwest::Client` tears down idle connections
    /// on drop; this exists so callers have an explicit point mirroring the
    /// source's `close(session)`.
    pub fn close(self) {}
}

async fn resolve_with_retries(host: &str, port: u16) -> Result<(), TransportError> {
    let host = host.to_string();
    let strategy = FixedInterval::new(RESOLVE_RETRY_PAUSE).take(RESOLVE_MAX_ATTEMPTS - 1);
    Retry::spawn(strategy, move || {
        let host = host.clone();
        async move { tokio::net::lookup_host((host.as_str(), port)).await }
    })
    .await
    .map(|_| ())
    .map_err(|_| TransportError::Resolve)
}

/// A sink that discards the response body — used for requests whose
/// response is only checked for status (feedback acks, config pushes).
pub struct NullSink;

impl ResponseSink for NullSink {
    fn chunk(&mut self, _data: &[u8], _is_final: bool) {}
}
