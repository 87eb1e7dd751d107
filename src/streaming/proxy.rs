//! Chunked upstream proxy with Range pass-through.
//!
//! The upstream body is relayed as it arrives, re-cut into pieces no larger
//! than the configured chunk size, so memory stays bounded whatever the file
//! size.

use std::io;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use podstream_common::{Error, Result};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;

/// Response headers copied from upstream. Everything else is dropped.
const FORWARDED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

/// Relays an upstream audio URL to the client.
#[derive(Clone)]
pub struct ProxyStreamer {
    client: Client,
    chunk_size: usize,
}

impl ProxyStreamer {
    /// Create a proxy. Only connecting is time-bounded; bodies may stream for
    /// as long as the track lasts.
    pub fn new(chunk_size: usize, connect_timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build proxy HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.proxy.chunk_size,
            Duration::from_secs(config.proxy.connect_timeout_secs),
            &config.resolver.user_agent,
        )
    }

    /// Stream `upstream_url` back to the caller.
    ///
    /// `range` is forwarded verbatim. The upstream status and the
    /// Content-Type/Length/Range and Accept-Ranges headers are passed through.
    ///
    /// # Errors
    ///
    /// [`Error::Upstream`] when the upstream cannot be reached, answers with a
    /// status of 400 or above, or fails before its first body chunk. No body
    /// bytes have been produced in any of these cases.
    pub async fn proxy(&self, upstream_url: &str, range: Option<&HeaderValue>) -> Result<Response> {
        let mut request = self.client.get(upstream_url);
        if let Some(range) = range {
            request = request.header(reqwest::header::RANGE, range.as_bytes());
        }

        let upstream = request
            .send()
            .await
            .map_err(|e| Error::upstream(format!("upstream request failed: {e}")))?;

        let status_code = upstream.status().as_u16();
        if status_code >= 400 {
            return Err(Error::upstream(format!("upstream returned HTTP {status_code}")));
        }
        let status = StatusCode::from_u16(status_code)
            .map_err(|e| Error::upstream(format!("invalid upstream status: {e}")))?;

        let mut builder = Response::builder().status(status);
        for name in FORWARDED_HEADERS {
            if let Some(value) = upstream.headers().get(name.as_str()) {
                if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                    builder = builder.header(name, value);
                }
            }
        }

        let chunk_size = self.chunk_size;
        let mut body: BoxStream<'static, io::Result<Bytes>> = upstream
            .bytes_stream()
            .map_err(io::Error::other)
            .flat_map(move |item| {
                let pieces: Vec<io::Result<Bytes>> = match item {
                    Ok(bytes) => bounded_chunks(bytes, chunk_size).into_iter().map(Ok).collect(),
                    Err(e) => {
                        debug!(error = %e, "upstream stream ended early");
                        vec![Err(e)]
                    }
                };
                stream::iter(pieces)
            })
            .boxed();

        // An upstream that dies before the first chunk is still a clean failure.
        let first = match body.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => {
                return Err(Error::upstream(format!("upstream failed before first byte: {e}")))
            }
            None => None,
        };

        let stream = stream::iter(first.map(Ok::<_, io::Error>)).chain(body);

        builder
            .body(Body::from_stream(stream))
            .map_err(|e| Error::internal(format!("failed to build proxy response: {e}")))
    }
}

/// Split `bytes` into pieces of at most `max` bytes without copying.
pub fn bounded_chunks(mut bytes: Bytes, max: usize) -> Vec<Bytes> {
    let max = max.max(1);
    let mut chunks = Vec::with_capacity(bytes.len() / max + 1);
    while bytes.len() > max {
        chunks.push(bytes.split_to(max));
    }
    if !bytes.is_empty() {
        chunks.push(bytes);
    }
    chunks
}
