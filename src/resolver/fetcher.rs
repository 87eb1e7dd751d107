//! Per-mirror fetch: the trait the racer drives and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use podstream_common::{MediaId, MirrorSchema, StreamCandidate};
use reqwest::Client;
use tracing::trace;

use super::providers::{invidious, piped};
use super::registry::Mirror;

/// Why a single mirror contributed nothing to a race.
///
/// None of these ever escape the resolver: they are logged and the mirror is
/// treated as having no candidates.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Connection refused, DNS failure, reset, ...
    #[error("mirror unreachable: {0}")]
    Unreachable(String),

    /// No complete answer within the per-mirror bound.
    #[error("mirror timed out after {0:?}")]
    Timeout(Duration),

    /// The mirror answered with a non-success status.
    #[error("mirror returned HTTP {0}")]
    Status(u16),

    /// The body did not have the expected shape.
    #[error("malformed mirror response: {0}")]
    Malformed(String),
}

/// Asks one mirror for the candidate streams of an identifier.
///
/// Implementations must be cheap to share across tasks; the racer holds them
/// in an `Arc` and calls them from one task per mirror.
#[async_trait]
pub trait MirrorFetcher: Send + Sync {
    /// Fetch the candidates `mirror` offers for `id`, in response order.
    ///
    /// An empty list is a valid answer (the mirror knows the id but has no
    /// audio streams); the racer treats it like a failure.
    async fn fetch(
        &self,
        mirror: &Mirror,
        id: &MediaId,
    ) -> Result<Vec<StreamCandidate>, MirrorError>;
}

/// [`MirrorFetcher`] speaking the Piped and Invidious HTTP APIs.
#[derive(Clone)]
pub struct HttpMirrorFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpMirrorFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self { client, timeout }
    }

    fn classify(&self, e: reqwest::Error) -> MirrorError {
        if e.is_timeout() {
            MirrorError::Timeout(self.timeout)
        } else if e.is_decode() || e.is_body() {
            MirrorError::Malformed(e.to_string())
        } else {
            MirrorError::Unreachable(e.to_string())
        }
    }

    async fn get_body(&self, url: &str) -> Result<bytes::Bytes, MirrorError> {
        trace!(url, "querying mirror");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "*/*, application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(MirrorError::Status(response.status().as_u16()));
        }

        response.bytes().await.map_err(|e| self.classify(e))
    }
}

#[async_trait]
impl MirrorFetcher for HttpMirrorFetcher {
    async fn fetch(
        &self,
        mirror: &Mirror,
        id: &MediaId,
    ) -> Result<Vec<StreamCandidate>, MirrorError> {
        match mirror.schema {
            MirrorSchema::Piped => {
                let body = self.get_body(&piped::streams_url(&mirror.base_url, id)).await?;
                piped::parse_streams(&body)
            }
            MirrorSchema::Invidious => {
                let body = self
                    .get_body(&invidious::video_url(&mirror.base_url, id))
                    .await?;
                invidious::parse_formats(&body)
            }
        }
    }
}
