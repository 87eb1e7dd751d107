//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] whose mirrors
//! are wiremock servers and whose local extractor is a scripted engine. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use podstream::config::{Config, MirrorConfig};
use podstream::extractor::{ExtractionEngine, ExtractionError, LocalExtractor};
use podstream::resolver::{HttpMirrorFetcher, MirrorRegistry, ResolverSettings, TierResolver};
use podstream::server::{create_router, AppContext};
use podstream::streaming::ProxyStreamer;
use podstream_common::{MirrorSchema, Tier};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ID: &str = "fLexgOxsZu0";

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Harness without a local extractor.
    pub fn new(config: Config) -> Self {
        Self::build(config, None)
    }

    /// Harness whose last tier is `engine`.
    pub fn with_engine(config: Config, engine: impl ExtractionEngine + 'static) -> Self {
        let extractor = LocalExtractor::new(
            engine,
            config.extractor.primary_url.clone(),
            config.extractor.secondary_url.clone(),
        );
        Self::build(config, Some(Arc::new(extractor)))
    }

    fn build(config: Config, extractor: Option<Arc<LocalExtractor>>) -> Self {
        let settings = ResolverSettings::from_config(&config.resolver);
        let fetcher = HttpMirrorFetcher::new(settings.mirror_timeout, &config.resolver.user_agent);
        let resolver = TierResolver::new(
            Arc::new(MirrorRegistry::from_config(&config.mirrors)),
            Arc::new(fetcher),
            extractor,
            settings,
        );
        let proxy = ProxyStreamer::from_config(&config);

        Self {
            ctx: AppContext::new(config, resolver, proxy),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }
}

/// Config pointing at the given mirrors, with a 2 s per-mirror bound and the
/// local tier disabled.
pub fn test_config(tier_a: &[&MockServer], tier_b: &[&MockServer]) -> Config {
    let mut config = Config::default();
    config.mirrors = tier_a
        .iter()
        .map(|s| MirrorConfig {
            base_url: s.uri(),
            tier: Tier::A,
            schema: MirrorSchema::Piped,
        })
        .chain(tier_b.iter().map(|s| MirrorConfig {
            base_url: s.uri(),
            tier: Tier::B,
            schema: MirrorSchema::Invidious,
        }))
        .collect();
    config.resolver.mirror_timeout_secs = 2;
    config.resolver.mirror_budget_secs = 20;
    config.extractor.enabled = false;
    config.extractor.primary_url = "https://music.example/watch?v={id}".to_string();
    config.extractor.secondary_url = "https://www.example/watch?v={id}".to_string();
    config
}

/// Piped `/streams/{id}` body with one audio stream.
pub fn piped_body(url: &str, bitrate: u64) -> serde_json::Value {
    serde_json::json!({
        "title": "test",
        "audioStreams": [
            {"url": url, "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"", "format": "M4A", "bitrate": bitrate}
        ]
    })
}

/// Invidious videos body with one audio format.
pub fn invidious_body(url: &str, bitrate: u64) -> serde_json::Value {
    serde_json::json!({
        "adaptiveFormats": [
            {"url": url, "type": "audio/webm; codecs=\"opus\"", "bitrate": bitrate.to_string()}
        ]
    })
}

/// Mount `response` for the Piped lookup of [`ID`].
pub async fn mount_piped(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/streams/{ID}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount `response` for the Invidious lookup of [`ID`].
pub async fn mount_invidious(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/videos/{ID}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// A mirror that answers long after any per-mirror bound.
pub fn stalled() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(piped_body("https://cdn.example/too-late", 1))
        .set_delay(Duration::from_secs(10))
}

/// Extraction engine answering from a closure and recording page URLs.
pub struct ScriptedEngine {
    pub pages: Arc<Mutex<Vec<String>>>,
    answer: fn(&str) -> Option<String>,
}

impl ScriptedEngine {
    pub fn new(answer: fn(&str) -> Option<String>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(Vec::new())),
            answer,
        }
    }
}

#[async_trait]
impl ExtractionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract_url(&mut self, page_url: &str) -> Result<Option<String>, ExtractionError> {
        self.pages.lock().unwrap().push(page_url.to_string());
        match (self.answer)(page_url) {
            Some(url) => Ok(Some(url)),
            None => Err(ExtractionError::Failed {
                code: Some(1),
                message: "Video unavailable".to_string(),
            }),
        }
    }
}
