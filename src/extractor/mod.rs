//! Last-resort local extraction.
//!
//! The extraction engine keeps process-wide session and cache state and must
//! never run two extractions at once. [`LocalExtractor`] owns the engine behind
//! a single async mutex; the `&mut self` receiver of
//! [`ExtractionEngine::extract_url`] means the guard is the only way in.

mod tools;
mod ytdlp;

pub use tools::{check_tools, get_tool_path, ToolInfo, YTDLP};
pub use ytdlp::{parse_ytdlp_output, YtDlpEngine};

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use podstream_common::MediaId;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;

/// Failure of a single extraction attempt.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction tool not found: {0}")]
    ToolNotFound(String),

    #[error("failed to spawn extraction tool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("extraction tool exited with code {code:?}: {message}")]
    Failed { code: Option<i32>, message: String },

    #[error("could not parse extraction output: {0}")]
    Parse(String),
}

/// Something that can turn a watch page URL into a direct media URL.
#[async_trait]
pub trait ExtractionEngine: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Extract a playable audio URL from `page_url`.
    ///
    /// `Ok(None)` means the page was processed but offered nothing playable.
    async fn extract_url(&mut self, page_url: &str) -> Result<Option<String>, ExtractionError>;
}

/// Serialized access to the shared extraction engine.
pub struct LocalExtractor {
    engine: Mutex<Box<dyn ExtractionEngine>>,
    primary_url: String,
    secondary_url: String,
}

impl LocalExtractor {
    /// Wrap `engine`. URL templates carry an `{id}` placeholder.
    pub fn new(
        engine: impl ExtractionEngine + 'static,
        primary_url: impl Into<String>,
        secondary_url: impl Into<String>,
    ) -> Self {
        Self {
            engine: Mutex::new(Box::new(engine)),
            primary_url: primary_url.into(),
            secondary_url: secondary_url.into(),
        }
    }

    /// Build the yt-dlp backed extractor, or `None` when disabled or yt-dlp is missing.
    pub fn from_config(config: &ExtractorConfig) -> Option<Self> {
        if !config.enabled {
            info!("Local extraction disabled");
            return None;
        }

        let binary: PathBuf = match get_tool_path(YTDLP, config.ytdlp_path.as_deref()) {
            Ok(path) => path,
            Err(e) => {
                warn!("Local extraction unavailable: {}", e);
                return None;
            }
        };

        info!("Local extraction enabled using {:?}", binary);
        let engine = YtDlpEngine::new(binary, Duration::from_secs(config.timeout_secs))
            .with_cache_dir(config.cache_dir.clone());

        Some(Self::new(
            engine,
            config.primary_url.clone(),
            config.secondary_url.clone(),
        ))
    }

    /// Page URLs tried for `id`, primary first.
    pub fn page_urls(&self, id: &MediaId) -> [String; 2] {
        [
            self.primary_url.replace("{id}", id.as_str()),
            self.secondary_url.replace("{id}", id.as_str()),
        ]
    }

    /// Extract a playable URL for `id`, trying the primary then the secondary domain.
    ///
    /// Callers queue on the engine lock; it is held across both attempts.
    /// Returns `None` when both attempts come up empty.
    pub async fn extract(&self, id: &MediaId) -> Option<String> {
        let mut engine = self.engine.lock().await;

        for page_url in self.page_urls(id) {
            match engine.extract_url(&page_url).await {
                Ok(Some(url)) if !url.is_empty() => {
                    debug!(engine = engine.name(), %page_url, "extraction succeeded");
                    return Some(url);
                }
                Ok(_) => debug!(engine = engine.name(), %page_url, "no playable url"),
                Err(e) => warn!(engine = engine.name(), %page_url, error = %e, "extraction failed"),
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    /// Records every page URL and answers per domain.
    struct ScriptedEngine {
        seen: Arc<StdMutex<Vec<String>>>,
        answer_for: fn(&str) -> Result<Option<String>, ExtractionError>,
    }

    #[async_trait]
    impl ExtractionEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn extract_url(&mut self, page_url: &str) -> Result<Option<String>, ExtractionError> {
            self.seen.lock().unwrap().push(page_url.to_string());
            (self.answer_for)(page_url)
        }
    }

    /// Tracks how many extractions are in flight at once.
    struct InstrumentedEngine {
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionEngine for InstrumentedEngine {
        fn name(&self) -> &str {
            "instrumented"
        }

        async fn extract_url(&mut self, _page_url: &str) -> Result<Option<String>, ExtractionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn id() -> MediaId {
        "fLexgOxsZu0".parse().unwrap()
    }

    fn scripted(
        answer_for: fn(&str) -> Result<Option<String>, ExtractionError>,
    ) -> (LocalExtractor, Arc<StdMutex<Vec<String>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let engine = ScriptedEngine {
            seen: Arc::clone(&seen),
            answer_for,
        };
        let extractor = LocalExtractor::new(
            engine,
            "https://music.youtube.com/watch?v={id}",
            "https://www.youtube.com/watch?v={id}",
        );
        (extractor, seen)
    }

    #[tokio::test]
    async fn test_primary_domain_wins() {
        let (extractor, seen) = scripted(|_| Ok(Some("https://media/primary".into())));

        assert_eq!(extractor.extract(&id()).await.as_deref(), Some("https://media/primary"));
        assert_eq!(
            *seen.lock().unwrap(),
            ["https://music.youtube.com/watch?v=fLexgOxsZu0"]
        );
    }

    #[tokio::test]
    async fn test_secondary_domain_after_primary_failure() {
        let (extractor, seen) = scripted(|page| {
            if page.contains("music.youtube.com") {
                Err(ExtractionError::Failed {
                    code: Some(1),
                    message: "Sign in to confirm you're not a bot".into(),
                })
            } else {
                Ok(Some("X".into()))
            }
        });

        assert_eq!(extractor.extract(&id()).await.as_deref(), Some("X"));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_both_domains_failing_is_none() {
        let (extractor, seen) = scripted(|page| {
            if page.contains("music.") {
                Ok(None)
            } else {
                Err(ExtractionError::Timeout(Duration::from_secs(45)))
            }
        });

        assert!(extractor.extract(&id()).await.is_none());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_url_is_not_a_success() {
        let (extractor, _) = scripted(|_| Ok(Some(String::new())));
        assert!(extractor.extract(&id()).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_extractions_are_serialized() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let extractor = Arc::new(LocalExtractor::new(
            InstrumentedEngine {
                active: Arc::clone(&active),
                max_active: Arc::clone(&max_active),
            },
            "https://primary/{id}",
            "https://secondary/{id}",
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let extractor = Arc::clone(&extractor);
                tokio::spawn(async move { extractor.extract(&id()).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_none());
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_config_yields_none() {
        let config = ExtractorConfig {
            enabled: false,
            ..ExtractorConfig::default()
        };
        assert!(LocalExtractor::from_config(&config).is_none());
    }

    #[test]
    fn test_missing_binary_yields_none() {
        let config = ExtractorConfig {
            ytdlp_path: Some(PathBuf::from("/nonexistent/yt-dlp")),
            ..ExtractorConfig::default()
        };
        // Only meaningful where yt-dlp is not on PATH either.
        if which::which(YTDLP).is_err() {
            assert!(LocalExtractor::from_config(&config).is_none());
        }
    }
}
