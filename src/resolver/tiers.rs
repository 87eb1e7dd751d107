//! Tier state machine: Tier A, then Tier B, then local extraction.

use std::sync::Arc;
use std::time::Duration;

use podstream_common::{MediaId, ResolutionResult, Source, Tier};
use tracing::{debug, info, warn};

use super::fetcher::{HttpMirrorFetcher, MirrorFetcher};
use super::race::race;
use super::rank;
use super::registry::{Mirror, MirrorRegistry};
use crate::config::{Config, ResolverConfig};
use crate::extractor::LocalExtractor;

/// Resolution stage. Stages only ever advance in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TierA,
    TierB,
    LocalExtraction,
    Exhausted,
}

impl Stage {
    pub const INITIAL: Stage = Stage::TierA;

    /// The stage entered when this one yields nothing.
    pub fn next(self) -> Stage {
        match self {
            Self::TierA => Self::TierB,
            Self::TierB => Self::LocalExtraction,
            Self::LocalExtraction | Self::Exhausted => Self::Exhausted,
        }
    }

    /// Mirror tier raced in this stage, if any.
    pub fn mirror_tier(self) -> Option<Tier> {
        match self {
            Self::TierA => Some(Tier::A),
            Self::TierB => Some(Tier::B),
            _ => None,
        }
    }
}

/// Tunables of a [`TierResolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Bound on each individual mirror request.
    pub mirror_timeout: Duration,
    /// Bound on both mirror tiers together; `None` means unbounded.
    pub mirror_budget: Option<Duration>,
    /// Tier A tie-break MIME prefix.
    pub preferred_mime: String,
}

impl ResolverSettings {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            mirror_timeout: Duration::from_secs(config.mirror_timeout_secs),
            mirror_budget: (config.mirror_budget_secs > 0)
                .then(|| Duration::from_secs(config.mirror_budget_secs)),
            preferred_mime: config.preferred_mime.clone(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Turns an identifier into a playable URL by walking the stages in order.
pub struct TierResolver {
    registry: Arc<MirrorRegistry>,
    fetcher: Arc<dyn MirrorFetcher>,
    extractor: Option<Arc<LocalExtractor>>,
    settings: ResolverSettings,
}

impl TierResolver {
    pub fn new(
        registry: Arc<MirrorRegistry>,
        fetcher: Arc<dyn MirrorFetcher>,
        extractor: Option<Arc<LocalExtractor>>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            registry,
            fetcher,
            extractor,
            settings,
        }
    }

    /// Build the production resolver: HTTP mirror fetcher plus yt-dlp, if found.
    pub fn from_config(config: &Config) -> Self {
        let settings = ResolverSettings::from_config(&config.resolver);
        let fetcher = HttpMirrorFetcher::new(settings.mirror_timeout, &config.resolver.user_agent);

        Self::new(
            Arc::new(MirrorRegistry::from_config(&config.mirrors)),
            Arc::new(fetcher),
            LocalExtractor::from_config(&config.extractor).map(Arc::new),
            settings,
        )
    }

    pub fn registry(&self) -> &MirrorRegistry {
        &self.registry
    }

    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }

    /// Resolve `id`, degrading to the proxy fallback when every stage fails.
    ///
    /// Never fails: a missing stream is reported as
    /// `{source: fallback, needs_proxy: true, url: "/stream/{id}"}`.
    pub async fn resolve(&self, id: &MediaId) -> ResolutionResult {
        match self.resolve_upstream(id).await {
            Some(result) => result,
            None => {
                info!(%id, "all resolution stages exhausted, handing out proxy fallback");
                ResolutionResult::fallback(id)
            }
        }
    }

    /// Resolve `id` to an upstream URL, or `None` once every stage is exhausted.
    ///
    /// The mirror budget, when configured, bounds Tier A and Tier B together.
    /// On expiry resolution moves on to local extraction, which is bounded by
    /// the engine's own timeout so queued callers are never cut off.
    pub async fn resolve_upstream(&self, id: &MediaId) -> Option<ResolutionResult> {
        if let Some(result) = self.race_mirrors(id).await {
            return Some(result);
        }
        self.extract_locally(id).await
    }

    async fn race_mirrors(&self, id: &MediaId) -> Option<ResolutionResult> {
        let tiers = self.walk_mirror_stages(id);

        match self.settings.mirror_budget {
            Some(budget) => match tokio::time::timeout(budget, tiers).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%id, ?budget, "mirror budget exceeded");
                    None
                }
            },
            None => tiers.await,
        }
    }

    async fn walk_mirror_stages(&self, id: &MediaId) -> Option<ResolutionResult> {
        let mut stage = Stage::INITIAL;
        while let Some(tier) = stage.mirror_tier() {
            debug!(%id, ?stage, "entering resolution stage");
            if let Some(result) = self.race_tier(tier, id).await {
                return Some(result);
            }
            stage = stage.next();
        }
        None
    }

    async fn extract_locally(&self, id: &MediaId) -> Option<ResolutionResult> {
        debug!(%id, stage = ?Stage::LocalExtraction, "entering resolution stage");
        let extractor = self.extractor.as_ref()?;
        let url = extractor.extract(id).await?;
        info!(%id, "resolved via local extraction");
        Some(ResolutionResult::direct(url, Source::Local))
    }

    async fn race_tier(&self, tier: Tier, id: &MediaId) -> Option<ResolutionResult> {
        let mirrors = self.registry.tier(tier);
        if mirrors.is_empty() {
            debug!(%tier, "no mirrors configured");
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let media_id = id.clone();
        let candidates = race(
            &mirrors,
            move |mirror: Mirror| {
                let fetcher = Arc::clone(&fetcher);
                let id = media_id.clone();
                async move { fetcher.fetch(&mirror, &id).await }
            },
            self.settings.mirror_timeout,
        )
        .await;

        let best = rank::rank(tier, candidates, &self.settings.preferred_mime)
            .into_iter()
            .next();

        match best {
            Some(candidate) => {
                info!(
                    %id,
                    %tier,
                    bitrate = candidate.bitrate,
                    mime = candidate.mime_type.as_deref().unwrap_or("unknown"),
                    "resolved via mirror race"
                );
                Some(ResolutionResult::direct(candidate.url, tier.source()))
            }
            None => {
                debug!(%id, %tier, mirrors = mirrors.len(), "tier exhausted");
                None
            }
        }
    }
}
