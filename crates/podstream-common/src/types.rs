//! Resolution data model: tiers, mirror schemas, candidates and results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::MediaId;

/// Path prefix of the server-local proxy route handed out on fallback.
pub const STREAM_ROUTE_PREFIX: &str = "/stream";

/// Provider family a mirror belongs to.
///
/// Tiers are tried in declaration order: every Tier A mirror is raced before
/// any Tier B mirror is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Piped-API mirrors.
    A,
    /// Invidious-API mirrors.
    B,
}

impl Tier {
    /// The result source reported when this tier wins.
    pub fn source(self) -> Source {
        match self {
            Self::A => Source::TierA,
            Self::B => Source::TierB,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "tierA"),
            Self::B => write!(f, "tierB"),
        }
    }
}

/// Response format spoken by a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorSchema {
    /// `GET {base}/streams/{id}` returning `audioStreams`.
    Piped,
    /// `GET {base}/api/v1/videos/{id}` returning `adaptiveFormats`.
    Invidious,
}

impl fmt::Display for MirrorSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Piped => write!(f, "piped"),
            Self::Invidious => write!(f, "invidious"),
        }
    }
}

/// Where a resolution result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "tierA")]
    TierA,
    #[serde(rename = "tierB")]
    TierB,
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "fallback")]
    Fallback,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierA => write!(f, "tierA"),
            Self::TierB => write!(f, "tierB"),
            Self::Local => write!(f, "local"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// One playable stream offered by a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    /// Direct URL of the audio stream. Never empty.
    pub url: String,
    /// Declared MIME type (e.g. `audio/mp4; codecs="mp4a.40.2"`), if any.
    pub mime_type: Option<String>,
    /// Declared bitrate in bits per second, `0` when the mirror omits it.
    pub bitrate: u64,
}

impl StreamCandidate {
    pub fn new(url: impl Into<String>, mime_type: Option<String>, bitrate: u64) -> Self {
        Self {
            url: url.into(),
            mime_type,
            bitrate,
        }
    }

    /// Whether the declared MIME type starts with `prefix` (case-insensitive).
    pub fn mime_matches(&self, prefix: &str) -> bool {
        self.mime_type
            .as_deref()
            .map_or(false, |m| m.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase()))
    }
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Directly playable URL, or the server-local proxy path on fallback.
    pub url: String,
    /// Tier that produced the URL.
    pub source: Source,
    /// Whether the client must go through the streaming proxy.
    pub needs_proxy: bool,
}

impl ResolutionResult {
    /// A directly playable URL produced by `source`.
    pub fn direct(url: impl Into<String>, source: Source) -> Self {
        let url = url.into();
        debug_assert!(!url.is_empty(), "direct results must carry a url");
        Self {
            url,
            source,
            needs_proxy: false,
        }
    }

    /// Every tier failed: route the client through the proxy.
    pub fn fallback(id: &MediaId) -> Self {
        Self {
            url: format!("{}/{}", STREAM_ROUTE_PREFIX, id),
            source: Source::Fallback,
            needs_proxy: true,
        }
    }
}
