use podstream_common::{MirrorSchema, Tier};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Mirror registry. Falls back to [`default_mirrors`] when omitted.
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<MirrorConfig>,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            resolver: ResolverConfig::default(),
            mirrors: default_mirrors(),
            extractor: ExtractorConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Per-mirror request timeout in seconds
    #[serde(default = "default_mirror_timeout")]
    pub mirror_timeout_secs: u64,

    /// Wall-clock budget for both mirror tiers together (0 = unbounded).
    /// Local extraction is bounded by `extractor.timeout_secs` instead.
    #[serde(default = "default_mirror_budget")]
    pub mirror_budget_secs: u64,

    /// Tier A tie-break: candidates whose MIME type starts with this win
    #[serde(default = "default_preferred_mime")]
    pub preferred_mime: String,

    /// User-Agent sent to mirrors and proxy targets
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_mirror_timeout() -> u64 {
    4
}
fn default_mirror_budget() -> u64 {
    10
}
fn default_preferred_mime() -> String {
    "audio/mp4".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mirror_timeout_secs: default_mirror_timeout(),
            mirror_budget_secs: default_mirror_budget(),
            preferred_mime: default_preferred_mime(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MirrorConfig {
    pub base_url: String,

    pub tier: Tier,

    pub schema: MirrorSchema,
}

impl MirrorConfig {
    fn new(base_url: &str, tier: Tier, schema: MirrorSchema) -> Self {
        Self {
            base_url: base_url.to_string(),
            tier,
            schema,
        }
    }
}

/// Built-in public mirrors, used when the config file lists none.
pub fn default_mirrors() -> Vec<MirrorConfig> {
    let piped = [
        "https://pipedapi.kavin.rocks",
        "https://api-piped.mha.fi",
        "https://pipedapi.adminforge.de",
        "https://pipedapi.lunar.icu",
        "https://api.piped.projectsegfau.lt",
    ];
    let invidious = [
        "https://inv.nadeko.net",
        "https://invidious.nerdvpn.de",
        "https://yewtu.be",
    ];

    piped
        .iter()
        .map(|u| MirrorConfig::new(u, Tier::A, MirrorSchema::Piped))
        .chain(
            invidious
                .iter()
                .map(|u| MirrorConfig::new(u, Tier::B, MirrorSchema::Invidious)),
        )
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Enable the local yt-dlp tier
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit yt-dlp binary (looked up on PATH when unset)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Page URL template tried first; `{id}` is replaced by the media id
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Page URL template tried when the primary yields nothing
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,

    /// Timeout for a single extraction attempt in seconds
    #[serde(default = "default_extract_timeout")]
    pub timeout_secs: u64,

    /// Cache directory shared by every yt-dlp invocation
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
fn default_primary_url() -> String {
    "https://music.youtube.com/watch?v={id}".to_string()
}
fn default_secondary_url() -> String {
    "https://www.youtube.com/watch?v={id}".to_string()
}
fn default_extract_timeout() -> u64 {
    45
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ytdlp_path: None,
            primary_url: default_primary_url(),
            secondary_url: default_secondary_url(),
            timeout_secs: default_extract_timeout(),
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Size of each relayed body chunk in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Upstream connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_chunk_size() -> usize {
    32 * 1024
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}
