//! Mirror registry: the static, tiered list of third-party endpoints.
//!
//! The registry is built once from configuration and shared read-only for the
//! lifetime of the process.

use podstream_common::{MirrorSchema, Tier};

use crate::config::MirrorConfig;

/// One third-party endpoint able to answer stream lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    /// Base address without trailing slash (e.g. `https://pipedapi.kavin.rocks`).
    pub base_url: String,
    /// Tier this mirror is raced in.
    pub tier: Tier,
    /// Response format the mirror speaks.
    pub schema: MirrorSchema,
}

impl Mirror {
    pub fn new(base_url: impl Into<String>, tier: Tier, schema: MirrorSchema) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tier,
            schema,
        }
    }
}

impl From<&MirrorConfig> for Mirror {
    fn from(config: &MirrorConfig) -> Self {
        Self::new(config.base_url.clone(), config.tier, config.schema)
    }
}

/// Ordered, immutable collection of mirrors grouped by tier.
///
/// Mirrors keep their configuration order inside a tier; that order is only
/// used for logging since every mirror in a tier is raced at once.
#[derive(Debug, Clone, Default)]
pub struct MirrorRegistry {
    mirrors: Vec<Mirror>,
}

impl MirrorRegistry {
    /// Create a registry from an explicit mirror list.
    pub fn new(mirrors: Vec<Mirror>) -> Self {
        Self { mirrors }
    }

    /// Build the registry from configuration entries.
    pub fn from_config(mirrors: &[MirrorConfig]) -> Self {
        Self::new(mirrors.iter().map(Mirror::from).collect())
    }

    /// Mirrors belonging to `tier`, in configuration order.
    pub fn tier(&self, tier: Tier) -> Vec<Mirror> {
        self.mirrors
            .iter()
            .filter(|m| m.tier == tier)
            .cloned()
            .collect()
    }

    /// Number of mirrors in `tier`.
    pub fn count(&self, tier: Tier) -> usize {
        self.mirrors.iter().filter(|m| m.tier == tier).count()
    }
}
