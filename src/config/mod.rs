mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./podstream.toml",
        "./config.toml",
        "~/.config/podstream/config.toml",
        "/etc/podstream/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.resolver.mirror_timeout_secs == 0 {
        anyhow::bail!("resolver.mirror_timeout_secs must be greater than 0");
    }

    let budget = config.resolver.mirror_budget_secs;
    if budget != 0 && budget < config.resolver.mirror_timeout_secs {
        anyhow::bail!(
            "resolver.mirror_budget_secs ({}) is shorter than one mirror timeout ({})",
            budget,
            config.resolver.mirror_timeout_secs
        );
    }

    if config.proxy.chunk_size == 0 {
        anyhow::bail!("proxy.chunk_size must be greater than 0");
    }

    for mirror in &config.mirrors {
        if !(mirror.base_url.starts_with("http://") || mirror.base_url.starts_with("https://")) {
            anyhow::bail!("Mirror '{}' is not an http(s) URL", mirror.base_url);
        }
    }

    if config.extractor.enabled {
        for template in [&config.extractor.primary_url, &config.extractor.secondary_url] {
            if !template.contains("{id}") {
                anyhow::bail!("Extractor URL template '{}' has no {{id}} placeholder", template);
            }
        }
    }

    if config.mirrors.is_empty() && !config.extractor.enabled {
        tracing::warn!("No mirrors configured and extractor disabled: every lookup will fall back");
    }

    Ok(())
}
