//! External tool detection.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::ExtractionError;

/// Executable name of the default extraction engine.
pub const YTDLP: &str = "yt-dlp";

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available by running `<name> --version`.
fn check_tool(name: &str) -> ToolInfo {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => ToolInfo {
            name: name.to_string(),
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.trim().to_string()),
            path: which::which(name).ok(),
        },
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check every tool the service can use.
///
/// # Example
///
/// ```no_run
/// use podstream::extractor::check_tools;
///
/// for info in check_tools(None) {
///     println!("{}: {:?}", info.name, info.version);
/// }
/// ```
pub fn check_tools(ytdlp_path: Option<&Path>) -> Vec<ToolInfo> {
    let ytdlp = match ytdlp_path {
        Some(path) => {
            let mut info = check_tool(&path.to_string_lossy());
            info.name = YTDLP.to_string();
            if info.available {
                info.path = Some(path.to_path_buf());
            }
            info
        }
        None => check_tool(YTDLP),
    };

    vec![ytdlp]
}

/// Require that a tool is on `PATH`, returning its location.
fn require_tool(name: &str) -> Result<PathBuf, ExtractionError> {
    which::which(name).map_err(|_| ExtractionError::ToolNotFound(name.to_string()))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf, ExtractionError> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Configured {} path {:?} does not exist, searching PATH", name, path);
    }

    require_tool(name)
}
