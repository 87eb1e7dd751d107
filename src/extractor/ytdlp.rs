//! yt-dlp backed extraction engine.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{ExtractionEngine, ExtractionError};

/// Runs the `yt-dlp` executable once per attempt.
///
/// All invocations share one cache directory, which is why the engine sits
/// behind [`LocalExtractor`](super::LocalExtractor)'s lock.
#[derive(Debug)]
pub struct YtDlpEngine {
    binary: PathBuf,
    timeout: Duration,
    cache_dir: Option<PathBuf>,
    invocations: u64,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            cache_dir: None,
            invocations: 0,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Number of extraction attempts started so far.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    fn args(&self, page_url: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--no-warnings",
            "--force-ipv4",
            "-j",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(dir) = &self.cache_dir {
            args.push("--cache-dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }

        args.push(page_url.to_string());
        args
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract_url(&mut self, page_url: &str) -> Result<Option<String>, ExtractionError> {
        self.invocations += 1;
        debug!(binary = ?self.binary, page_url, attempt = self.invocations, "running yt-dlp");

        let child = Command::new(&self.binary)
            .args(self.args(page_url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Failed {
                code: output.status.code(),
                message: stderr.lines().last().unwrap_or_default().trim().to_string(),
            });
        }

        parse_ytdlp_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    url: Option<String>,
    #[serde(default)]
    requested_formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
    vcodec: Option<String>,
}

/// Pull the playable URL out of a `yt-dlp -j` document.
///
/// A single selected format puts its URL at the top level. Merged selections
/// list their parts in `requested_formats`; the audio-only part is used.
pub fn parse_ytdlp_output(stdout: &[u8]) -> Result<Option<String>, ExtractionError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    if line.is_empty() {
        return Ok(None);
    }

    let info: YtDlpInfo =
        serde_json::from_str(line).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    if let Some(url) = info.url.filter(|u| !u.is_empty()) {
        return Ok(Some(url));
    }

    Ok(info
        .requested_formats
        .into_iter()
        .filter(|f| f.vcodec.as_deref() == Some("none"))
        .find_map(|f| f.url.filter(|u| !u.is_empty())))
}
