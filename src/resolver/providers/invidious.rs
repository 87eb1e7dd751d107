//! Invidious API mirrors (Tier B).
//!
//! `GET {base}/api/v1/videos/{id}?fields=adaptiveFormats` lists every adaptive
//! rendition. Audio renditions are recognised by a `type` starting with
//! `audio/`. Invidious serialises `bitrate` as a string, some forks as a number.

use podstream_common::{MediaId, StreamCandidate};
use serde::Deserialize;

use crate::resolver::fetcher::MirrorError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
    adaptive_formats: Vec<InvidiousFormat>,
}

#[derive(Debug, Deserialize)]
struct InvidiousFormat {
    url: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    bitrate: Option<Bitrate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bitrate {
    Number(u64),
    Text(String),
}

impl Bitrate {
    fn bits_per_second(&self) -> u64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// Lookup URL for `id` on the mirror at `base_url`.
pub fn video_url(base_url: &str, id: &MediaId) -> String {
    format!("{}/api/v1/videos/{}?fields=adaptiveFormats", base_url, id)
}

/// Parse a videos body into audio candidates, preserving response order.
pub fn parse_formats(body: &[u8]) -> Result<Vec<StreamCandidate>, MirrorError> {
    let video: InvidiousVideo =
        serde_json::from_slice(body).map_err(|e| MirrorError::Malformed(e.to_string()))?;

    Ok(video
        .adaptive_formats
        .into_iter()
        .filter(|f| {
            f.mime_type
                .as_deref()
                .map_or(false, |t| t.to_ascii_lowercase().starts_with("audio/"))
        })
        .filter_map(|f| {
            let url = f.url.filter(|u| !u.is_empty())?;
            let bitrate = f.bitrate.as_ref().map_or(0, Bitrate::bits_per_second);
            Some(StreamCandidate::new(url, f.mime_type, bitrate))
        })
        .collect())
}
