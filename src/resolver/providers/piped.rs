//! Piped API mirrors (Tier A).
//!
//! `GET {base}/streams/{id}` returns a document whose `audioStreams` array
//! lists audio-only renditions with a direct `url`, a `mimeType`, a `format`
//! label (`M4A`, `WEBMA_OPUS`, ...) and a numeric `bitrate`.

use podstream_common::{MediaId, StreamCandidate};
use serde::Deserialize;

use crate::resolver::fetcher::MirrorError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
    audio_streams: Vec<PipedAudioStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedAudioStream {
    url: Option<String>,
    mime_type: Option<String>,
    format: Option<String>,
    bitrate: Option<u64>,
}

/// Lookup URL for `id` on the mirror at `base_url`.
pub fn streams_url(base_url: &str, id: &MediaId) -> String {
    format!("{}/streams/{}", base_url, id)
}

/// MIME type implied by a Piped `format` label, for entries lacking `mimeType`.
fn mime_for_format(format: &str) -> Option<&'static str> {
    match format.to_ascii_uppercase().as_str() {
        "M4A" => Some("audio/mp4"),
        "WEBMA" | "WEBMA_OPUS" => Some("audio/webm"),
        "MP3" => Some("audio/mpeg"),
        _ => None,
    }
}

/// Parse a `/streams/{id}` body into candidates, preserving response order.
///
/// A body without an `audioStreams` array is malformed. Entries without a
/// usable URL are skipped.
pub fn parse_streams(body: &[u8]) -> Result<Vec<StreamCandidate>, MirrorError> {
    let streams: PipedStreams =
        serde_json::from_slice(body).map_err(|e| MirrorError::Malformed(e.to_string()))?;

    Ok(streams
        .audio_streams
        .into_iter()
        .filter_map(|s| {
            let url = s.url.filter(|u| !u.is_empty())?;
            let mime_type = s.mime_type.filter(|m| !m.is_empty()).or_else(|| {
                s.format
                    .as_deref()
                    .and_then(mime_for_format)
                    .map(str::to_string)
            });
            Some(StreamCandidate::new(url, mime_type, s.bitrate.unwrap_or(0)))
        })
        .collect())
}
