//! Candidate ranking within a winning tier.
//!
//! Both orderings use a stable sort, so candidates that compare equal keep the
//! order the mirror listed them in.

use std::cmp::Ordering;

use podstream_common::{StreamCandidate, Tier};

/// Order Tier A candidates best first.
///
/// Higher bitrate wins; among equal bitrates, a MIME type starting with
/// `preferred_mime` beats one that doesn't.
pub fn rank_preferring_mime(
    mut candidates: Vec<StreamCandidate>,
    preferred_mime: &str,
) -> Vec<StreamCandidate> {
    candidates.sort_by(|a, b| {
        b.bitrate.cmp(&a.bitrate).then_with(|| {
            match (a.mime_matches(preferred_mime), b.mime_matches(preferred_mime)) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            }
        })
    });
    candidates
}

/// Order candidates by declared bitrate, highest first.
pub fn rank_by_bitrate(mut candidates: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    candidates.sort_by(|a, b| b.bitrate.cmp(&a.bitrate));
    candidates
}

/// Apply the ranking rule of `tier`.
pub fn rank(tier: Tier, candidates: Vec<StreamCandidate>, preferred_mime: &str) -> Vec<StreamCandidate> {
    match tier {
        Tier::A => rank_preferring_mime(candidates, preferred_mime),
        Tier::B => rank_by_bitrate(candidates),
    }
}
