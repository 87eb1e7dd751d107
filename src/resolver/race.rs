//! First-success race over the mirrors of one tier.

use std::future::Future;
use std::time::Duration;

use podstream_common::StreamCandidate;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::fetcher::MirrorError;
use super::registry::Mirror;

/// Query every mirror concurrently and return the first non-empty answer.
///
/// One task is spawned per mirror, each bounded by `per_request_timeout`.
/// Failures of any kind (timeout, connection error, bad status, malformed
/// body, empty list) only remove that mirror from the race. Losing tasks are
/// left to finish on their own; their reports are dropped once the receiver
/// is gone.
///
/// Returns an empty list when every mirror failed, or when `mirrors` is empty.
pub async fn race<F, Fut>(
    mirrors: &[Mirror],
    fetch: F,
    per_request_timeout: Duration,
) -> Vec<StreamCandidate>
where
    F: Fn(Mirror) -> Fut,
    Fut: Future<Output = Result<Vec<StreamCandidate>, MirrorError>> + Send + 'static,
{
    if mirrors.is_empty() {
        return Vec::new();
    }

    // One slot per mirror: no sender ever waits on the collector.
    let (tx, mut rx) = mpsc::channel(mirrors.len());

    for mirror in mirrors {
        let tx = tx.clone();
        let base_url = mirror.base_url.clone();
        let request = fetch(mirror.clone());

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(per_request_timeout, request)
                .await
                .unwrap_or(Err(MirrorError::Timeout(per_request_timeout)));

            let candidates = match outcome {
                Ok(candidates) => {
                    if candidates.is_empty() {
                        debug!(mirror = %base_url, "mirror returned no audio streams");
                    }
                    candidates
                }
                Err(e) => {
                    debug!(mirror = %base_url, error = %e, "mirror failed");
                    Vec::new()
                }
            };

            if tx.send((base_url, candidates)).await.is_err() {
                trace!("race already decided, discarding late mirror result");
            }
        });
    }
    drop(tx);

    while let Some((base_url, candidates)) = rx.recv().await {
        if !candidates.is_empty() {
            debug!(mirror = %base_url, count = candidates.len(), "mirror won race");
            return candidates;
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use podstream_common::{MirrorSchema, Tier};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn mirror(name: &str) -> Mirror {
        Mirror::new(format!("http://{name}"), Tier::A, MirrorSchema::Piped)
    }

    fn candidate(url: &str) -> StreamCandidate {
        StreamCandidate::new(url, Some("audio/mp4".into()), 128_000)
    }

    #[tokio::test]
    async fn test_empty_mirror_set() {
        let result = race(
            &[],
            |_m| async { Ok(vec![candidate("x")]) },
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_one_good_mirror_among_failures() {
        let mirrors = vec![mirror("slow"), mirror("broken"), mirror("good")];

        let result = race(
            &mirrors,
            |m| async move {
                match m.base_url.as_str() {
                    "http://slow" => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(vec![candidate("late")])
                    }
                    "http://broken" => Err(MirrorError::Malformed("missing audioStreams".into())),
                    _ => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(vec![candidate("good")])
                    }
                }
            },
            Duration::from_millis(500),
        )
        .await;

        assert_eq!(result, vec![candidate("good")]);
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty() {
        let mirrors = vec![mirror("a"), mirror("b"), mirror("c")];

        let result = race(
            &mirrors,
            |m| async move {
                match m.base_url.as_str() {
                    "http://a" => Err(MirrorError::Status(500)),
                    "http://b" => Ok(Vec::new()),
                    _ => Err(MirrorError::Unreachable("connection refused".into())),
                }
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_timeouts_are_bounded_per_mirror() {
        let mirrors = vec![mirror("a"), mirror("b")];
        let started = Instant::now();

        let result = race(
            &mirrors,
            |_m| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(vec![candidate("never")])
            },
            Duration::from_millis(100),
        )
        .await;

        assert!(result.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_returns_without_waiting_for_losers() {
        let mirrors = vec![mirror("fast"), mirror("slow")];
        let finished = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let counter = Arc::clone(&finished);
        let result = race(
            &mirrors,
            move |m| {
                let counter = Arc::clone(&counter);
                async move {
                    if m.base_url == "http://slow" {
                        tokio::time::sleep(Duration::from_millis(800)).await;
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![candidate(&m.base_url)])
                }
            },
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(result[0].url, "http://fast");
        assert!(started.elapsed() < Duration::from_millis(700));

        // The loser keeps running in the background and completes.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }
}
