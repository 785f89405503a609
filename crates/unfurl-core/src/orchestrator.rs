//! Fetch orchestration: resolve every cache-missing candidate of a snapshot.
//!
//! The orchestrator is the only place provider renderers run and the only
//! place their failures are observed. Each failure is absorbed per URL and
//! cached as a permanent `Failed` placeholder; nothing a provider does can
//! abort its siblings or surface an error to the state machine. A batch with
//! no misses settles immediately with [`Error::NothingToFetch`] so callers
//! know to skip the decoration rebuild.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, PreviewCache, PreviewOutcome};
use crate::doc::Node;
use crate::provider::ProviderRegistry;
use crate::scanner::scan;
use crate::{Error, Result};

/// Typed completion signal of a settled fetch batch.
///
/// Carried on the transaction that follows a resolved batch; its presence —
/// not its contents — is what tells the state machine to regenerate. The
/// counts exist for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCompletion {
    /// Number of URLs the batch settled (successes and failures alike).
    pub resolved: usize,
    /// How many of those settled as failures.
    pub failed: usize,
}

/// Resolves every cache-missing candidate in `doc` concurrently.
///
/// Successes are cached as `Ready` (or `Empty` for an explicit no-content
/// result), failures as `Failed`. The returned future completes only once
/// every fetch has settled. Returns [`Error::NothingToFetch`] when the scan
/// finds no misses; callers must treat that as "no state update needed",
/// not as a failure.
pub async fn resolve_misses(
    doc: &Node,
    registry: &ProviderRegistry,
    cache: &PreviewCache,
) -> Result<FetchCompletion> {
    let misses: Vec<_> = scan(doc, registry)
        .into_iter()
        .filter(|candidate| !cache.has(candidate.url.as_str()))
        .collect();

    if misses.is_empty() {
        debug!("no cache-missing candidates, nothing to fetch");
        return Err(Error::NothingToFetch);
    }

    debug!(count = misses.len(), "resolving preview fetch batch");

    let fetches = misses.into_iter().map(|candidate| {
        let cache = cache.clone();
        async move {
            let url = candidate.url.as_str();
            let outcome = match candidate.provider.render(&candidate.url).await {
                Ok(Some(content)) => PreviewOutcome::Ready(content),
                Ok(None) => PreviewOutcome::Empty,
                Err(err) => {
                    warn!(
                        url,
                        provider = candidate.provider.name(),
                        error = %err,
                        "provider fetch failed, caching error placeholder"
                    );
                    PreviewOutcome::Failed
                },
            };
            let failed = outcome == PreviewOutcome::Failed;
            cache.insert(url, CacheEntry::new(outcome));
            failed
        }
    });

    let failures = join_all(fetches).await;
    let completion = FetchCompletion {
        resolved: failures.len(),
        failed: failures.iter().filter(|failed| **failed).count(),
    };
    info!(
        resolved = completion.resolved,
        failed = completion.failed,
        "preview fetch batch settled"
    );
    Ok(completion)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::doc::Mark;
    use crate::provider::{PreviewContent, Provider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    /// Counts renders; fails for URLs containing "broken".
    struct CountingProvider {
        renders: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                renders: AtomicUsize::new(0),
            })
        }

        fn render_count(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn matches(&self, _url: &Url) -> bool {
            true
        }

        async fn render(&self, url: &Url) -> crate::Result<Option<PreviewContent>> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if url.path().contains("broken") {
                return Err(Error::Provider {
                    url: url.to_string(),
                    message: "simulated failure".into(),
                });
            }
            if url.path().contains("empty") {
                return Ok(None);
            }
            Ok(Some(PreviewContent::new(url.as_str()).with_title("ok")))
        }
    }

    fn doc_with_links(hrefs: &[&str]) -> Node {
        let children = hrefs
            .iter()
            .map(|href| {
                Node::element(
                    "paragraph",
                    vec![Node::marked_text("link", vec![Mark::link(*href)])],
                )
            })
            .collect();
        Node::element("doc", children)
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop_signal() {
        let doc = doc_with_links(&[]);
        let registry = ProviderRegistry::new(vec![CountingProvider::new()]);
        let result = resolve_misses(&doc, &registry, &PreviewCache::new()).await;
        assert!(matches!(result, Err(Error::NothingToFetch)));
    }

    #[tokio::test]
    async fn test_all_hits_is_noop_signal() {
        let doc = doc_with_links(&["https://example.com/a"]);
        let provider = CountingProvider::new();
        let registry = ProviderRegistry::new(vec![provider.clone()]);
        let cache = PreviewCache::new();
        cache.insert("https://example.com/a", CacheEntry::new(PreviewOutcome::Empty));

        let result = resolve_misses(&doc, &registry, &cache).await;
        assert!(matches!(result, Err(Error::NothingToFetch)));
        assert_eq!(provider.render_count(), 0, "cached URLs are never re-fetched");
    }

    #[tokio::test]
    async fn test_batch_caches_successes_and_empties() {
        let doc = doc_with_links(&["https://example.com/a", "https://example.com/empty"]);
        let registry = ProviderRegistry::new(vec![CountingProvider::new()]);
        let cache = PreviewCache::new();

        let completion = resolve_misses(&doc, &registry, &cache).await.unwrap();
        assert_eq!(completion, FetchCompletion { resolved: 2, failed: 0 });
        assert!(matches!(
            cache.get("https://example.com/a").unwrap().outcome,
            PreviewOutcome::Ready(_)
        ));
        assert_eq!(
            cache.get("https://example.com/empty").unwrap().outcome,
            PreviewOutcome::Empty
        );
    }

    #[tokio::test]
    async fn test_failure_never_aborts_siblings() {
        let doc = doc_with_links(&["https://example.com/broken", "https://example.com/b"]);
        let registry = ProviderRegistry::new(vec![CountingProvider::new()]);
        let cache = PreviewCache::new();

        let completion = resolve_misses(&doc, &registry, &cache).await.unwrap();
        assert_eq!(completion, FetchCompletion { resolved: 2, failed: 1 });
        assert_eq!(
            cache.get("https://example.com/broken").unwrap().outcome,
            PreviewOutcome::Failed
        );
        assert!(matches!(
            cache.get("https://example.com/b").unwrap().outcome,
            PreviewOutcome::Ready(_)
        ));
    }

    #[tokio::test]
    async fn test_second_batch_skips_settled_urls() {
        let doc = doc_with_links(&["https://example.com/a", "https://example.com/broken"]);
        let provider = CountingProvider::new();
        let registry = ProviderRegistry::new(vec![provider.clone()]);
        let cache = PreviewCache::new();

        resolve_misses(&doc, &registry, &cache).await.unwrap();
        assert_eq!(provider.render_count(), 2);

        // Failures are permanent: the second cycle fetches nothing.
        let result = resolve_misses(&doc, &registry, &cache).await;
        assert!(matches!(result, Err(Error::NothingToFetch)));
        assert_eq!(provider.render_count(), 2);
    }
}
