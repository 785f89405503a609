//! The reconciliation state machine tying the pieces together.
//!
//! The plugin owns the provider registry, the cache, and the current
//! decoration set. On every edit it decides between two moves:
//!
//! - the transaction carries a [`FetchCompletion`] → a batch scheduled
//!   against an earlier snapshot has settled, so the decoration set is
//!   rebuilt from scratch against the new document. This is the only path
//!   that surfaces freshly cached content.
//! - otherwise → the existing set is remapped through the edit's structural
//!   map, which is cheaper and avoids flicker for decorations whose source
//!   nodes did not move.
//!
//! After every apply the host drives [`LinkPreviewPlugin::resolve`] against
//! the latest snapshot and, when it settles with `Ok`, attaches the
//! completion to its next transaction. A resolve settling with the no-op
//! signal attaches nothing, so no rebuild happens. Superseded resolves still
//! write the cache (entries are keyed by URL, not by edit); only their
//! completion goes unused.

use tracing::debug;

use crate::cache::PreviewCache;
use crate::config::PreviewConfig;
use crate::decoration::{build_decorations, DecorationSet};
use crate::doc::{Node, Transaction};
use crate::orchestrator::{resolve_misses, FetchCompletion};
use crate::provider::ProviderRegistry;
use crate::Result;

/// State owned by the plugin between edits.
#[derive(Debug, Clone, Default)]
pub struct PluginState {
    /// The current decoration overlay.
    pub decorations: DecorationSet,
}

/// Link preview plugin: scanner, cache, builder, and orchestrator behind a
/// single reconciliation surface.
#[derive(Debug)]
pub struct LinkPreviewPlugin {
    registry: ProviderRegistry,
    cache: PreviewCache,
    config: PreviewConfig,
}

impl LinkPreviewPlugin {
    /// Creates a plugin owning a fresh cache.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_cache(registry, PreviewCache::new())
    }

    /// Creates a plugin sharing an existing cache.
    ///
    /// Plugins sharing a cache also share its at-most-one-fetch guarantee:
    /// a URL settled by one instance is served from cache by all of them.
    pub fn with_cache(registry: ProviderRegistry, cache: PreviewCache) -> Self {
        Self {
            registry,
            cache,
            config: PreviewConfig::default(),
        }
    }

    /// Replaces the plugin configuration.
    pub fn with_config(mut self, config: PreviewConfig) -> Self {
        self.config = config;
        self
    }

    /// The plugin's cache handle.
    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    /// The plugin configuration.
    pub const fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Builds the initial state for a document.
    ///
    /// Serves cache hits synchronously; the host should follow up with
    /// [`Self::resolve`] to settle the misses.
    pub fn init(&self, doc: &Node) -> PluginState {
        PluginState {
            decorations: build_decorations(doc, &self.registry, &self.cache),
        }
    }

    /// Reconciles the previous state with one edit.
    pub fn apply(&self, tx: &Transaction, prev: &PluginState) -> PluginState {
        if let Some(completion) = tx.completion() {
            debug!(
                resolved = completion.resolved,
                "fetch batch settled, regenerating decorations"
            );
            return PluginState {
                decorations: build_decorations(tx.doc(), &self.registry, &self.cache),
            };
        }
        PluginState {
            decorations: prev.decorations.map(tx.pos_map()),
        }
    }

    /// Runs a fetch batch against `doc`, settling every cache miss.
    ///
    /// `Ok` carries the completion the host attaches to its next
    /// transaction; the no-op signal (`Error::is_noop`) means no update is
    /// needed. Never returns provider errors.
    pub async fn resolve(&self, doc: &Node) -> Result<FetchCompletion> {
        resolve_misses(doc, &self.registry, &self.cache).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::decoration::WidgetState;
    use crate::doc::{Mark, PosMap};
    use crate::provider::{PreviewContent, Provider};
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    struct TitleProvider {
        renders: AtomicUsize,
    }

    impl TitleProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                renders: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Provider for TitleProvider {
        fn name(&self) -> &str {
            "title"
        }

        fn matches(&self, url: &Url) -> bool {
            url.domain() == Some("example.com")
        }

        async fn render(&self, url: &Url) -> crate::Result<Option<PreviewContent>> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(Some(PreviewContent::new(url.as_str()).with_title("Example")))
        }
    }

    fn linked_doc() -> Node {
        Node::element(
            "doc",
            vec![Node::element(
                "paragraph",
                vec![Node::marked_text(
                    "example",
                    vec![Mark::link("https://example.com")],
                )],
            )],
        )
    }

    #[tokio::test]
    async fn test_full_lifecycle_serves_cached_title() {
        let provider = TitleProvider::new();
        let plugin = LinkPreviewPlugin::new(ProviderRegistry::new(vec![provider.clone()]));
        let doc = linked_doc();

        // Init: one loading placeholder, nothing cached yet.
        let state = plugin.init(&doc);
        assert_eq!(state.decorations.len(), 1);
        assert_eq!(
            state.decorations.decorations()[0].widget.state,
            WidgetState::Loading
        );

        // Orchestrator settles the miss.
        let completion = plugin.resolve(&doc).await.unwrap();
        assert_eq!(completion.resolved, 1);

        // The completion-carrying transaction regenerates and surfaces it.
        let tx = Transaction::new(doc.clone(), PosMap::identity()).with_completion(completion);
        let state = plugin.apply(&tx, &state);
        match &state.decorations.decorations()[0].widget.state {
            WidgetState::Ready(content) => {
                assert_eq!(content.title.as_deref(), Some("Example"));
            },
            other => panic!("expected ready widget, got {other:?}"),
        }

        // No further renderer calls for the settled URL.
        let result = plugin.resolve(&doc).await;
        assert!(matches!(result, Err(Error::NothingToFetch)));
        assert_eq!(provider.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_apply_without_completion_remaps_only() {
        let plugin = LinkPreviewPlugin::new(ProviderRegistry::new(vec![TitleProvider::new()]));
        let doc = linked_doc();
        let state = plugin.init(&doc);
        let before = state.decorations.decorations()[0].clone();

        // Simulate typing four characters at the document start; the edited
        // snapshot itself is irrelevant to the remap branch.
        let tx = Transaction::new(doc, PosMap::insertion(0, 4));
        let state = plugin.apply(&tx, &state);

        assert_eq!(state.decorations.len(), 1);
        let after = &state.decorations.decorations()[0];
        assert_eq!(after.widget, before.widget, "identity preserved");
        assert_eq!(after.pos, before.pos + 4);
    }

    #[tokio::test]
    async fn test_shared_cache_across_plugins() {
        let provider = TitleProvider::new();
        let cache = PreviewCache::new();
        let first = LinkPreviewPlugin::with_cache(
            ProviderRegistry::new(vec![provider.clone()]),
            cache.clone(),
        );
        let second = LinkPreviewPlugin::with_cache(
            ProviderRegistry::new(vec![provider.clone()]),
            cache,
        );
        let doc = linked_doc();

        first.resolve(&doc).await.unwrap();

        // The second plugin sees the settled entry: hit on init, no-op batch.
        let state = second.init(&doc);
        assert!(matches!(
            state.decorations.decorations()[0].widget.state,
            WidgetState::Ready(_)
        ));
        assert!(matches!(second.resolve(&doc).await, Err(Error::NothingToFetch)));
        assert_eq!(provider.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_superseded_resolve_still_writes_cache() {
        let provider = TitleProvider::new();
        let plugin = LinkPreviewPlugin::new(ProviderRegistry::new(vec![provider.clone()]));
        let old_doc = linked_doc();
        let state = plugin.init(&old_doc);

        // An edit lands while the batch for the old snapshot is in flight.
        let new_doc = Node::element(
            "doc",
            vec![
                Node::element("paragraph", vec![Node::text("typed ahead")]),
                Node::element(
                    "paragraph",
                    vec![Node::marked_text(
                        "example",
                        vec![Mark::link("https://example.com")],
                    )],
                ),
            ],
        );
        let tx = Transaction::new(new_doc.clone(), PosMap::insertion(0, 13));
        let state = plugin.apply(&tx, &state);

        // The superseded batch settles; its cache write is keyed by URL,
        // so a rebuild against the new snapshot serves it.
        let completion = plugin.resolve(&old_doc).await.unwrap();
        let tx = Transaction::new(new_doc, PosMap::identity()).with_completion(completion);
        let state = plugin.apply(&tx, &state);
        assert!(matches!(
            state.decorations.decorations()[0].widget.state,
            WidgetState::Ready(_)
        ));
    }
}
