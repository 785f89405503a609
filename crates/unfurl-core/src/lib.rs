//! # unfurl-core
//!
//! Inline link preview decorations for structured documents.
//!
//! The crate detects "link-only" nodes in a document tree, fetches rich
//! preview content for each detected link from pluggable providers, caches
//! results by URL, and maintains a set of positioned overlay decorations
//! that stays correct under concurrent edits — in-flight fetches never go
//! stale, decoration positions track structural changes, and repeated scans
//! never trigger duplicate network work for settled URLs.
//!
//! ## Architecture
//!
//! - **Scanner**: depth-first detection of link-only candidate nodes
//! - **Providers**: ordered registry of URL matchers with async renderers
//! - **Cache**: process-lifetime URL → settled-result map, injectable
//! - **Decorations**: positioned widgets built from scan + cache state
//! - **Orchestrator**: concurrent batch resolution with failure absorption
//! - **Plugin**: the regenerate-vs-remap reconciliation state machine
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use unfurl_core::{
//!     LinkPreviewPlugin, Mark, Node, PosMap, ProviderRegistry, Transaction,
//! };
//! # use unfurl_core::{PreviewContent, Provider, Result};
//! # use async_trait::async_trait;
//! # struct MyProvider;
//! # #[async_trait]
//! # impl Provider for MyProvider {
//! #     fn name(&self) -> &str { "mine" }
//! #     fn matches(&self, _url: &url::Url) -> bool { true }
//! #     async fn render(&self, url: &url::Url) -> Result<Option<PreviewContent>> {
//! #         Ok(Some(PreviewContent::new(url.as_str())))
//! #     }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let plugin = LinkPreviewPlugin::new(ProviderRegistry::new(vec![Arc::new(MyProvider)]));
//!
//! let doc = Node::element(
//!     "doc",
//!     vec![Node::element(
//!         "paragraph",
//!         vec![Node::marked_text("example", vec![Mark::link("https://example.com")])],
//!     )],
//! );
//!
//! // Placeholders now, content once the batch settles.
//! let state = plugin.init(&doc);
//! let completion = plugin.resolve(&doc).await?;
//! let tx = Transaction::new(doc, PosMap::identity()).with_completion(completion);
//! let state = plugin.apply(&tx, &state);
//! assert_eq!(state.decorations.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Scanning, cache lookups, and decoration construction are synchronous and
//! never suspend; only provider renderers await. Fetch batches superseded by
//! newer edits are not cancelled — their cache writes are keyed by URL and
//! therefore still useful, while their completion simply goes unused.

/// Process-lifetime preview cache keyed by URL
pub mod cache;
/// Plugin and fetch configuration
pub mod config;
/// Positioned preview widgets and decoration sets
pub mod decoration;
/// Minimal document tree, positions, and transactions
pub mod doc;
/// Error types and result aliases
pub mod error;
/// HTTP fetching and the bundled page-title provider
pub mod fetcher;
/// Concurrent fetch-batch orchestration
pub mod orchestrator;
/// The reconciliation state machine
pub mod plugin;
/// Provider trait and ordered registry
pub mod provider;
/// Link-only candidate detection
pub mod scanner;

// Re-export commonly used types
pub use cache::{CacheEntry, PreviewCache, PreviewOutcome};
pub use config::PreviewConfig;
pub use decoration::{
    build_decorations, Decoration, DecorationSet, PreviewWidget, WidgetState, PLACEHOLDER_CLASS,
};
pub use doc::{Mark, Node, PosMap, Span, Transaction, Walk};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, SiteTitleProvider};
pub use orchestrator::{resolve_misses, FetchCompletion};
pub use plugin::{LinkPreviewPlugin, PluginState};
pub use provider::{PreviewContent, Provider, ProviderRegistry};
pub use scanner::{match_node, scan, Candidate, CandidateMatch, Skip};
