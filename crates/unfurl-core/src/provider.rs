//! Pluggable content providers and their ordered registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::Result;

/// Rendered preview content for a single URL.
///
/// Providers decide how much of this they can fill in; only the source URL is
/// guaranteed. Rendering the fields into actual UI is the host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewContent {
    /// The URL this preview describes.
    pub url: String,
    /// Page or resource title.
    pub title: Option<String>,
    /// Short description, e.g. from OpenGraph metadata.
    pub description: Option<String>,
    /// Human-readable site name.
    pub site_name: Option<String>,
}

impl PreviewContent {
    /// Creates preview content for `url` with all fields empty.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            site_name: None,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the site name.
    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = Some(site_name.into());
        self
    }
}

/// A pluggable preview source: a URL predicate plus an async renderer.
///
/// Providers are registered once at plugin construction and never change.
/// `render` returning `Ok(None)` means "I matched but have nothing to show";
/// the orchestrator caches that as an explicit empty result. Errors need no
/// handling inside the provider — the orchestrator absorbs them.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Whether this provider can render a preview for `url`.
    fn matches(&self, url: &Url) -> bool;

    /// Fetches and renders preview content for `url`.
    async fn render(&self, url: &Url) -> Result<Option<PreviewContent>>;
}

/// Ordered set of providers; registration order decides who wins.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Creates a registry from an ordered provider list.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    /// Returns the first registered provider whose predicate accepts `url`.
    pub fn find_for(&self, url: &Url) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|provider| provider.matches(url))
            .cloned()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    struct DomainProvider {
        name: &'static str,
        domain: &'static str,
    }

    #[async_trait]
    impl Provider for DomainProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn matches(&self, url: &Url) -> bool {
            url.domain() == Some(self.domain)
        }

        async fn render(&self, url: &Url) -> Result<Option<PreviewContent>> {
            Ok(Some(PreviewContent::new(url.as_str()).with_title(self.name)))
        }
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(vec![
            Arc::new(DomainProvider {
                name: "first",
                domain: "example.com",
            }),
            Arc::new(DomainProvider {
                name: "second",
                domain: "example.com",
            }),
            Arc::new(DomainProvider {
                name: "other",
                domain: "other.net",
            }),
        ])
    }

    #[test]
    fn test_first_match_wins() {
        let url = Url::parse("https://example.com/page").unwrap();
        let provider = registry().find_for(&url).unwrap();
        assert_eq!(provider.name(), "first");
    }

    #[test]
    fn test_no_match_is_none() {
        let url = Url::parse("https://unmatched.org").unwrap();
        assert!(registry().find_for(&url).is_none());
    }

    #[test]
    fn test_later_provider_reachable() {
        let url = Url::parse("https://other.net/x").unwrap();
        let provider = registry().find_for(&url).unwrap();
        assert_eq!(provider.name(), "other");
    }
}
