//! HTTP fetching and the bundled page-title provider.
//!
//! [`Fetcher`] owns the reqwest client shared by HTTP-backed providers.
//! [`SiteTitleProvider`] is the default provider: it accepts any `http`/
//! `https` URL, fetches the page, and renders a preview from its `<title>`.
//! Hosts wanting richer previews register their own providers ahead of it.

use regex::Regex;
use reqwest::{Client, StatusCode};
use url::Url;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::PreviewConfig;
use crate::provider::{PreviewContent, Provider};
use crate::{Error, Result};

/// HTTP client wrapper used by bundled providers.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the configured timeout and user agent.
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetches a URL's body as text, mapping non-success statuses to errors.
    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                return Err(Error::Provider {
                    url: url.to_string(),
                    message: "resource not found (404)".into(),
                });
            }
            // error_for_status only covers 4xx/5xx; an unfollowable 3xx
            // (e.g. a redirect without a Location header) lands here too.
            return match response.error_for_status() {
                Ok(_) => Err(Error::Provider {
                    url: url.to_string(),
                    message: format!("unexpected status {status}"),
                }),
                Err(err) => Err(Error::Network(err)),
            };
        }

        let body = response.text().await?;
        debug!(url = %url, bytes = body.len(), "fetched page body");
        Ok(body)
    }
}

/// Default provider rendering a preview from a page's `<title>`.
pub struct SiteTitleProvider {
    fetcher: Fetcher,
    title_pattern: Regex,
}

impl SiteTitleProvider {
    /// Creates the provider with its own HTTP client.
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let title_pattern = Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
            .map_err(|e| Error::Extract(e.to_string()))?;
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            title_pattern,
        })
    }

    fn extract_title(&self, body: &str) -> Option<String> {
        let raw = self.title_pattern.captures(body)?.get(1)?.as_str();
        let decoded = html_escape::decode_html_entities(raw);
        let title = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
        (!title.is_empty()).then_some(title)
    }
}

#[async_trait]
impl Provider for SiteTitleProvider {
    fn name(&self) -> &str {
        "site-title"
    }

    fn matches(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    async fn render(&self, url: &Url) -> Result<Option<PreviewContent>> {
        let body = self.fetcher.fetch_text(url).await?;
        let Some(title) = self.extract_title(&body) else {
            // A page without a usable title is an explicit empty result,
            // not a failure.
            return Ok(None);
        };
        info!(url = %url, "rendered title preview");
        let mut content = PreviewContent::new(url.as_str()).with_title(title);
        if let Some(domain) = url.domain() {
            content = content.with_site_name(domain.to_string());
        }
        Ok(Some(content))
    }
}
