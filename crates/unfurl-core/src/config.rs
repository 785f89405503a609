//! Configuration for the preview plugin and its bundled HTTP provider.
//!
//! Unlike an application config this is a library config: it is constructed
//! programmatically (usually via [`PreviewConfig::default`]) and handed to
//! [`LinkPreviewPlugin`] at construction time. It serializes cleanly so hosts
//! that persist settings can embed it in their own config files.
//!
//! [`LinkPreviewPlugin`]: crate::plugin::LinkPreviewPlugin

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout applied by the bundled HTTP provider, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Settings consumed by the plugin and the bundled [`Fetcher`].
///
/// The orchestrator itself imposes no timeout on provider renderers (a hung
/// provider stalls only its own batch); `fetch_timeout_secs` bounds the HTTP
/// requests made by the bundled provider specifically.
///
/// [`Fetcher`]: crate::fetcher::Fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Request timeout for the bundled HTTP provider, in seconds.
    pub fetch_timeout_secs: u64,
    /// User agent sent with preview fetches.
    pub user_agent: String,
}

impl PreviewConfig {
    /// Returns the fetch timeout as a [`Duration`].
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: concat!("unfurl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
