//! Error types and handling for unfurl-core operations.
//!
//! The fetch path has an unusual shape: provider failures are absorbed at the
//! orchestrator boundary and turned into cached placeholders, so most errors
//! in this enum never cross the plugin surface. The one variant callers of
//! [`resolve_misses`] must handle is [`Error::NothingToFetch`], which is a
//! no-op signal rather than a failure — it means the scan found no URLs
//! missing from the cache and no state update is needed.
//!
//! ```rust
//! use unfurl_core::Error;
//!
//! fn after_batch(result: unfurl_core::Result<()>) {
//!     match result {
//!         Ok(()) => println!("batch resolved, schedule a rebuild"),
//!         Err(e) if e.is_noop() => println!("nothing to fetch, skip rebuild"),
//!         Err(e) => println!("{} error: {e}", e.category()),
//!     }
//! }
//! ```
//!
//! [`resolve_misses`]: crate::orchestrator::resolve_misses

use thiserror::Error;

/// The main error type for unfurl-core operations.
///
/// All public fallible functions return `Result<T, Error>`. Errors carry a
/// coarse category for logging and a recoverability hint for retry decisions.
#[derive(Error, Debug)]
pub enum Error {
    /// A fetch batch found no cache-missing candidates.
    ///
    /// This is a signal, not a failure: the caller should skip the decoration
    /// rebuild it would otherwise schedule. Distinguish it with
    /// [`Error::is_noop`] rather than matching on the variant at every call
    /// site.
    #[error("no previewable links missing from the cache")]
    NothingToFetch,

    /// Network operation failed.
    ///
    /// Raised by the bundled HTTP provider when the transport itself fails
    /// (connection refused, timeout, TLS). The underlying `reqwest::Error`
    /// is preserved for detailed inspection.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A provider renderer failed for a specific URL.
    ///
    /// The orchestrator converts this into a cached `Failed` placeholder and
    /// never propagates it; the variant exists so providers have a structured
    /// way to report what went wrong before absorption.
    #[error("provider failed for {url}: {message}")]
    Provider {
        /// The URL whose preview could not be rendered.
        url: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The bundled provider's extraction machinery could not be built.
    ///
    /// Raised from [`SiteTitleProvider::new`] when the title pattern fails
    /// to compile. A fetched page without a usable `<title>` is NOT this
    /// error — that settles as an explicit empty result (`Ok(None)`).
    ///
    /// [`SiteTitleProvider::new`]: crate::fetcher::SiteTitleProvider::new
    #[error("extraction error: {0}")]
    Extract(String),
}

impl Error {
    /// Returns a coarse category string for logging and metrics.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::NothingToFetch => "no-op",
            Self::Network(_) => "network",
            Self::Provider { .. } => "provider",
            Self::Extract(_) => "extract",
        }
    }

    /// Returns `true` when this error is the no-op fetch signal.
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::NothingToFetch)
    }

    /// Returns `true` if retrying the operation might succeed.
    ///
    /// Note that the cache deliberately never retries: a URL cached as
    /// `Failed` stays failed for the cache lifetime. This hint is for
    /// providers' own internal retry logic.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::NothingToFetch | Self::Provider { .. } | Self::Extract(_) => false,
        }
    }
}

/// Convenience result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
