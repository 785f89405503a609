//! Document scan that identifies previewable link-only nodes.
//!
//! A node is a candidate iff it has exactly one child, that child is a text
//! leaf, and the leaf carries a link mark whose `href` parses as a URL. The
//! scan is a depth-first traversal that does not descend into accepted
//! candidates, so candidates never nest; traversal order defines candidate
//! order. Nodes that almost qualify are excluded silently — "not a
//! candidate" is an expected outcome, not an error.

use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::doc::{Node, Walk};
use crate::provider::{Provider, ProviderRegistry};

/// A previewable node found by the scan, bound to its provider.
///
/// Ephemeral: recomputed on every scan, discarded with the cycle.
#[derive(Clone)]
pub struct Candidate {
    /// The parsed link destination.
    pub url: Url,
    /// The first registered provider accepting the URL.
    pub provider: Arc<dyn Provider>,
    /// Position of the node's opening token.
    pub pos: usize,
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("url", &self.url.as_str())
            .field("provider", &self.provider.name())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Why a node was excluded from the scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Not an element with exactly one text-leaf child.
    NotLinkOnly,
    /// The single text child carries no link mark.
    NoUrl,
    /// The link mark's `href` does not parse as a URL.
    InvalidUrl,
    /// No registered provider accepts the URL.
    NoProvider,
}

/// Outcome of matching a single node against the candidate rules.
#[derive(Debug, Clone)]
pub enum CandidateMatch {
    /// The node is previewable.
    Candidate(Candidate),
    /// The node is not previewable, with the reason.
    NotApplicable(Skip),
}

/// Matches one node against the candidate rules.
pub fn match_node(node: &Node, pos: usize, registry: &ProviderRegistry) -> CandidateMatch {
    let [child] = node.children() else {
        return CandidateMatch::NotApplicable(Skip::NotLinkOnly);
    };
    if child.as_text().is_none() {
        return CandidateMatch::NotApplicable(Skip::NotLinkOnly);
    }
    let Some(href) = child.link_href() else {
        return CandidateMatch::NotApplicable(Skip::NoUrl);
    };
    let Ok(url) = Url::parse(href) else {
        debug!(href, "skipping link with unparseable href");
        return CandidateMatch::NotApplicable(Skip::InvalidUrl);
    };
    match registry.find_for(&url) {
        Some(provider) => CandidateMatch::Candidate(Candidate { url, provider, pos }),
        None => CandidateMatch::NotApplicable(Skip::NoProvider),
    }
}

/// Scans `doc` and returns its candidates in document order.
pub fn scan(doc: &Node, registry: &ProviderRegistry) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    doc.descendants(&mut |node, pos| match match_node(node, pos, registry) {
        CandidateMatch::Candidate(candidate) => {
            candidates.push(candidate);
            Walk::Skip
        },
        CandidateMatch::NotApplicable(_) => Walk::Descend,
    });
    debug!(count = candidates.len(), "document scan complete");
    candidates
}
