//! Positioned preview widgets and the decoration set they live in.
//!
//! Decorations overlay the document without mutating it. The builder emits
//! one widget per scanned candidate: cache hits are filled in synchronously
//! (no flicker on regeneration), misses stay in the loading state until a
//! later cycle observes the populated cache. The builder never fetches.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{PreviewCache, PreviewOutcome};
use crate::doc::{Node, PosMap};
use crate::provider::{PreviewContent, ProviderRegistry};
use crate::scanner::scan;

/// Stable class name carried by every preview widget, for external
/// inspection and automated tests.
pub const PLACEHOLDER_CLASS: &str = "unfurl-preview";

/// Visual state of a preview widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WidgetState {
    /// No settled result yet; show a loading indicator.
    Loading,
    /// Content resolved and ready to render.
    Ready(PreviewContent),
    /// The provider had nothing to show for this URL.
    Empty,
    /// Fetching failed; show a generic error marker.
    Failed,
}

/// The renderable payload of one preview decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewWidget {
    /// URL the widget previews.
    pub url: String,
    /// Current visual state.
    pub state: WidgetState,
}

impl PreviewWidget {
    /// Creates a widget for `url` in the given state.
    pub fn new(url: impl Into<String>, state: WidgetState) -> Self {
        Self {
            url: url.into(),
            state,
        }
    }

    /// The stable class name identifying preview widgets.
    pub const fn class(&self) -> &'static str {
        PLACEHOLDER_CLASS
    }
}

/// A position-anchored widget overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Anchor position in the document the set was built against.
    pub pos: usize,
    /// The widget shown at the anchor.
    pub widget: PreviewWidget,
}

/// Ordered set of decorations; the externally visible output of the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    /// Creates a set from decorations already in document order.
    pub fn new(decorations: Vec<Decoration>) -> Self {
        Self { decorations }
    }

    /// The decorations in document order.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Number of decorations in the set.
    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    /// Whether the set holds no decorations.
    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    /// Remaps every anchor through a structural edit.
    ///
    /// Widgets are untouched; decorations whose anchor was inside a replaced
    /// span are dropped with the content that carried them.
    pub fn map(&self, map: &PosMap) -> Self {
        let decorations = self
            .decorations
            .iter()
            .filter_map(|d| {
                map.map(d.pos).map(|pos| Decoration {
                    pos,
                    widget: d.widget.clone(),
                })
            })
            .collect();
        Self { decorations }
    }
}

/// Builds the decoration set for a document snapshot.
///
/// Serves cache hits immediately; leaves loading placeholders for misses.
/// Never blocks and never triggers fetches.
pub fn build_decorations(
    doc: &Node,
    registry: &ProviderRegistry,
    cache: &PreviewCache,
) -> DecorationSet {
    let mut hits = 0usize;
    let decorations = scan(doc, registry)
        .into_iter()
        .map(|candidate| {
            let url = candidate.url.as_str();
            let state = match cache.get(url) {
                Some(entry) => {
                    hits += 1;
                    match entry.outcome {
                        PreviewOutcome::Ready(content) => WidgetState::Ready(content),
                        PreviewOutcome::Empty => WidgetState::Empty,
                        PreviewOutcome::Failed => WidgetState::Failed,
                    }
                },
                None => WidgetState::Loading,
            };
            Decoration {
                pos: candidate.pos,
                widget: PreviewWidget::new(url, state),
            }
        })
        .collect::<Vec<_>>();
    debug!(total = decorations.len(), hits, "built decoration set");
    DecorationSet::new(decorations)
}
