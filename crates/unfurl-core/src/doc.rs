//! Minimal structured-document model the preview core operates on.
//!
//! This module plays the role of the host editing surface: a node tree with
//! marks, an integer position scheme, and a [`Transaction`] describing one
//! edit as a new document snapshot plus a structural [`PosMap`]. It is
//! intentionally small — just enough surface for the scanner to traverse,
//! the decoration set to anchor into, and the state machine to reconcile
//! against.
//!
//! Positions use an open/close token scheme: an element occupies one token
//! for its opening boundary, one per token of its content, and one for its
//! closing boundary; a text leaf occupies one token per character. The root
//! node's own boundary tokens are not addressable — position 0 is the opening
//! token of the root's first child.

use serde::{Deserialize, Serialize};

use crate::orchestrator::FetchCompletion;

/// An inline annotation attached to a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mark {
    /// A hyperlink annotation carrying its destination.
    Link {
        /// The link destination as written in the document.
        href: String,
    },
    /// Emphasis, carried only so documents can contain non-link marks.
    Emphasis,
}

impl Mark {
    /// Creates a link mark pointing at `href`.
    pub fn link(href: impl Into<String>) -> Self {
        Self::Link { href: href.into() }
    }
}

/// A document node: either an element with children or a marked text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Node {
    /// An element node with a kind tag and ordered children.
    Element {
        /// Element kind, e.g. `"doc"` or `"paragraph"`.
        kind: String,
        /// Ordered child nodes.
        children: Vec<Node>,
    },
    /// A text leaf with zero or more marks.
    Text {
        /// The text content.
        text: String,
        /// Marks applied to the whole leaf.
        marks: Vec<Mark>,
    },
}

/// Traversal directive returned by a [`Node::descendants`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Continue into this node's children.
    Descend,
    /// Do not visit this node's children.
    Skip,
}

impl Node {
    /// Creates an element node.
    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            kind: kind.into(),
            children,
        }
    }

    /// Creates an unmarked text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    /// Creates a text leaf carrying the given marks.
    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self::Text {
            text: text.into(),
            marks,
        }
    }

    /// Number of position tokens this node occupies.
    pub fn size(&self) -> usize {
        match self {
            Self::Element { children, .. } => {
                2 + children.iter().map(Node::size).sum::<usize>()
            },
            Self::Text { text, .. } => text.chars().count(),
        }
    }

    /// Child nodes, empty for text leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }

    /// Text content, `None` for elements.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Element { .. } => None,
        }
    }

    /// Marks on this node, empty for elements.
    pub fn marks(&self) -> &[Mark] {
        match self {
            Self::Text { marks, .. } => marks,
            Self::Element { .. } => &[],
        }
    }

    /// The `href` of this node's link mark, if it carries one.
    pub fn link_href(&self) -> Option<&str> {
        self.marks().iter().find_map(|mark| match mark {
            Mark::Link { href } => Some(href.as_str()),
            Mark::Emphasis => None,
        })
    }

    /// Depth-first traversal of this node's descendants in document order.
    ///
    /// The visitor receives each descendant together with the position of its
    /// opening token (for elements) or first character (for text). Returning
    /// [`Walk::Skip`] prevents descent into that node's children; the
    /// traversal itself continues with the next sibling.
    pub fn descendants(&self, visit: &mut impl FnMut(&Node, usize) -> Walk) {
        walk_children(self.children(), 0, visit);
    }
}

fn walk_children(children: &[Node], start: usize, visit: &mut impl FnMut(&Node, usize) -> Walk) {
    let mut pos = start;
    for child in children {
        let directive = visit(child, pos);
        if directive == Walk::Descend {
            walk_children(child.children(), pos + 1, visit);
        }
        pos += child.size();
    }
}

/// One replaced span of a structural edit, in old-document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First old position covered by the replacement.
    pub start: usize,
    /// Number of old positions replaced (0 for a pure insertion).
    pub old_len: usize,
    /// Number of new positions inserted.
    pub new_len: usize,
}

/// Structural position map of a single edit.
///
/// Spans are non-overlapping and ordered by `start`. Mapping a position
/// inside a replaced span yields `None` — anything anchored there was
/// destroyed by the edit. A position at the boundary of a pure insertion
/// shifts past the inserted content, so typing immediately before a
/// decorated node moves the decoration with the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosMap {
    spans: Vec<Span>,
}

impl PosMap {
    /// A map describing an edit that moved nothing.
    pub const fn identity() -> Self {
        Self { spans: Vec::new() }
    }

    /// Builds a map from ordered, non-overlapping spans.
    pub fn new(spans: Vec<Span>) -> Self {
        debug_assert!(
            spans.windows(2).all(|w| w[0].start + w[0].old_len <= w[1].start),
            "spans must be ordered and non-overlapping"
        );
        Self { spans }
    }

    /// Map for an insertion of `len` positions at `at`.
    pub fn insertion(at: usize, len: usize) -> Self {
        Self::new(vec![Span {
            start: at,
            old_len: 0,
            new_len: len,
        }])
    }

    /// Map for a deletion of `len` positions starting at `start`.
    pub fn deletion(start: usize, len: usize) -> Self {
        Self::new(vec![Span {
            start,
            old_len: len,
            new_len: 0,
        }])
    }

    /// Maps an old-document position into the new document.
    ///
    /// Returns `None` when the position was inside a replaced span.
    pub fn map(&self, pos: usize) -> Option<usize> {
        let mut delta: isize = 0;
        for span in &self.spans {
            if pos < span.start {
                break;
            }
            if span.old_len > 0 && pos < span.start + span.old_len {
                return None;
            }
            delta += span.new_len as isize - span.old_len as isize;
        }
        usize::try_from(pos as isize + delta).ok()
    }
}

/// One document edit: the new snapshot, its structural map, and optionally
/// the completion signal of a previously scheduled fetch batch.
///
/// The completion payload is how the host tells the state machine "the batch
/// you scheduled against an earlier snapshot has settled" — the typed
/// replacement for an ad hoc attached-result check.
#[derive(Debug, Clone)]
pub struct Transaction {
    doc: Node,
    map: PosMap,
    completion: Option<FetchCompletion>,
}

impl Transaction {
    /// Creates a transaction for an edit producing `doc` via `map`.
    pub const fn new(doc: Node, map: PosMap) -> Self {
        Self {
            doc,
            map,
            completion: None,
        }
    }

    /// Attaches a fetch completion signal to this transaction.
    pub fn with_completion(mut self, completion: FetchCompletion) -> Self {
        self.completion = Some(completion);
        self
    }

    /// The document snapshot after this edit.
    pub const fn doc(&self) -> &Node {
        &self.doc
    }

    /// The structural position map of this edit.
    pub const fn pos_map(&self) -> &PosMap {
        &self.map
    }

    /// The attached fetch completion, if any.
    pub const fn completion(&self) -> Option<&FetchCompletion> {
        self.completion.as_ref()
    }
}
