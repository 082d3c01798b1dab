pub mod markup;
pub mod order;
pub mod reconstruct;
pub mod style;

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryBox;

/// Index of an element inside a [`LayoutDocument`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Granularity of a positioned element, as decided by the document's
/// [`MarkupConvention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Page,
    Line,
    Word,
    Other,
}

/// How a document marks its line elements. Detected once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupConvention {
    /// Lines and words carry class tokens such as `line`/`ocr_line`, `word`/`ocrx_word`.
    ClassMarkers,
    /// Every `tt` element is a monospaced run with its own box.
    MonospaceRuns,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Child(NodeId),
}

/// One node of the parsed markup tree.
#[derive(Debug, Clone)]
pub struct PositionedElement {
    pub tag: String,
    pub kind: ElementKind,
    pub geometry: Option<GeometryBox>,
    /// Text runs and child elements in document order.
    pub content: Vec<Content>,
}

impl PositionedElement {
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.content.iter().filter_map(|c| match c {
            Content::Child(id) => Some(*id),
            Content::Text(_) => None,
        })
    }
}

/// Arena-backed tree of positioned elements for one input document.
#[derive(Debug, Clone)]
pub struct LayoutDocument {
    pub nodes: Vec<PositionedElement>,
    pub root: NodeId,
    /// `None` only when the document holds no text at all.
    pub convention: Option<MarkupConvention>,
    pub pages: Vec<LayoutPage>,
}

/// One page of a document and the line elements that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    /// Page-marked element, or the document root when nothing is page-marked.
    pub element: NodeId,
    /// Outermost line elements assigned to this page, in document order.
    pub lines: Vec<NodeId>,
}

impl LayoutDocument {
    pub fn node(&self, id: NodeId) -> &PositionedElement {
        &self.nodes[id.0]
    }

    /// All descendants of `id` (excluding `id`) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children().collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let before = stack.len();
            stack.extend(self.node(next).children());
            stack[before..].reverse();
        }
        out
    }

    /// Concatenation of every text run under `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.push_text(id, &mut out);
        out
    }

    fn push_text(&self, id: NodeId, out: &mut String) {
        for c in &self.node(id).content {
            match c {
                Content::Text(t) => out.push_str(t),
                Content::Child(child) => self.push_text(*child, out),
            }
        }
    }
}

/// A reconstructed visual text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: GeometryBox,
    pub text: String,
}

/// Ordered lines of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLines {
    pub page_number: usize,
    pub lines: Vec<TextLine>,
}

/// Collapse every whitespace run to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
