use rayon::prelude::*;
use tracing::debug;

use crate::geometry::GeometryBox;
use crate::layout::order::order_lines;
use crate::layout::{
    normalize_ws, Content, ElementKind, LayoutDocument, LayoutPage, NodeId, PageLines, TextLine,
};

/// Why a line element produced no [`TextLine`]. Never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the line nor any of its words has a complete box.
    MalformedGeometry,
    /// Neither the line nor its words carry any text.
    EmptyText,
}

/// Reconstruct the lines of one page, in document order.
///
/// Lines lacking text or a box fall back to their word descendants for
/// whichever of the two is missing. Lines that still lack either are
/// dropped; the rest of the page is unaffected.
pub fn reconstruct_page(doc: &LayoutDocument, page: &LayoutPage) -> Vec<TextLine> {
    let mut lines = Vec::new();
    for id in &page.lines {
        match reconstruct_line(doc, *id) {
            Ok(line) => lines.push(line),
            Err(reason) => debug!(node = id.0, ?reason, "dropping line element"),
        }
    }
    lines
}

/// Reconstruct a single line element.
///
/// A line whose only text sits inside its words gets the word texts joined
/// with single spaces, so adjacent word elements never run together. Any
/// text of its own keeps the line's full text content.
pub fn reconstruct_line(doc: &LayoutDocument, line: NodeId) -> Result<TextLine, SkipReason> {
    let words: Vec<NodeId> = doc
        .descendants(line)
        .into_iter()
        .filter(|id| doc.node(*id).kind == ElementKind::Word)
        .collect();

    let mut own_text = String::new();
    push_text_outside_words(doc, line, &mut own_text);

    let text = if own_text.trim().is_empty() && !words.is_empty() {
        let joined = words
            .iter()
            .map(|id| doc.text_content(*id))
            .collect::<Vec<_>>()
            .join(" ");
        normalize_ws(&joined)
    } else {
        normalize_ws(&doc.text_content(line))
    };
    if text.is_empty() {
        return Err(SkipReason::EmptyText);
    }

    let bbox = match doc.node(line).geometry {
        Some(b) => b,
        None => GeometryBox::enclosing(words.iter().filter_map(|id| doc.node(*id).geometry))
            .ok_or(SkipReason::MalformedGeometry)?,
    };

    Ok(TextLine { bbox, text })
}

/// Text under `id` that does not belong to a word element.
fn push_text_outside_words(doc: &LayoutDocument, id: NodeId, out: &mut String) {
    for c in &doc.node(id).content {
        match c {
            Content::Text(t) => out.push_str(t),
            Content::Child(child) if doc.node(*child).kind == ElementKind::Word => {}
            Content::Child(child) => push_text_outside_words(doc, *child, out),
        }
    }
}

/// Reconstruct and order every page of `doc`. Pages run in parallel.
pub fn reconstruct_document(doc: &LayoutDocument) -> Vec<PageLines> {
    doc.pages
        .par_iter()
        .enumerate()
        .map(|(i, page)| PageLines {
            page_number: i + 1,
            lines: order_lines(reconstruct_page(doc, page)),
        })
        .collect()
}
