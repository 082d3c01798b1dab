//! Lenient markup reader producing a [`LayoutDocument`].
//!
//! Layout backends emit XHTML-ish dumps that are not always well formed:
//! HTML void elements, stray end tags, HTML entities, unquoted attributes.
//! The reader keeps going through all of those and only stops at a hard
//! syntax error, keeping whatever tree was built up to that point.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::error::TablineError;
use crate::geometry::GeometryBox;
use crate::layout::style::parse_style_box;
use crate::layout::{
    Content, ElementKind, LayoutDocument, LayoutPage, MarkupConvention, NodeId,
    PositionedElement,
};

const VOID_ELEMENTS: &[&str] = &["br", "img", "hr", "meta", "link", "input", "wbr"];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
const MONOSPACE_RUN_TAG: &str = "tt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassMarker {
    Line,
    Word,
    Page,
    None,
}

/// Parse markup into an arena tree and classify its elements.
///
/// Fails with [`TablineError::UnrecognizedLayout`] when the document has
/// text but neither line class markers nor `tt` runs.
pub fn parse_markup(markup: &str) -> Result<LayoutDocument, TablineError> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
    }

    let mut builder = TreeBuilder::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.local_name().as_ref());
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    builder.leaf(tag, &e);
                } else {
                    builder.open(tag, &e);
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = tag_name(e.local_name().as_ref());
                builder.leaf(tag, &e);
            }
            Ok(Event::End(e)) => builder.close(&tag_name(e.local_name().as_ref())),
            Ok(Event::Text(t)) => {
                let text = match t.unescape_with(resolve_html_entity) {
                    Ok(s) => s.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                builder.text(text);
            }
            Ok(Event::CData(c)) => builder.text(String::from_utf8_lossy(&c).into_owned()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    position = reader.error_position(),
                    error = %e,
                    "malformed layout markup, keeping elements read so far"
                );
                break;
            }
        }
    }

    builder.finish()
}

struct TreeBuilder {
    nodes: Vec<PositionedElement>,
    markers: Vec<ClassMarker>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            nodes: vec![PositionedElement {
                tag: "#document".into(),
                kind: ElementKind::Other,
                geometry: None,
                content: Vec::new(),
            }],
            markers: vec![ClassMarker::None],
            stack: vec![NodeId(0)],
        }
    }

    fn current(&self) -> NodeId {
        // The root is never popped.
        self.stack[self.stack.len() - 1]
    }

    fn push_node(&mut self, tag: String, start: &BytesStart<'_>) -> NodeId {
        let (geometry, marker) = read_attributes(start);
        let id = NodeId(self.nodes.len());
        self.nodes.push(PositionedElement {
            tag,
            kind: ElementKind::Other,
            geometry,
            content: Vec::new(),
        });
        self.markers.push(marker);
        let parent = self.current();
        self.nodes[parent.0].content.push(Content::Child(id));
        id
    }

    fn open(&mut self, tag: String, start: &BytesStart<'_>) {
        let id = self.push_node(tag, start);
        self.stack.push(id);
    }

    fn leaf(&mut self, tag: String, start: &BytesStart<'_>) {
        self.push_node(tag, start);
    }

    /// Close the innermost open element named `tag` and everything opened
    /// after it. Unmatched end tags are ignored.
    fn close(&mut self, tag: &str) {
        let found = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, id)| self.nodes[id.0].tag == tag)
            .map(|(i, _)| i);
        match found {
            Some(i) => self.stack.truncate(i),
            None => debug!(tag, "ignoring unmatched end tag"),
        }
    }

    fn text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let current = self.current();
        let node = &mut self.nodes[current.0];
        if RAW_TEXT_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }
        node.content.push(Content::Text(text));
    }

    fn finish(self) -> Result<LayoutDocument, TablineError> {
        let TreeBuilder { nodes, markers, .. } = self;
        let mut doc = LayoutDocument {
            nodes,
            root: NodeId(0),
            convention: None,
            pages: Vec::new(),
        };

        let convention = detect_convention(&doc, &markers);
        match convention {
            Some(c) => {
                classify(&mut doc, &markers, c);
                doc.convention = Some(c);
                doc.pages = find_pages(&doc);
            }
            None => {
                let text = doc.text_content(doc.root);
                if !text.trim().is_empty() {
                    return Err(TablineError::UnrecognizedLayout(
                        "no line markers (class \"line\"/\"ocr_line\") and no <tt> runs found".into(),
                    ));
                }
            }
        }

        debug!(
            nodes = doc.nodes.len(),
            pages = doc.pages.len(),
            convention = ?doc.convention,
            "parsed layout markup"
        );
        Ok(doc)
    }
}

fn detect_convention(doc: &LayoutDocument, markers: &[ClassMarker]) -> Option<MarkupConvention> {
    if markers.contains(&ClassMarker::Line) {
        Some(MarkupConvention::ClassMarkers)
    } else if doc.nodes.iter().any(|n| n.tag == MONOSPACE_RUN_TAG) {
        Some(MarkupConvention::MonospaceRuns)
    } else {
        None
    }
}

fn classify(doc: &mut LayoutDocument, markers: &[ClassMarker], convention: MarkupConvention) {
    // (node, inside a tt run)
    let mut stack = vec![(doc.root, false)];
    while let Some((id, in_run)) = stack.pop() {
        let node = &doc.nodes[id.0];
        let is_run = node.tag == MONOSPACE_RUN_TAG;
        let kind = match (convention, markers[id.0]) {
            (_, ClassMarker::Page) => ElementKind::Page,
            (_, ClassMarker::Word) => ElementKind::Word,
            (MarkupConvention::ClassMarkers, ClassMarker::Line) => ElementKind::Line,
            (MarkupConvention::MonospaceRuns, _) if is_run => ElementKind::Line,
            (MarkupConvention::MonospaceRuns, _)
                if in_run && node.tag == "span" && node.geometry.is_some() =>
            {
                ElementKind::Word
            }
            _ => ElementKind::Other,
        };
        let children: Vec<NodeId> = node.children().collect();
        doc.nodes[id.0].kind = kind;
        for child in children.into_iter().rev() {
            stack.push((child, in_run || is_run));
        }
    }
}

/// Group the outermost line elements by page.
///
/// Outermost page-marked elements become pages; without any, the whole
/// document is one page. A line nested inside another line belongs to the
/// outer one. Lines outside every page go to the page preceding them in
/// document order, or to the first page when none precedes them.
fn find_pages(doc: &LayoutDocument) -> Vec<LayoutPage> {
    let mut pages: Vec<LayoutPage> = Vec::new();
    // (pages seen so far, line)
    let mut stray: Vec<(usize, NodeId)> = Vec::new();
    // (node, index of the enclosing page)
    let mut stack: Vec<(NodeId, Option<usize>)> = vec![(doc.root, None)];

    while let Some((id, page)) = stack.pop() {
        let node = doc.node(id);
        let page = match (node.kind, page) {
            (ElementKind::Page, None) => {
                pages.push(LayoutPage {
                    element: id,
                    lines: Vec::new(),
                });
                Some(pages.len() - 1)
            }
            _ => page,
        };
        if node.kind == ElementKind::Line {
            match page {
                Some(i) => pages[i].lines.push(id),
                None => stray.push((pages.len(), id)),
            }
            continue;
        }
        let before = stack.len();
        stack.extend(node.children().map(|child| (child, page)));
        stack[before..].reverse();
    }

    if pages.is_empty() {
        return vec![LayoutPage {
            element: doc.root,
            lines: stray.into_iter().map(|(_, id)| id).collect(),
        }];
    }
    if !stray.is_empty() {
        warn!(
            lines = stray.len(),
            "line elements outside every page element, assigning them to the nearest page"
        );
        let mut leading: Vec<NodeId> = stray
            .iter()
            .filter(|(seen, _)| *seen == 0)
            .map(|(_, id)| *id)
            .collect();
        leading.append(&mut pages[0].lines);
        pages[0].lines = leading;
        for (seen, id) in stray.into_iter().filter(|(seen, _)| *seen > 0) {
            pages[seen - 1].lines.push(id);
        }
    }
    pages
}

fn read_attributes(start: &BytesStart<'_>) -> (Option<GeometryBox>, ClassMarker) {
    let mut geometry = None;
    let mut marker = ClassMarker::None;

    let mut attrs = start.html_attributes();
    attrs.with_checks(false);
    for attr in attrs.flatten() {
        let key = attr.key.local_name();
        let value: Cow<'_, str> = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned().into(),
        };
        if key.as_ref().eq_ignore_ascii_case(b"style") {
            geometry = parse_style_box(&value);
        } else if key.as_ref().eq_ignore_ascii_case(b"class") {
            marker = class_marker(&value);
        }
    }

    (geometry, marker)
}

fn class_marker(class: &str) -> ClassMarker {
    let tokens: Vec<String> = class
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect();
    let has = |marker: &str| tokens.iter().any(|t| marks(t, marker));
    if has("line") {
        ClassMarker::Line
    } else if has("word") {
        ClassMarker::Word
    } else if has("page") {
        ClassMarker::Page
    } else {
        ClassMarker::None
    }
}

/// `line`, `ocr_line` and `text-line` mark a line; `baseline` does not.
fn marks(token: &str, marker: &str) -> bool {
    token == marker
        || token
            .strip_suffix(marker)
            .is_some_and(|prefix| prefix.ends_with('_') || prefix.ends_with('-'))
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn resolve_html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        "ensp" => Some("\u{2002}"),
        "emsp" => Some("\u{2003}"),
        "thinsp" => Some("\u{2009}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "laquo" => Some("\u{ab}"),
        "raquo" => Some("\u{bb}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "deg" => Some("\u{b0}"),
        "euro" => Some("\u{20ac}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(doc: &LayoutDocument, kind: ElementKind) -> Vec<NodeId> {
        (0..doc.nodes.len())
            .map(NodeId)
            .filter(|id| doc.node(*id).kind == kind)
            .collect()
    }

    #[test]
    fn test_class_marker_tokens() {
        assert_eq!(class_marker("ocr_line"), ClassMarker::Line);
        assert_eq!(class_marker("ocrx_word"), ClassMarker::Word);
        assert_eq!(class_marker("Ocr_Page"), ClassMarker::Page);
        assert_eq!(class_marker("bold line"), ClassMarker::Line);
        assert_eq!(class_marker("baseline"), ClassMarker::None);
        assert_eq!(class_marker("password"), ClassMarker::None);
    }

    #[test]
    fn test_parse_class_marked_tree() {
        let markup = r#"<html><body>
          <div class="ocr_page">
            <span class="ocr_line" style="left:10;top:5;width:100;height:12">
              <span class="ocrx_word" style="left:10;top:5;width:40;height:12">Hello</span>
              <span class="ocrx_word">World</span>
            </span>
          </div>
        </body></html>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.convention, Some(MarkupConvention::ClassMarkers));
        assert_eq!(doc.pages.len(), 1);

        let lines = kinds(&doc, ElementKind::Line);
        assert_eq!(lines.len(), 1);
        let line = doc.node(lines[0]);
        assert_eq!(line.geometry, GeometryBox::new(10.0, 5.0, 100.0, 12.0));

        let words = kinds(&doc, ElementKind::Word);
        assert_eq!(words.len(), 2);
        assert!(doc.node(words[0]).geometry.is_some());
        assert!(doc.node(words[1]).geometry.is_none());
        assert_eq!(doc.text_content(words[1]), "World");
    }

    #[test]
    fn test_tolerates_html_quirks() {
        let markup = "<div class=page><p class=\"line\" style='left:1;top:2;width:3;height:4'>a&nbsp;b<br>c &amp; d &bogus;</div></i>";
        let doc = parse_markup(markup).unwrap();
        let lines = kinds(&doc, ElementKind::Line);
        assert_eq!(lines.len(), 1);
        let text = doc.text_content(lines[0]);
        assert!(text.starts_with("a\u{a0}bc"), "{text:?}");
        assert_eq!(kinds(&doc, ElementKind::Page).len(), 1);
    }

    #[test]
    fn test_end_tag_closes_unclosed_children() {
        let markup = r#"<div class="line"><span class="word">a</div><div class="line">b</div>"#;
        let doc = parse_markup(markup).unwrap();
        let lines = kinds(&doc, ElementKind::Line);
        assert_eq!(lines.len(), 2);
        assert_eq!(doc.text_content(lines[0]), "a");
        assert_eq!(doc.text_content(lines[1]), "b");
    }

    #[test]
    fn test_monospace_run_convention() {
        let markup = r#"<body><pre>
          <tt style="left:0;top:10;width:50;height:8">Total   12</tt>
          <tt><span style="left:0;top:20;width:10;height:8">Net</span> <span style="left:12;top:20;width:10;height:8">9</span></tt>
        </pre></body>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.convention, Some(MarkupConvention::MonospaceRuns));
        assert_eq!(kinds(&doc, ElementKind::Line).len(), 2);
        assert_eq!(kinds(&doc, ElementKind::Word).len(), 2);
    }

    #[test]
    fn test_class_markers_take_precedence_over_tt() {
        let markup = r#"<div class="line"><tt>x</tt></div>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.convention, Some(MarkupConvention::ClassMarkers));
        assert_eq!(kinds(&doc, ElementKind::Line).len(), 1);
    }

    #[test]
    fn test_unrecognized_markup_with_text_is_an_error() {
        let err = parse_markup("<div><p>Some text without markers</p></div>").unwrap_err();
        assert!(matches!(err, TablineError::UnrecognizedLayout(_)));
    }

    #[test]
    fn test_markup_without_text_is_empty() {
        let doc = parse_markup("<html><body><div>  </div></body></html>").unwrap();
        assert_eq!(doc.convention, None);
        assert!(doc.pages.is_empty());
    }

    #[test]
    fn test_script_and_style_text_is_ignored() {
        let markup = r#"<html><head><style>.line { color: red }</style></head>
            <body><div class="line" style="left:0;top:0;width:1;height:1">x</div></body></html>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.text_content(doc.root).trim(), "x");
    }

    #[test]
    fn test_multiple_pages() {
        let markup = r#"<div class="page"><div class="line">a</div></div>
            <div class="page"><div class="line">b</div></div>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.text_content(doc.pages[1].element), "b");
        assert_eq!(doc.pages[1].lines.len(), 1);
    }

    #[test]
    fn test_lines_outside_pages_join_nearest_page() {
        let markup = r#"<body>
            <div class="line">before</div>
            <div class="page"><div class="line">first</div></div>
            <div class="line">between</div>
            <div class="page"><div class="line">second</div></div>
            <div class="line">after</div>
        </body>"#;
        let doc = parse_markup(markup).unwrap();
        let texts: Vec<Vec<String>> = doc
            .pages
            .iter()
            .map(|p| p.lines.iter().map(|id| doc.text_content(*id)).collect())
            .collect();
        assert_eq!(
            texts,
            vec![
                vec!["before", "first", "between"],
                vec!["second", "after"],
            ]
        );
    }

    #[test]
    fn test_without_page_markers_root_holds_every_line() {
        let markup = r#"<div class="line">a</div><div><div class="line">b</div></div>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].element, doc.root);
        assert_eq!(doc.pages[0].lines.len(), 2);
    }

    #[test]
    fn test_nested_line_belongs_to_outer_line() {
        let markup = r#"<div class="line">outer <span class="line">inner</span></div>"#;
        let doc = parse_markup(markup).unwrap();
        assert_eq!(kinds(&doc, ElementKind::Line).len(), 2);
        assert_eq!(doc.pages[0].lines.len(), 1);
        assert_eq!(doc.text_content(doc.pages[0].lines[0]), "outer inner");
    }
}
