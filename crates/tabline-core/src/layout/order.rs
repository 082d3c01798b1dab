use std::cmp::Ordering;

use crate::layout::TextLine;

/// Reading order: top to bottom, then left to right.
///
/// Exact numeric comparison, no line-height bucketing. Lines with equal
/// `top` and `left` keep their input order.
pub fn order_lines(mut lines: Vec<TextLine>) -> Vec<TextLine> {
    lines.sort_by(compare_reading_order);
    lines
}

pub fn compare_reading_order(a: &TextLine, b: &TextLine) -> Ordering {
    // Boxes are always finite, so partial_cmp never fails.
    let cmp = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    cmp(a.bbox.top, b.bbox.top).then_with(|| cmp(a.bbox.left, b.bbox.left))
}
