use regex::Regex;
use std::sync::LazyLock;

use crate::geometry::GeometryBox;

/// `key : value` pairs inside a free-form style string. Keys may contain
/// hyphens so `margin-left:3` is read as one key, not as `left`.
static STYLE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z][A-Za-z0-9_-]*)\s*:\s*([^;\s]+)").unwrap());

/// Parse `left`, `top`, `width` and `height` out of a style attribute.
///
/// Keys are matched case-insensitively, pairs may be separated by any mix
/// of `;` and whitespace, and unrelated keys are ignored. A repeated key
/// keeps its last value. Returns `None` unless all four are present and
/// numeric; a partially described box is no box.
pub fn parse_style_box(style: &str) -> Option<GeometryBox> {
    let mut left = None;
    let mut top = None;
    let mut width = None;
    let mut height = None;

    for caps in STYLE_PAIR.captures_iter(style) {
        let key = caps[1].to_ascii_lowercase();
        let slot = match key.as_str() {
            "left" => &mut left,
            "top" => &mut top,
            "width" => &mut width,
            "height" => &mut height,
            _ => continue,
        };
        *slot = Some(parse_length(&caps[2]));
    }

    // A present-but-garbage value poisons the box just like a missing one.
    GeometryBox::new(left??, top??, width??, height??)
}

/// Numeric value with an optional alphabetic unit suffix (`12`, `12.5px`, `-3pt`).
fn parse_length(raw: &str) -> Option<f64> {
    let number = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if number.is_empty() {
        return None;
    }
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}
