use serde::{Deserialize, Serialize};

/// Axis-aligned box in page units, origin at the top-left corner.
///
/// A box only exists when all four fields are known, finite, and the
/// extents are non-negative. Use [`GeometryBox::new`] to build one; there
/// is no zero-filled default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl GeometryBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Option<Self> {
        let finite = left.is_finite() && top.is_finite() && width.is_finite() && height.is_finite();
        if !finite || width < 0.0 || height < 0.0 {
            return None;
        }
        Some(GeometryBox {
            left,
            top,
            width,
            height,
        })
    }

    /// Build a box from its four edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Option<Self> {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &GeometryBox) -> GeometryBox {
        GeometryBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            width: self.right().max(other.right()) - self.left.min(other.left),
            height: self.bottom().max(other.bottom()) - self.top.min(other.top),
        }
    }

    /// True when `other` lies entirely inside `self` (edges may touch).
    pub fn contains(&self, other: &GeometryBox) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest box enclosing every box in `boxes`, or `None` if there are none.
    pub fn enclosing<I>(boxes: I) -> Option<GeometryBox>
    where
        I: IntoIterator<Item = GeometryBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        let (left, top, right, bottom) = iter.fold(
            (first.left, first.top, first.right(), first.bottom()),
            |(l, t, r, b), bx| {
                (
                    l.min(bx.left),
                    t.min(bx.top),
                    r.max(bx.right()),
                    b.max(bx.bottom()),
                )
            },
        );
        GeometryBox::from_edges(left, top, right, bottom)
    }
}
