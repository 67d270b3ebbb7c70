//! Sorted, non-overlapping collections of spans.
//!
//! A `SpanSet` is the sparse representation of an irregular pixel region:
//! one run per row segment, sorted lexicographically, with overlapping or
//! touching runs in the same row merged. All deblender routines that emit
//! spans out of order (symmetrization emits two per overlap, stray-flux
//! accumulation emits single-pixel runs) hand their buffers to
//! [`SpanSet::from_spans`], which normalizes.

use super::{BBox, Span};
use crate::image::Image;

/// A sorted, non-overlapping set of horizontal pixel runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
    spans: Vec<Span>,
}

impl SpanSet {
    /// Create an empty span set.
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Build a normalized span set from spans in any order.
    ///
    /// Sorts the input, drops degenerate spans (`x1 < x0`), and merges
    /// overlapping or adjacent runs within each row, so the result always
    /// satisfies the sorted/non-overlapping invariant.
    pub fn from_spans(mut spans: Vec<Span>) -> Self {
        spans.retain(|sp| sp.x0 <= sp.x1);
        spans.sort_unstable();
        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for sp in spans {
            if let Some(last) = merged.last_mut() {
                if last.y == sp.y && sp.x0 <= last.x1 + 1 {
                    last.x1 = last.x1.max(sp.x1);
                    continue;
                }
            }
            merged.push(sp);
        }
        Self { spans: merged }
    }

    /// Iterate spans in lexicographic order.
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// The spans as a slice, in lexicographic order.
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True if the set contains no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total number of pixels covered.
    pub fn area(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }

    /// Smallest box containing every span; empty for an empty set.
    pub fn bbox(&self) -> BBox {
        let mut bb = BBox::new();
        for sp in &self.spans {
            bb.include(sp.x0, sp.y);
            bb.include(sp.x1, sp.y);
        }
        bb
    }

    /// True if the pixel (x, y) is covered by some span.
    ///
    /// Binary search over the sorted spans.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let idx = self.spans.partition_point(|sp| (sp.y, sp.x0) <= (y, x));
        idx > 0 && self.spans[idx - 1].contains(x, y)
    }

    /// Stamp `value` onto every covered pixel of `img`.
    ///
    /// Pixels outside the image bounds are skipped.
    pub fn set_image<T: Copy>(&self, img: &mut Image<T>, value: T) {
        for sp in &self.spans {
            for x in sp.x0..=sp.x1 {
                if img.contains(x, sp.y) {
                    img.set(x, sp.y, value);
                }
            }
        }
    }

    /// Copy `src` pixels into `dst` over this span set.
    ///
    /// Only pixels inside both images are copied.
    pub fn copy_image<T: Copy>(&self, src: &Image<T>, dst: &mut Image<T>) {
        for sp in &self.spans {
            for x in sp.x0..=sp.x1 {
                if src.contains(x, sp.y) && dst.contains(x, sp.y) {
                    dst.set(x, sp.y, src.get(x, sp.y));
                }
            }
        }
    }

    /// The boundary pixels of the region, as a new span set.
    ///
    /// A pixel is on the boundary when at least one of its four edge
    /// neighbors is outside the region. Because runs are coalesced, the
    /// endpoints of every run qualify; interior run pixels qualify when the
    /// pixel above or below is uncovered.
    pub fn find_edge_pixels(&self) -> SpanSet {
        let mut edges: Vec<Span> = Vec::new();
        for sp in &self.spans {
            let mut run: Option<i32> = None;
            for x in sp.x0..=sp.x1 {
                let boundary = x == sp.x0
                    || x == sp.x1
                    || !self.contains(x, sp.y - 1)
                    || !self.contains(x, sp.y + 1);
                if boundary {
                    if run.is_none() {
                        run = Some(x);
                    }
                } else if let Some(start) = run.take() {
                    edges.push(Span::new(sp.y, start, x - 1));
                }
            }
            if let Some(start) = run {
                edges.push(Span::new(sp.y, start, sp.x1));
            }
        }
        SpanSet::from_spans(edges)
    }
}

impl<'a> IntoIterator for &'a SpanSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_spans_sorts_and_coalesces() {
        let ss = SpanSet::from_spans(vec![
            Span::new(1, 5, 6),
            Span::new(0, 0, 2),
            Span::new(1, 3, 5),
            Span::new(1, 7, 7),
            Span::new(0, 4, 4),
        ]);
        // row 1: [3,5] overlaps [5,6], and [7,7] is adjacent to the merge
        assert_eq!(
            ss.as_slice(),
            &[Span::new(0, 0, 2), Span::new(0, 4, 4), Span::new(1, 3, 7)]
        );
        assert_eq!(ss.area(), 9);
    }

    #[test]
    fn from_spans_drops_degenerate() {
        let ss = SpanSet::from_spans(vec![Span::new(0, 3, 1), Span::new(0, 0, 0)]);
        assert_eq!(ss.as_slice(), &[Span::new(0, 0, 0)]);
    }

    #[test]
    fn contains_uses_binary_search() {
        let ss = SpanSet::from_spans(vec![
            Span::new(0, 0, 2),
            Span::new(0, 5, 6),
            Span::new(2, 1, 1),
        ]);
        assert!(ss.contains(0, 0));
        assert!(ss.contains(2, 0));
        assert!(!ss.contains(3, 0));
        assert!(!ss.contains(4, 0));
        assert!(ss.contains(5, 0));
        assert!(ss.contains(1, 2));
        assert!(!ss.contains(1, 1));
        assert!(!ss.contains(-1, 0));
    }

    #[test]
    fn bbox_spans_all_rows() {
        let ss = SpanSet::from_spans(vec![Span::new(-2, -3, 0), Span::new(4, 2, 7)]);
        assert_eq!(ss.bbox(), BBox::from_corners(-3, -2, 7, 4));
        assert_eq!(SpanSet::new().bbox(), BBox::new());
    }

    #[test]
    fn edge_pixels_of_solid_square() {
        // 4x4 solid square: edge is the one-pixel border.
        let ss = SpanSet::from_spans((0..4).map(|y| Span::new(y, 0, 3)).collect());
        let edges = ss.find_edge_pixels();
        assert_eq!(
            edges.as_slice(),
            &[
                Span::new(0, 0, 3),
                Span::new(1, 0, 0),
                Span::new(1, 3, 3),
                Span::new(2, 0, 0),
                Span::new(2, 3, 3),
                Span::new(3, 0, 3),
            ]
        );
    }

    #[test]
    fn edge_pixels_of_thin_shapes() {
        // A single row is all edge.
        let row = SpanSet::from_spans(vec![Span::new(0, 0, 5)]);
        assert_eq!(row.find_edge_pixels().as_slice(), row.as_slice());

        // A plus shape: only the center pixel has all four neighbors.
        let plus = SpanSet::from_spans(vec![
            Span::new(0, 1, 1),
            Span::new(1, 0, 2),
            Span::new(2, 1, 1),
        ]);
        assert_eq!(
            plus.find_edge_pixels().as_slice(),
            &[
                Span::new(0, 1, 1),
                Span::new(1, 0, 0),
                Span::new(1, 2, 2),
                Span::new(2, 1, 1),
            ]
        );
    }

    #[test]
    fn stamp_and_copy_clip_to_image() {
        let ss = SpanSet::from_spans(vec![Span::new(0, -2, 2), Span::new(1, 0, 1)]);
        let mut img = Image::<u16>::new(BBox::from_corners(0, 0, 3, 3));
        ss.set_image(&mut img, 7);
        assert_eq!(img.get(0, 0), 7);
        assert_eq!(img.get(2, 0), 7);
        assert_eq!(img.get(3, 0), 0);
        assert_eq!(img.get(1, 1), 7);

        let mut dst = Image::<u16>::new(BBox::from_corners(0, 0, 1, 1));
        ss.copy_image(&img, &mut dst);
        assert_eq!(dst.get(0, 0), 7);
        assert_eq!(dst.get(1, 1), 7);
        assert_eq!(dst.get(1, 0), 7);
        assert_eq!(dst.get(0, 1), 7);
    }
}
