//! Footprints: sparse detections with their peaks and, optionally, pixels.
//!
//! A footprint pairs the span set of an above-threshold region with the
//! peaks detected inside it. A heavy footprint additionally stores the
//! region's image, mask and variance values densely, in span-iteration
//! order, so a child source can be carried around without its parent image.

use crate::geom::{BBox, SpanSet};
use crate::image::{ImagePixel, MaskPixel, MaskedImage, VariancePixel};

/// A detected local maximum at integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// Parent x coordinate.
    pub x: i32,
    /// Parent y coordinate.
    pub y: i32,
}

impl Peak {
    /// Create a peak at parent coordinates (x, y).
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An irregular pixel region plus the peaks detected inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footprint {
    spans: SpanSet,
    peaks: Vec<Peak>,
}

impl Footprint {
    /// Create a footprint from a span set and its peaks.
    pub fn new(spans: SpanSet, peaks: Vec<Peak>) -> Self {
        Self { spans, peaks }
    }

    /// Create a peakless footprint from a span set.
    pub fn from_spans(spans: SpanSet) -> Self {
        Self {
            spans,
            peaks: Vec::new(),
        }
    }

    /// The region covered by this footprint.
    pub fn spans(&self) -> &SpanSet {
        &self.spans
    }

    /// Replace the region, keeping the peaks.
    pub fn set_spans(&mut self, spans: SpanSet) {
        self.spans = spans;
    }

    /// The peaks detected inside the region.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Bounding box of the region.
    pub fn bbox(&self) -> BBox {
        self.spans.bbox()
    }

    /// Number of pixels in the region.
    pub fn area(&self) -> usize {
        self.spans.area()
    }

    /// True if the pixel (x, y) belongs to the region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.spans.contains(x, y)
    }
}

/// A footprint with densely stored per-pixel values.
///
/// The three arrays run parallel to each other in the span set's
/// lexicographic iteration order: rows ascending, columns left to right
/// within each row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeavyFootprint {
    footprint: Footprint,
    image: Vec<ImagePixel>,
    mask: Vec<MaskPixel>,
    variance: Vec<VariancePixel>,
}

impl HeavyFootprint {
    /// Assemble a heavy footprint from parallel pixel arrays.
    ///
    /// The arrays must already be in span-iteration order. Panics unless
    /// all three arrays have exactly `footprint.area()` elements.
    pub fn from_parts(
        footprint: Footprint,
        image: Vec<ImagePixel>,
        mask: Vec<MaskPixel>,
        variance: Vec<VariancePixel>,
    ) -> Self {
        let area = footprint.area();
        assert_eq!(image.len(), area, "image array length != footprint area");
        assert_eq!(mask.len(), area, "mask array length != footprint area");
        assert_eq!(variance.len(), area, "variance array length != footprint area");
        Self {
            footprint,
            image,
            mask,
            variance,
        }
    }

    /// Read a footprint's pixels out of a masked image.
    ///
    /// Panics if the source does not cover the footprint.
    pub fn extract(footprint: Footprint, src: &MaskedImage) -> Self {
        let area = footprint.area();
        let mut image = Vec::with_capacity(area);
        let mut mask = Vec::with_capacity(area);
        let mut variance = Vec::with_capacity(area);
        for sp in footprint.spans() {
            for x in sp.x0..=sp.x1 {
                image.push(src.image().get(x, sp.y));
                mask.push(src.mask().get(x, sp.y));
                variance.push(src.variance().get(x, sp.y));
            }
        }
        Self {
            footprint,
            image,
            mask,
            variance,
        }
    }

    /// Write the stored pixels back into a masked image.
    ///
    /// Pixels outside `dst` are skipped.
    pub fn insert_into(&self, dst: &mut MaskedImage) {
        let mut i = 0;
        for sp in self.footprint.spans() {
            for x in sp.x0..=sp.x1 {
                if dst.bbox().contains_point(x, sp.y) {
                    dst.image_mut().set(x, sp.y, self.image[i]);
                    dst.mask_mut().set(x, sp.y, self.mask[i]);
                    dst.variance_mut().set(x, sp.y, self.variance[i]);
                }
                i += 1;
            }
        }
    }

    /// The underlying footprint.
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Number of stored pixels.
    pub fn area(&self) -> usize {
        self.image.len()
    }

    /// Image values in span-iteration order.
    pub fn image(&self) -> &[ImagePixel] {
        &self.image
    }

    /// Mask values in span-iteration order.
    pub fn mask(&self) -> &[MaskPixel] {
        &self.mask
    }

    /// Variance values in span-iteration order.
    pub fn variance(&self) -> &[VariancePixel] {
        &self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Span;
    use crate::image::Image;

    fn l_shape() -> Footprint {
        Footprint::from_spans(SpanSet::from_spans(vec![
            Span::new(0, 0, 2),
            Span::new(1, 0, 0),
            Span::new(2, 0, 0),
        ]))
    }

    #[test]
    fn footprint_queries() {
        let foot = l_shape();
        assert_eq!(foot.area(), 5);
        assert_eq!(foot.bbox(), BBox::from_corners(0, 0, 2, 2));
        assert!(foot.contains(2, 0));
        assert!(!foot.contains(1, 1));
    }

    #[test]
    fn extract_orders_pixels_lexicographically() {
        let foot = l_shape();
        let mut mi = MaskedImage::new(BBox::from_corners(0, 0, 2, 2));
        *mi.image_mut() = Image::from_fn(mi.bbox(), |x, y| (10 * y + x) as f32);
        let heavy = HeavyFootprint::extract(foot, &mi);
        assert_eq!(heavy.area(), 5);
        assert_eq!(heavy.image(), &[0.0, 1.0, 2.0, 10.0, 20.0]);
    }

    #[test]
    fn insert_restores_extracted_pixels() {
        let foot = l_shape();
        let bb = BBox::from_corners(0, 0, 2, 2);
        let mut src = MaskedImage::new(bb);
        *src.image_mut() = Image::from_fn(bb, |x, y| (x + 3 * y) as f32 + 0.5);
        src.mask_mut().set(0, 2, 4);
        let heavy = HeavyFootprint::extract(foot.clone(), &src);

        let mut dst = MaskedImage::new(bb);
        heavy.insert_into(&mut dst);
        for sp in foot.spans() {
            for x in sp.x0..=sp.x1 {
                assert_eq!(dst.image().get(x, sp.y), src.image().get(x, sp.y));
                assert_eq!(dst.mask().get(x, sp.y), src.mask().get(x, sp.y));
            }
        }
        // pixels off the footprint stay zero
        assert_eq!(dst.image().get(1, 1), 0.0);
    }

    #[test]
    #[should_panic(expected = "image array length")]
    fn from_parts_rejects_short_arrays() {
        HeavyFootprint::from_parts(l_shape(), vec![0.0; 3], vec![0; 3], vec![0.0; 3]);
    }
}
