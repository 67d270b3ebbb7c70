//! Significant flux at template edges.
//!
//! A symmetric template whose boundary still carries real flux was probably
//! clipped, by the image edge or by its parent footprint. These checks let
//! a caller detect that condition and recover the offending pixels.

use crate::footprint::Footprint;
use crate::geom::{Span, SpanSet};
use crate::image::{Image, ImagePixel};

/// True if any boundary pixel of `sfoot` has `img` value at or above
/// `thresh`.
pub fn has_significant_flux_at_edge(
    img: &Image<ImagePixel>,
    sfoot: &Footprint,
    thresh: ImagePixel,
) -> bool {
    let edges = sfoot.spans().find_edge_pixels();
    for sp in &edges {
        for x in sp.x0..=sp.x1 {
            if img.get(x, sp.y) >= thresh {
                return true;
            }
        }
    }
    false
}

/// The boundary pixels of `sfoot` whose `img` value is at or above
/// `thresh`, as a peakless footprint of maximal runs.
///
/// Runs along each boundary row are split wherever the value dips below
/// the threshold.
pub fn get_significant_edge_pixels(
    img: &Image<ImagePixel>,
    sfoot: &Footprint,
    thresh: ImagePixel,
) -> Footprint {
    let edges = sfoot.spans().find_edge_pixels();
    let mut significant: Vec<Span> = Vec::new();
    for sp in &edges {
        let mut run: Option<i32> = None;
        for x in sp.x0..=sp.x1 {
            if img.get(x, sp.y) >= thresh {
                if run.is_none() {
                    run = Some(x);
                }
            } else if let Some(start) = run.take() {
                significant.push(Span::new(sp.y, start, x - 1));
            }
        }
        if let Some(start) = run {
            significant.push(Span::new(sp.y, start, sp.x1));
        }
    }
    Footprint::from_spans(SpanSet::from_spans(significant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn solid_square() -> Footprint {
        Footprint::from_spans(SpanSet::from_spans(
            (0..5).map(|y| Span::new(y, 0, 4)).collect(),
        ))
    }

    #[test]
    fn interior_flux_is_not_significant() {
        let foot = solid_square();
        let mut img = Image::<f32>::new(BBox::from_corners(0, 0, 4, 4));
        img.set(2, 2, 50.0);
        assert!(!has_significant_flux_at_edge(&img, &foot, 10.0));
        assert!(get_significant_edge_pixels(&img, &foot, 10.0)
            .spans()
            .is_empty());
    }

    #[test]
    fn boundary_flux_is_detected() {
        let foot = solid_square();
        let mut img = Image::<f32>::new(BBox::from_corners(0, 0, 4, 4));
        img.set(0, 2, 10.0);
        assert!(has_significant_flux_at_edge(&img, &foot, 10.0));
        assert!(!has_significant_flux_at_edge(&img, &foot, 10.5));
    }

    #[test]
    fn runs_split_where_flux_dips() {
        let foot = solid_square();
        // bottom row: hot, hot, cold, hot, hot
        let mut img = Image::<f32>::new(BBox::from_corners(0, 0, 4, 4));
        for x in [0, 1, 3, 4] {
            img.set(x, 0, 20.0);
        }
        let got = get_significant_edge_pixels(&img, &foot, 10.0);
        assert_eq!(
            got.spans().as_slice(),
            &[Span::new(0, 0, 1), Span::new(0, 3, 4)]
        );
    }

    #[test]
    fn whole_hot_boundary_row_is_one_run() {
        let foot = solid_square();
        let mut img = Image::<f32>::new(BBox::from_corners(0, 0, 4, 4));
        for x in 0..5 {
            img.set(x, 4, 30.0);
        }
        let got = get_significant_edge_pixels(&img, &foot, 10.0);
        assert_eq!(got.spans().as_slice(), &[Span::new(4, 0, 4)]);
    }
}
