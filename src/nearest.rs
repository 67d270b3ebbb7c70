//! Manhattan distance transform with nearest-footprint labels.
//!
//! Stray flux can be routed to whichever child footprint is closest in L1
//! distance. This module computes, over a target box, both that distance and
//! the index of the footprint achieving it, with a classic two-pass chamfer
//! sweep of unit weight.

use crate::footprint::Footprint;
use crate::geom::BBox;
use crate::image::Image;

/// Label value for pixels with no reachable footprint.
pub const NO_FOOTPRINT: u16 = 0xffff;

/// Compute nearest-footprint labels and L1 distances over `bbox`.
///
/// Every footprint pixel gets distance 0 and its footprint's index; every
/// other pixel gets the minimum Manhattan distance to any footprint pixel
/// and the index of a footprint achieving it. Ties go to the lower index,
/// a consequence of relaxing with strict `<` in a fixed forward-then-
/// backward sweep. Empty footprints contribute nothing; if no footprint
/// covers any pixel, labels are [`NO_FOOTPRINT`] everywhere and distances
/// saturate at width + height.
///
/// # Arguments
/// * `foots` - footprints, in the index order labels refer to
/// * `bbox` - region to compute over
///
/// # Returns
/// `(label, dist)` images covering `bbox`.
pub fn nearest_footprint(foots: &[Footprint], bbox: BBox) -> (Image<u16>, Image<u16>) {
    let mut label = Image::<u16>::new(bbox);
    let mut dist = Image::<u16>::new(bbox);

    // Stamp footprint pixels with their index and a provisional distance of
    // 1; the forward sweep turns that 1 into the true distance 0.
    for (i, foot) in foots.iter().enumerate() {
        foot.spans().set_image(&mut label, i as u16);
        foot.spans().set_image(&mut dist, 1);
    }

    let h = bbox.height() as usize;
    let w = bbox.width() as usize;
    let far = (bbox.width() + bbox.height()).min(i32::from(u16::MAX)) as u16;

    let d = dist.array_mut();
    let l = label.array_mut();

    // Forward sweep, bottom-left to top-right: relax from the south and
    // west neighbors.
    for row in 0..h {
        for col in 0..w {
            if d[[row, col]] == 1 {
                d[[row, col]] = 0;
            } else {
                d[[row, col]] = far;
                l[[row, col]] = NO_FOOTPRINT;
                if row > 0 {
                    let nd = d[[row - 1, col]].saturating_add(1);
                    if nd < d[[row, col]] {
                        d[[row, col]] = nd;
                        l[[row, col]] = l[[row - 1, col]];
                    }
                }
                if col > 0 {
                    let nd = d[[row, col - 1]].saturating_add(1);
                    if nd < d[[row, col]] {
                        d[[row, col]] = nd;
                        l[[row, col]] = l[[row, col - 1]];
                    }
                }
            }
        }
    }

    // Backward sweep, top-right to bottom-left: relax from the north and
    // east neighbors.
    for row in (0..h).rev() {
        for col in (0..w).rev() {
            if row + 1 < h {
                let nd = d[[row + 1, col]].saturating_add(1);
                if nd < d[[row, col]] {
                    d[[row, col]] = nd;
                    l[[row, col]] = l[[row + 1, col]];
                }
            }
            if col + 1 < w {
                let nd = d[[row, col + 1]].saturating_add(1);
                if nd < d[[row, col]] {
                    d[[row, col]] = nd;
                    l[[row, col]] = l[[row, col + 1]];
                }
            }
        }
    }

    (label, dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Span, SpanSet};

    fn single_pixel(x: i32, y: i32) -> Footprint {
        Footprint::from_spans(SpanSet::from_spans(vec![Span::new(y, x, x)]))
    }

    #[test]
    fn two_pixels_on_a_row() {
        let foots = vec![single_pixel(0, 0), single_pixel(4, 0)];
        let bbox = BBox::from_corners(0, 0, 4, 0);
        let (label, dist) = nearest_footprint(&foots, bbox);

        let want_dist = [0u16, 1, 2, 1, 0];
        let want_label = [0u16, 0, 0, 1, 1];
        for x in 0..5 {
            assert_eq!(dist.get(x, 0), want_dist[x as usize], "dist at x={x}");
            assert_eq!(label.get(x, 0), want_label[x as usize], "label at x={x}");
        }
    }

    #[test]
    fn distances_are_manhattan() {
        let foots = vec![single_pixel(1, 1)];
        let (label, dist) = nearest_footprint(&foots, BBox::from_corners(0, 0, 3, 3));
        for y in 0..4 {
            for x in 0..4 {
                let want = ((x - 1i32).abs() + (y - 1i32).abs()) as u16;
                assert_eq!(dist.get(x, y), want, "dist at ({x},{y})");
                assert_eq!(label.get(x, y), 0);
            }
        }
    }

    #[test]
    fn empty_footprints_contribute_nothing() {
        let foots = vec![
            Footprint::from_spans(SpanSet::new()),
            single_pixel(2, 0),
        ];
        let (label, dist) = nearest_footprint(&foots, BBox::from_corners(0, 0, 4, 0));
        assert_eq!(label.get(0, 0), 1);
        assert_eq!(dist.get(0, 0), 2);
        assert_eq!(label.get(2, 0), 1);
        assert_eq!(dist.get(2, 0), 0);
    }

    #[test]
    fn all_empty_saturates() {
        let foots = vec![Footprint::from_spans(SpanSet::new())];
        let (label, dist) = nearest_footprint(&foots, BBox::from_corners(0, 0, 2, 1));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(label.get(x, y), NO_FOOTPRINT);
                assert_eq!(dist.get(x, y), 5); // width + height
            }
        }
    }

    #[test]
    fn offset_bbox_uses_parent_coordinates() {
        let foots = vec![single_pixel(10, 20)];
        let (label, dist) = nearest_footprint(&foots, BBox::from_corners(8, 19, 12, 21));
        assert_eq!(dist.get(10, 20), 0);
        assert_eq!(dist.get(8, 19), 3);
        assert_eq!(label.get(12, 21), 0);
    }
}
