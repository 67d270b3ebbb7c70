//! Radial monotonicity enforcement.
//!
//! A deblending template should not brighten with distance from its peak.
//! This pass rewrites an image so intensity is non-increasing outward, by
//! "shadow casting": each pixel caps the pixels in a narrow wedge behind it
//! (as seen from the peak) at its own value. Cast naively the wedges widen
//! without bound, so the image is processed in concentric Chebyshev rings
//! in chunks of [`CHUNK`] rings, and the shadow-casting source image is
//! refreshed from the partially capped result only between chunks.

use crate::footprint::Peak;
use crate::image::{Image, ImagePixel};

/// Number of ring layers processed per shadow chunk.
const CHUNK: i32 = 5;

/// Half-width of the shadowed slope wedge.
const SHADOW_HALF_WIDTH: f64 = 0.3;

/// Rewrite `img` so intensity is monotonically non-increasing away from
/// `peak`, along shadow wedges of fixed angular half-extent.
///
/// Only the image plane is touched; callers holding mask and variance
/// planes keep them unchanged. The peak may lie anywhere inside the image;
/// pixels and shadow targets outside the image are skipped.
pub fn make_monotonic(img: &mut Image<ImagePixel>, peak: Peak) {
    let cx = peak.x;
    let cy = peak.y;
    let ix0 = img.x0();
    let iy0 = img.y0();
    let iw = img.width();
    let ih = img.height();

    let mut shadowing = img.clone();

    // Maximum Chebyshev radius from the peak to any image corner.
    let dw = (cx - ix0).max(ix0 + iw - cx);
    let dh = (cy - iy0).max(iy0 + ih - cy);

    let mut s = 0;
    while s < dw.max(dh) {
        for p in 0..CHUNK {
            // Visit the ring of pixels at Chebyshev distance l, walking its
            // 8*l cells in four legs: up the right edge, left along the
            // top, down the left edge, right along the bottom. dx/dy switch
            // every 2*l steps.
            let l = s + p;
            let mut x = l;
            let mut y = -l;
            let mut dx = 0;
            let mut dy = 0;
            for i in 0..(8 * l) {
                if i % (2 * l) == 0 {
                    let leg = i / (2 * l);
                    dx = (leg % 2) * (-1 + 2 * (leg / 2));
                    dy = ((leg + 1) % 2) * (1 - 2 * (leg / 2));
                }
                let px = cx + x;
                let py = cy + y;
                if img.contains(px, py) {
                    let pix = shadowing.get(px, py);
                    if dx == 0 {
                        // Vertical edge of the ring: x is +-l, nonzero. The
                        // wedge covers slopes y/x +- the half-width, cast
                        // outward in x.
                        let ds0 = f64::from(y) / f64::from(x) - SHADOW_HALF_WIDTH;
                        let ds1 = ds0 + 2.0 * SHADOW_HALF_WIDTH;
                        let xsign = if x > 0 { 1 } else { -1 };
                        for shx in 1..=CHUNK {
                            let psx = cx + x + xsign * shx;
                            if psx < ix0 || psx >= ix0 + iw {
                                continue;
                            }
                            let shy0 = (f64::from(shx) * ds0).round() as i32;
                            let shy1 = (f64::from(shx) * ds1).round() as i32;
                            for shy in shy0..=shy1 {
                                let psy = cy + y + xsign * shy;
                                if psy < iy0 || psy >= iy0 + ih {
                                    continue;
                                }
                                let capped = img.get(psx, psy).min(pix);
                                img.set(psx, psy, capped);
                            }
                        }
                    } else {
                        // Horizontal edge: y is +-l; same wedge with the
                        // roles of x and y swapped, cast outward in y.
                        let ds0 = f64::from(x) / f64::from(y) - SHADOW_HALF_WIDTH;
                        let ds1 = ds0 + 2.0 * SHADOW_HALF_WIDTH;
                        let ysign = if y > 0 { 1 } else { -1 };
                        for shy in 1..=CHUNK {
                            let psy = cy + y + ysign * shy;
                            if psy < iy0 || psy >= iy0 + ih {
                                continue;
                            }
                            let shx0 = (f64::from(shy) * ds0).round() as i32;
                            let shx1 = (f64::from(shy) * ds1).round() as i32;
                            for shx in shx0..=shx1 {
                                let psx = cx + x + ysign * shx;
                                if psx < ix0 || psx >= ix0 + iw {
                                    continue;
                                }
                                let capped = img.get(psx, psy).min(pix);
                                img.set(psx, psy, capped);
                            }
                        }
                    }
                }
                x += dx;
                y += dy;
            }
        }
        shadowing.assign(img);
        s += CHUNK;
    }
}
