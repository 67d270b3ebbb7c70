//! Square-window median filtering.
//!
//! Used to build smooth background estimates under a parent footprint. The
//! filter computes the lower median of a `(2*halfsize + 1)^2` box around
//! each interior pixel; pixels too close to an edge for a full window are
//! copied through unchanged.

use crate::image::{Image, ImagePixel};

/// Run a square-window median filter from `input` into `output`.
///
/// For every pixel at least `halfsize` away from all four edges, the output
/// is the median of the surrounding `(2*halfsize + 1)^2` window (the window
/// size is odd, so the median is exact). All other pixels are copied from
/// `input`. Selection uses a scratch buffer per pixel; correctness over
/// speed.
///
/// # Arguments
/// * `input` - source image
/// * `output` - destination image; must have the same bounding box
/// * `halfsize` - half the window width
///
/// Panics if the two images have different bounding boxes.
pub fn median_filter(input: &Image<ImagePixel>, output: &mut Image<ImagePixel>, halfsize: usize) {
    assert_eq!(
        input.bbox(),
        output.bbox(),
        "median filter input and output must share a bbox"
    );

    let h = input.height() as usize;
    let w = input.width() as usize;
    let s = 2 * halfsize + 1;
    let ss = s * s;

    let src = input.array();
    let dst = output.array_mut();

    let mut vals = vec![0.0f32; ss];
    for row in halfsize..h.saturating_sub(halfsize) {
        for col in halfsize..w.saturating_sub(halfsize) {
            let mut k = 0;
            for dy in 0..s {
                for dx in 0..s {
                    vals[k] = src[[row + dy - halfsize, col + dx - halfsize]];
                    k += 1;
                }
            }
            let (_, median, _) = vals.select_nth_unstable_by(ss / 2, f32::total_cmp);
            dst[[row, col]] = *median;
        }
    }

    // Margins: anything without a full window is passed through.
    for row in 0..h {
        for col in 0..w {
            if row < halfsize || row + halfsize >= h || col < halfsize || col + halfsize >= w {
                dst[[row, col]] = src[[row, col]];
            }
        }
    }
}
