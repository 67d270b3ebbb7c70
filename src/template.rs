//! Symmetric template construction.
//!
//! A child's template is built from the parent image by assuming the child
//! is two-fold rotationally symmetric about its peak: each template pixel
//! takes the minimum of the observed value and the observed value at its
//! 180-degree mirror. Where the mirror falls off the parent footprint
//! because the detector edge clipped it, the template can optionally be
//! patched with the one-sided observed values instead.

use log::debug;

use crate::error::DeblendError;
use crate::footprint::{Footprint, Peak};
use crate::geom::{Span, SpanSet};
use crate::image::{Image, ImagePixel, MaskedImage, EDGE};
use crate::symmetrize::symmetrize_footprint;

/// A per-peak symmetric template: image, footprint, and whether detector
/// edges were patched into it.
#[derive(Debug, Clone)]
pub struct SymmetricTemplate {
    /// Template pixel values over the template footprint's bounding box.
    pub image: Image<ImagePixel>,
    /// The symmetrized (and possibly edge-patched) footprint.
    pub footprint: Footprint,
    /// True if edge patching ran and observed values were copied in.
    pub patched_edges: bool,
}

/// Build the symmetric template for one peak.
///
/// Symmetrizes `foot` about the peak, then fills an image over the result
/// where each pixel and its mirror both hold the minimum of the two
/// observed values, clamped at zero when `min_zero` is set. When
/// `patch_edge` is set and the symmetric footprint touches pixels carrying
/// the EDGE mask bit, spans of the original footprint whose mirrors fall
/// outside the footprint's bounding box are appended with their observed
/// values, growing the template.
///
/// Returns `Ok(None)` when the peak lies outside the footprint (the
/// recoverable failure of symmetrization). Mask and variance planes are
/// not propagated into the template.
///
/// # Arguments
/// * `img` - parent masked image; must cover the footprint
/// * `foot` - parent footprint
/// * `peak` - peak to symmetrize about
/// * `sigma1` - per-pixel noise level; reserved, does not affect output
/// * `min_zero` - clamp template pixels at zero
/// * `patch_edge` - patch in observed values where the mirror is clipped
pub fn build_symmetric_template(
    img: &MaskedImage,
    foot: &Footprint,
    peak: Peak,
    sigma1: f32,
    min_zero: bool,
    patch_edge: bool,
) -> Result<Option<SymmetricTemplate>, DeblendError> {
    let _ = sigma1;
    let cx = peak.x;
    let cy = peak.y;

    if !img.bbox().contains(&foot.bbox()) {
        return Err(DeblendError::FootprintOutsideImage);
    }

    let Some(mut sfoot) = symmetrize_footprint(foot, cx, cy) else {
        return Ok(None);
    };

    if !img.bbox().contains(&sfoot.bbox()) {
        return Err(DeblendError::SymmetrizedFootprintOutsideImage);
    }

    // Does the symmetric footprint sit on detector-edge pixels?
    let mut touches_edge = false;
    if patch_edge {
        let mask = img.mask();
        'scan: for sp in sfoot.spans() {
            for x in sp.x0..=sp.x1 {
                if mask.get(x, sp.y) & EDGE != 0 {
                    touches_edge = true;
                    break 'scan;
                }
            }
        }
    }

    let image = img.image();
    let mut timg = Image::<ImagePixel>::new(sfoot.bbox());

    // The symmetric footprint pairs each span with its mirror, so walking
    // the sorted span list from both ends visits mirror pixels together.
    let spans = sfoot.spans().as_slice();
    let mut i = 0;
    let mut j = spans.len();
    while i < j {
        let f = spans[i];
        let b = spans[j - 1];
        let mut bx = b.x1;
        for fx in f.x0..=f.x1 {
            let mut pix = image.get(fx, f.y).min(image.get(bx, b.y));
            if min_zero {
                pix = pix.max(0.0);
            }
            timg.set(fx, f.y, pix);
            timg.set(bx, b.y, pix);
            bx -= 1;
        }
        i += 1;
        j -= 1;
    }

    if touches_edge {
        patch_clipped_edges(img, foot, &mut sfoot, &mut timg, cx, cy);
    }

    Ok(Some(SymmetricTemplate {
        image: timg,
        footprint: sfoot,
        patched_edges: touches_edge,
    }))
}

/// Grow the symmetric footprint over spans whose mirrors fall outside the
/// original footprint's bounding box and copy the observed values in.
fn patch_clipped_edges(
    img: &MaskedImage,
    foot: &Footprint,
    sfoot: &mut Footprint,
    timg: &mut Image<ImagePixel>,
    cx: i32,
    cy: i32,
) {
    let mut bb = sfoot.bbox();
    // Inclusion is tested against the footprint's box, not the image's: the
    // footprint may stop short of the detector edge.
    let imbb = foot.bbox();

    for sp in foot.spans() {
        let ym = cy + (cy - sp.y);
        if !imbb.contains_point(cx + (cx - sp.x0), ym) {
            bb.include(sp.x0, sp.y);
        }
        if !imbb.contains_point(cx + (cx - sp.x1), ym) {
            bb.include(sp.x1, sp.y);
        }
    }
    debug!(
        "edge patch: bbox grown to x=[{}, {}] y=[{}, {}]",
        bb.min_x(),
        bb.max_x(),
        bb.min_y(),
        bb.max_y()
    );

    let mut patched = Image::<ImagePixel>::new(bb);
    sfoot.spans().copy_image(timg, &mut patched);

    let image = img.image();
    let mut new_spans: Vec<Span> = sfoot.spans().as_slice().to_vec();
    for sp in foot.spans() {
        let ym = cy + (cy - sp.y);
        let in0 = imbb.contains_point(cx + (cx - sp.x0), ym);
        let in1 = imbb.contains_point(cx + (cx - sp.x1), ym);
        if in0 && in1 {
            continue;
        }
        // Keep only the part of the span whose mirror is out of bounds.
        let mut x0 = sp.x0;
        let mut x1 = sp.x1;
        if in0 {
            // First column whose mirror falls outside on the low side.
            x0 = cx + (cx - (imbb.min_x() - 1));
        }
        if in1 {
            x1 = cx + (cx - (imbb.max_x() + 1));
        }
        debug!(
            "edge patch: span y={} x=[{}, {}] clipped to [{x0}, {x1}]",
            sp.y, sp.x0, sp.x1
        );
        for x in x0..=x1 {
            if patched.contains(x, sp.y) && image.contains(x, sp.y) {
                patched.set(x, sp.y, image.get(x, sp.y));
            }
        }
        new_spans.push(Span::new(sp.y, x0, x1));
    }

    sfoot.set_spans(SpanSet::from_spans(new_spans));
    *timg = patched;
}
