//! Flux apportionment among child templates.
//!
//! Once every peak has a template, the parent's observed flux is split
//! pixel by pixel in proportion to the template heights. Parent pixels with
//! positive flux that no template claims are "stray flux"; they can be
//! distributed to the children under several distance policies, clipped,
//! renormalized, and returned as sparse heavy footprints.

use crate::error::DeblendError;
use crate::footprint::{Footprint, HeavyFootprint};
use crate::geom::{Span, SpanSet};
use crate::image::{Image, ImagePixel, MaskPixel, MaskedImage, VariancePixel};
use crate::nearest::{nearest_footprint, NO_FOOTPRINT};

/// Assign stray flux (parent flux claimed by no template) to the children.
pub const ASSIGN_STRAYFLUX: u32 = 0x1;

/// Give stray flux to point sources only when no extended source takes any.
pub const STRAYFLUX_TO_POINT_SOURCES_WHEN_NECESSARY: u32 = 0x2;

/// Always include point sources in the stray flux split.
pub const STRAYFLUX_TO_POINT_SOURCES_ALWAYS: u32 = 0x4;

/// Weight stray flux by 1/(1+r^2) of the distance to each template
/// footprint rather than to each peak.
pub const STRAYFLUX_R_TO_FOOTPRINT: u32 = 0x8;

/// Give each stray pixel entirely to the footprint nearest in Manhattan
/// distance.
pub const STRAYFLUX_NEAREST_FOOTPRINT: u32 = 0x10;

/// Reserved bit; accepted and ignored.
pub const STRAYFLUX_TRIM: u32 = 0x20;

/// The result of apportioning a parent's flux.
#[derive(Debug, Clone)]
pub struct FluxPortions {
    /// Per-template masked images holding each child's share of the
    /// observed flux, over each template's bounding box.
    pub portions: Vec<MaskedImage>,
    /// Per-template stray flux, where any was assigned; empty when stray
    /// flux was not requested.
    pub strays: Vec<Option<HeavyFootprint>>,
    /// The sum of positive template values used for the split.
    pub template_sum: Image<ImagePixel>,
}

/// Accumulate `max(0, template)` into `tsum` for every template.
///
/// Each template's bounding box is clipped to `tsum`'s first; templates may
/// ramp beyond the parent and the overhang is ignored.
pub fn sum_templates(timgs: &[Image<ImagePixel>], tsum: &mut Image<ImagePixel>) {
    let sumbb = tsum.bbox();
    for timg in timgs {
        let mut tbb = timg.bbox();
        tbb.clip(&sumbb);
        if tbb.is_empty() {
            continue;
        }
        for y in tbb.min_y()..=tbb.max_y() {
            for x in tbb.min_x()..=tbb.max_x() {
                let v = tsum.get(x, y) + timg.get(x, y).max(0.0);
                tsum.set(x, y, v);
            }
        }
    }
}

/// Split the flux of `img` within `foot` among the templates.
///
/// Each template receives, at every pixel where the template sum is
/// positive, the fraction `max(0, template) / sum` of the observed value,
/// together with the parent's mask and variance. Pixels where the sum is
/// zero are left at their allocation default of zero.
///
/// When `stray_flux_options` includes [`ASSIGN_STRAYFLUX`], parent pixels
/// with positive flux and zero template sum are distributed according to
/// the option bits: by inverse square distance to the template footprints
/// ([`STRAYFLUX_R_TO_FOOTPRINT`]), entirely to the nearest footprint
/// ([`STRAYFLUX_NEAREST_FOOTPRINT`]), or by inverse square distance to the
/// peaks (the default). Point-source templates are excluded unless
/// [`STRAYFLUX_TO_POINT_SOURCES_ALWAYS`] is set, or re-included per pixel
/// when nothing else takes flux and
/// [`STRAYFLUX_TO_POINT_SOURCES_WHEN_NECESSARY`] is set. Contributions
/// below `clip_stray_flux_fraction` of a pixel's total are clipped before
/// renormalizing.
///
/// # Arguments
/// * `img` - parent masked image; must cover the parent footprint
/// * `foot` - parent footprint
/// * `timgs` - template images, one per child
/// * `tfoots` - template footprints, parallel to `timgs`
/// * `tsum` - optional precomputed sum buffer; allocated over the parent
///   footprint's box when absent; must cover the parent footprint
/// * `ispsf` - per-child point source flags; empty or parallel to `timgs`
/// * `pkx`, `pky` - per-child peak coordinates, parallel to `timgs`
/// * `stray_flux_options` - bitwise OR of the `STRAYFLUX` constants
/// * `clip_stray_flux_fraction` - fraction below which stray contributions
///   are dropped
#[allow(clippy::too_many_arguments)]
pub fn apportion_flux(
    img: &MaskedImage,
    foot: &Footprint,
    timgs: &[Image<ImagePixel>],
    tfoots: &[Footprint],
    tsum: Option<Image<ImagePixel>>,
    ispsf: &[bool],
    pkx: &[i32],
    pky: &[i32],
    stray_flux_options: u32,
    clip_stray_flux_fraction: f64,
) -> Result<FluxPortions, DeblendError> {
    if timgs.len() != tfoots.len() {
        return Err(DeblendError::TemplateCountMismatch {
            timgs: timgs.len(),
            tfoots: tfoots.len(),
        });
    }
    for (index, (timg, tfoot)) in timgs.iter().zip(tfoots).enumerate() {
        // Template boxes *can* extend outside the parent footprint when
        // templates ramp at the edges; that is handled by clipping below.
        if !timg.bbox().contains(&tfoot.bbox()) {
            return Err(DeblendError::TemplateFootprintOutsideImage { index });
        }
    }
    if !img.bbox().contains(&foot.bbox()) {
        return Err(DeblendError::FootprintOutsideImage);
    }

    let fbb = foot.bbox();
    let mut tsum = tsum.unwrap_or_else(|| Image::new(fbb));
    if !tsum.bbox().contains(&fbb) {
        return Err(DeblendError::TemplateSumTooSmall);
    }
    sum_templates(timgs, &mut tsum);

    let sumbb = tsum.bbox();
    let mut portions = Vec::with_capacity(timgs.len());
    for timg in timgs {
        let mut port = MaskedImage::new(timg.bbox());
        let mut tbb = timg.bbox();
        tbb.clip(&sumbb);
        tbb.clip(&img.bbox());
        for y in tbb.min_y()..=tbb.max_y() {
            for x in tbb.min_x()..=tbb.max_x() {
                let ts = tsum.get(x, y);
                if ts == 0.0 {
                    continue;
                }
                let frac = timg.get(x, y).max(0.0) / ts;
                port.image_mut().set(x, y, img.image().get(x, y) * frac);
                port.mask_mut().set(x, y, img.mask().get(x, y));
                port.variance_mut().set(x, y, img.variance().get(x, y));
            }
        }
        portions.push(port);
    }

    let mut strays = Vec::new();
    if stray_flux_options & ASSIGN_STRAYFLUX != 0 {
        if !ispsf.is_empty() && ispsf.len() != timgs.len() {
            return Err(DeblendError::PeakArrayLengthMismatch {
                name: "ispsf",
                len: ispsf.len(),
                expected: timgs.len(),
            });
        }
        if pkx.len() != timgs.len() {
            return Err(DeblendError::PeakArrayLengthMismatch {
                name: "pkx",
                len: pkx.len(),
                expected: timgs.len(),
            });
        }
        if pky.len() != timgs.len() {
            return Err(DeblendError::PeakArrayLengthMismatch {
                name: "pky",
                len: pky.len(),
                expected: timgs.len(),
            });
        }
        strays = find_stray_flux(
            foot,
            &tsum,
            img,
            stray_flux_options,
            tfoots,
            ispsf,
            pkx,
            pky,
            clip_stray_flux_fraction,
        );
    }

    Ok(FluxPortions {
        portions,
        strays,
        template_sum: tsum,
    })
}

/// Inverse square distance weight from a pixel to the nearest span of a
/// footprint, using exact horizontal run distance and plain row distance.
fn contrib_r_to_footprint(x: i32, y: i32, tfoot: &Footprint) -> f64 {
    let mut minr2 = f64::INFINITY;
    for sp in tfoot.spans() {
        let mindx = if sp.x0 >= x {
            sp.x0 - x
        } else if x >= sp.x1 {
            x - sp.x1
        } else {
            0
        };
        let dy = sp.y - y;
        minr2 = minr2.min(f64::from(mindx * mindx + dy * dy));
    }
    1.0 / (1.0 + minr2)
}

/// Distribute stray parent flux among the templates.
///
/// A parent pixel is stray when no template covers it (template sum zero)
/// and the observed value is positive. Contributions are computed lazily in
/// the footprint-distance mode: the marker -1 means "not computed yet", so
/// point-source templates skipped in the first pass never pay for the span
/// scan.
#[allow(clippy::too_many_arguments)]
fn find_stray_flux(
    foot: &Footprint,
    tsum: &Image<ImagePixel>,
    img: &MaskedImage,
    options: u32,
    tfoots: &[Footprint],
    ispsf: &[bool],
    pkx: &[i32],
    pky: &[i32],
    clip_stray_flux_fraction: f64,
) -> Vec<Option<HeavyFootprint>> {
    let n = tfoots.len();
    let mut stray_spans: Vec<Vec<Span>> = vec![Vec::new(); n];
    let mut stray_pix: Vec<Vec<ImagePixel>> = vec![Vec::new(); n];
    let mut stray_mask: Vec<Vec<MaskPixel>> = vec![Vec::new(); n];
    let mut stray_var: Vec<Vec<VariancePixel>> = vec![Vec::new(); n];

    let always = options & STRAYFLUX_TO_POINT_SOURCES_ALWAYS != 0;

    // Nearest-footprint routing precomputes a label map over the template
    // sum's box. Point sources are replaced by empty footprints so that
    // "nearest" means "nearest extended source", unless they are always
    // eligible.
    let nearest: Option<Image<u16>> = if options & STRAYFLUX_NEAREST_FOOTPRINT != 0 {
        let (labels, _dist) = if !always && !ispsf.is_empty() {
            let empty = Footprint::from_spans(SpanSet::new());
            let footlist: Vec<Footprint> = tfoots
                .iter()
                .enumerate()
                .map(|(i, f)| if ispsf[i] { empty.clone() } else { f.clone() })
                .collect();
            nearest_footprint(&footlist, tsum.bbox())
        } else {
            nearest_footprint(tfoots, tsum.bbox())
        };
        Some(labels)
    } else {
        None
    };

    let mut contrib = vec![0.0f64; n];
    for sp in foot.spans() {
        let y = sp.y;
        for x in sp.x0..=sp.x1 {
            // Not stray: claimed by a template, or nothing to assign.
            if tsum.get(x, y) > 0.0 || img.image().get(x, y) <= 0.0 {
                continue;
            }

            if options & STRAYFLUX_R_TO_FOOTPRINT != 0 {
                // computed just in time below
                contrib.fill(-1.0);
            } else if let Some(labels) = &nearest {
                contrib.fill(0.0);
                let label = labels.get(x, y);
                if label != NO_FOOTPRINT {
                    contrib[label as usize] = 1.0;
                }
            } else {
                // default: inverse square distance to the peaks
                for i in 0..n {
                    let dx = f64::from(pkx[i] - x);
                    let dy = f64::from(pky[i] - y);
                    contrib[i] = 1.0 / (1.0 + dx * dx + dy * dy);
                }
            }

            // First pass: sum eligible contributions, skipping point
            // sources unless they are always eligible.
            let mut ptsrcs = always;
            let mut csum = 0.0;
            for i in 0..n {
                if !ptsrcs && !ispsf.is_empty() && ispsf[i] {
                    continue;
                }
                if contrib[i] == -1.0 {
                    contrib[i] = contrib_r_to_footprint(x, y, &tfoots[i]);
                }
                csum += contrib[i];
            }
            // Second pass: nothing extended claimed this pixel, so open it
            // to point sources if the caller allows.
            if csum == 0.0 && options & STRAYFLUX_TO_POINT_SOURCES_WHEN_NECESSARY != 0 {
                ptsrcs = true;
                for i in 0..n {
                    if contrib[i] == -1.0 {
                        contrib[i] = contrib_r_to_footprint(x, y, &tfoots[i]);
                    }
                    csum += contrib[i];
                }
            }

            // Drop small contributions and renormalize over the survivors.
            let strayclip = clip_stray_flux_fraction * csum;
            csum = 0.0;
            for i in 0..n {
                if !ptsrcs && !ispsf.is_empty() && ispsf[i] {
                    contrib[i] = 0.0;
                    continue;
                }
                if contrib[i] < strayclip {
                    contrib[i] = 0.0;
                    continue;
                }
                csum += contrib[i];
            }

            for i in 0..n {
                if contrib[i] == 0.0 {
                    continue;
                }
                let p = (contrib[i] / csum) * f64::from(img.image().get(x, y));
                stray_spans[i].push(Span::new(y, x, x));
                stray_pix[i].push(p as ImagePixel);
                stray_mask[i].push(img.mask().get(x, y));
                stray_var[i].push(img.variance().get(x, y));
            }
        }
    }

    // Package the accumulated single-pixel spans as heavy footprints. The
    // accumulation order is already lexicographic, so the pixel arrays line
    // up with span iteration after coalescing.
    let mut strays = Vec::with_capacity(n);
    for i in 0..n {
        if stray_spans[i].is_empty() {
            strays.push(None);
        } else {
            let stray_foot =
                Footprint::from_spans(SpanSet::from_spans(std::mem::take(&mut stray_spans[i])));
            assert_eq!(
                stray_foot.area(),
                stray_pix[i].len(),
                "stray footprint area disagrees with accumulated pixels"
            );
            strays.push(Some(HeavyFootprint::from_parts(
                stray_foot,
                std::mem::take(&mut stray_pix[i]),
                std::mem::take(&mut stray_mask[i]),
                std::mem::take(&mut stray_var[i]),
            )));
        }
    }
    strays
}
