//! Footprint symmetrization about a peak.
//!
//! The symmetric footprint is the AND of a region with its own 180-degree
//! rotation about a peak pixel: a pixel survives only if its mirror is also
//! in the region. Rather than rasterizing, the sweep walks the sorted span
//! list with two cursors moving in opposite directions from the span that
//! contains the peak, matching rows at equal distance from the peak row and
//! intersecting their runs in mirror coordinates.

use log::{debug, warn};

use crate::footprint::Footprint;
use crate::geom::{Span, SpanSet};

/// A cursor over a span slice that walks forward or backward from a start
/// index and reports run bounds relative to a center pixel.
///
/// For the forward cursor, `dxlo..=dxhi` is the run in center-relative
/// coordinates; for the backward cursor the run is reflected through the
/// center first, so both cursors present rows that grow rightward as they
/// advance and can be intersected directly.
struct RelativeSpanCursor<'a> {
    spans: &'a [Span],
    idx: isize,
    cx: i32,
    cy: i32,
    forward: bool,
}

impl<'a> RelativeSpanCursor<'a> {
    fn new(spans: &'a [Span], start: usize, cx: i32, cy: i32, forward: bool) -> Self {
        Self {
            spans,
            idx: start as isize,
            cx,
            cy,
            forward,
        }
    }

    fn not_done(&self) -> bool {
        if self.forward {
            self.idx < self.spans.len() as isize
        } else {
            self.idx >= 0
        }
    }

    fn advance(&mut self) {
        if self.forward {
            self.idx += 1;
        } else {
            self.idx -= 1;
        }
    }

    fn span(&self) -> &Span {
        &self.spans[self.idx as usize]
    }

    /// Low edge of the run, in mirror-aware center-relative coordinates.
    fn dxlo(&self) -> i32 {
        if self.forward {
            self.span().x0 - self.cx
        } else {
            self.cx - self.span().x1
        }
    }

    /// High edge of the run, in mirror-aware center-relative coordinates.
    fn dxhi(&self) -> i32 {
        if self.forward {
            self.span().x1 - self.cx
        } else {
            self.cx - self.span().x0
        }
    }

    /// Row distance from the center row.
    fn dy(&self) -> i32 {
        (self.span().y - self.cy).abs()
    }

    /// Index just past the last span whose row distance is still `dy`,
    /// in this cursor's walk direction.
    fn row_end(&self, dy: i32) -> isize {
        let mut probe = Self {
            spans: self.spans,
            idx: self.idx,
            cx: self.cx,
            cy: self.cy,
            forward: self.forward,
        };
        while probe.not_done() && probe.dy() == dy {
            probe.advance();
        }
        probe.idx
    }
}

/// Locate the index of the span containing (cx, cy), if any.
///
/// Binary search for the first span ordered after the peak's single-pixel
/// span; the container is that span's predecessor, or the found span itself
/// when the peak sits on its first pixel.
fn find_peak_span(spans: &[Span], cx: i32, cy: i32) -> Option<usize> {
    let target = Span::new(cy, cx, cx);
    let upper = spans.partition_point(|sp| *sp <= target);
    if upper == 0 {
        if spans.first()?.contains(cx, cy) {
            return Some(0);
        }
        warn!("no span contains peak ({cx}, {cy}): before the start of the footprint");
        return None;
    }
    if spans[upper - 1].contains(cx, cy) {
        return Some(upper - 1);
    }
    if upper < spans.len() && spans[upper].contains(cx, cy) {
        return Some(upper);
    }
    let sp = spans[upper - 1];
    warn!(
        "no span contains peak ({cx}, {cy}): nearest is y={} x=[{}, {}]",
        sp.y, sp.x0, sp.x1
    );
    None
}

/// Symmetrize a footprint about the peak (cx, cy).
///
/// Returns a peakless footprint covering exactly the pixels of `foot` whose
/// 180-degree mirror about the peak is also in `foot`, or `None` (with a
/// warning) when the peak does not lie on any span. The output is a subset
/// of the input and is itself two-fold rotationally symmetric about the
/// peak.
///
/// # Arguments
/// * `foot` - footprint to symmetrize
/// * `cx`, `cy` - peak pixel, in parent coordinates
pub fn symmetrize_footprint(foot: &Footprint, cx: i32, cy: i32) -> Option<Footprint> {
    let spans = foot.spans().as_slice();
    let peak_idx = find_peak_span(spans, cx, cy)?;
    let sp = spans[peak_idx];
    debug!(
        "span containing ({cx}, {cy}): y={} x=[{}, {}]",
        sp.y, sp.x0, sp.x1
    );

    let mut fwd = RelativeSpanCursor::new(spans, peak_idx, cx, cy, true);
    let mut back = RelativeSpanCursor::new(spans, peak_idx, cx, cy, false);

    // Walk rows outward from the peak row. At each row distance dy the
    // forward cursor covers row cy + dy and the backward cursor row
    // cy - dy; their runs are intersected in center-relative coordinates
    // and each overlap is emitted twice, once per row.
    let mut dy = 0;
    let mut out: Vec<Span> = Vec::new();
    while fwd.not_done() && back.not_done() {
        let fy = cy + dy;
        let by = cy - dy;
        let fdxlo = fwd.dxlo();
        let bdxlo = back.dxlo();

        let fend = fwd.row_end(dy);
        let bend = back.row_end(dy);

        // Skip runs that end before the other side's run begins.
        if bdxlo > fdxlo {
            while fwd.idx != fend && fwd.dxhi() < bdxlo {
                fwd.advance();
            }
        } else if fdxlo > bdxlo {
            while back.idx != bend && back.dxhi() < fdxlo {
                back.advance();
            }
        }

        if fwd.idx == fend || back.idx == bend {
            // One side ran out of runs in this row; no more overlaps here.
            fwd.idx = fend;
            back.idx = bend;
            dy += 1;
            continue;
        }

        let dxlo = fwd.dxlo().max(back.dxlo());
        let dxhi = fwd.dxhi().min(back.dxhi());
        if dxlo <= dxhi {
            out.push(Span::new(fy, cx + dxlo, cx + dxhi));
            out.push(Span::new(by, cx - dxhi, cx - dxlo));
        }

        // Advance whichever run ends first.
        if fwd.dxhi() < back.dxhi() {
            fwd.advance();
        } else {
            back.advance();
        }

        if fwd.idx == fend || back.idx == bend {
            fwd.idx = fend;
            back.idx = bend;
            dy += 1;
        }
    }

    Some(Footprint::from_spans(SpanSet::from_spans(out)))
}
