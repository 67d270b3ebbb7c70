//! Core numerical routines for deblending overlapping astronomical sources.
//!
//! A "parent" detection is an irregular set of above-threshold pixels (a
//! footprint) that may blend together the light of several sources, each
//! with a known peak. This crate provides the pixel-level primitives that
//! split the parent's observed flux into per-peak children:
//!
//! 1. symmetrize the footprint about a peak ([`symmetrize_footprint`])
//! 2. build a symmetric template from the observed image
//!    ([`build_symmetric_template`])
//! 3. force the template to decrease away from the peak
//!    ([`make_monotonic`])
//! 4. apportion the parent's flux among the templates, including stray
//!    flux no template claims ([`apportion_flux`])
//!
//! # Module Organization
//!
//! - **geom**: spans, span sets and bounding boxes in parent coordinates
//! - **image**: dense pixel buffers and masked images with their origins
//! - **footprint**: footprints, peaks, and heavy (pixel-carrying) footprints
//! - **symmetrize / template / monotonic / apportion**: the four deblending
//!   primitives
//! - **nearest**: Manhattan distance transform with nearest-footprint labels
//! - **median**: square-window median filter for background estimates
//! - **edge**: significant-flux tests along template boundaries
//!
//! All operations are synchronous, single-threaded, and deterministic:
//! identical inputs produce identical outputs, and nothing is retained
//! between calls.

pub mod apportion;
pub mod edge;
pub mod error;
pub mod footprint;
pub mod geom;
pub mod image;
pub mod median;
pub mod monotonic;
pub mod nearest;
pub mod symmetrize;
pub mod template;

pub use apportion::{
    apportion_flux, sum_templates, FluxPortions, ASSIGN_STRAYFLUX, STRAYFLUX_NEAREST_FOOTPRINT,
    STRAYFLUX_R_TO_FOOTPRINT, STRAYFLUX_TO_POINT_SOURCES_ALWAYS,
    STRAYFLUX_TO_POINT_SOURCES_WHEN_NECESSARY, STRAYFLUX_TRIM,
};
pub use edge::{get_significant_edge_pixels, has_significant_flux_at_edge};
pub use error::DeblendError;
pub use footprint::{Footprint, HeavyFootprint, Peak};
pub use geom::{BBox, Span, SpanSet};
pub use image::{Image, ImagePixel, MaskPixel, MaskedImage, VariancePixel, EDGE};
pub use median::median_filter;
pub use monotonic::make_monotonic;
pub use nearest::{nearest_footprint, NO_FOOTPRINT};
pub use symmetrize::symmetrize_footprint;
pub use template::{build_symmetric_template, SymmetricTemplate};
