use thiserror::Error;

/// Errors produced by the deblender core.
///
/// All variants are fatal for the parent being deblended: they indicate
/// mismatched inputs, and no partial results are produced. The one
/// recoverable condition, a peak that lies outside its footprint, is
/// reported as `None` by the symmetrization routines instead.
#[derive(Error, Debug)]
pub enum DeblendError {
    /// Template image list and template footprint list differ in length.
    #[error("template images must be the same length as template footprints ({timgs} vs {tfoots})")]
    TemplateCountMismatch {
        /// Number of template images.
        timgs: usize,
        /// Number of template footprints.
        tfoots: usize,
    },

    /// A template image does not cover its own footprint.
    #[error("template image must contain template footprint (template {index})")]
    TemplateFootprintOutsideImage {
        /// Index of the offending template.
        index: usize,
    },

    /// The input image does not cover the parent footprint.
    #[error("image bbox must contain parent footprint")]
    FootprintOutsideImage,

    /// The input image does not cover the symmetrized footprint.
    #[error("image bbox must contain symmetrized footprint")]
    SymmetrizedFootprintOutsideImage,

    /// A caller-supplied template sum image does not cover the parent footprint.
    #[error("template sum image must contain parent footprint")]
    TemplateSumTooSmall,

    /// A per-peak array has the wrong length.
    #[error("'{name}' must be the same length as templates ({len} vs {expected})")]
    PeakArrayLengthMismatch {
        /// Name of the offending argument.
        name: &'static str,
        /// Actual length.
        len: usize,
        /// Expected length (the number of templates).
        expected: usize,
    },
}
