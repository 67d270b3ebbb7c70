//! Dense pixel buffers with parent-coordinate origins.
//!
//! Images are backed by `ndarray::Array2` in `[row, col]` layout, but every
//! access goes through parent coordinates: the buffer carries its own
//! `(x0, y0)` origin, so a sub-image cut from a larger mosaic indexes with
//! the same `(x, y)` values as its parent. This is the convention every
//! deblender routine relies on when it walks a footprint with one hand and
//! a pixel buffer with the other.

use ndarray::Array2;

use crate::geom::BBox;

/// Science pixel type used by the deblender routines.
pub type ImagePixel = f32;

/// Mask pixel type: a bit field of mask planes.
pub type MaskPixel = u16;

/// Variance pixel type.
pub type VariancePixel = f32;

/// Mask plane bit for pixels contaminated by the sensor edge.
///
/// The only plane the deblender core inspects: templates whose symmetric
/// partner pixels carry this bit can be patched with the observed values.
pub const EDGE: MaskPixel = 0x1;

/// A dense 2-D pixel buffer with an integer parent-coordinate origin.
///
/// Rows are stored bottom-up: array row 0 corresponds to parent row `y0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    data: Array2<T>,
    x0: i32,
    y0: i32,
}

impl<T: Copy + Default> Image<T> {
    /// Allocate a default-filled image covering `bbox`.
    pub fn new(bbox: BBox) -> Self {
        Self {
            data: Array2::from_elem(
                (bbox.height() as usize, bbox.width() as usize),
                T::default(),
            ),
            x0: bbox.min_x(),
            y0: bbox.min_y(),
        }
    }

    /// Allocate an image covering `bbox`, filling each pixel from `f(x, y)`
    /// in parent coordinates.
    pub fn from_fn(bbox: BBox, mut f: impl FnMut(i32, i32) -> T) -> Self {
        let x0 = bbox.min_x();
        let y0 = bbox.min_y();
        Self {
            data: Array2::from_shape_fn(
                (bbox.height() as usize, bbox.width() as usize),
                |(row, col)| f(x0 + col as i32, y0 + row as i32),
            ),
            x0,
            y0,
        }
    }
}

impl<T: Copy> Image<T> {
    /// Parent x coordinate of the first column.
    pub fn x0(&self) -> i32 {
        self.x0
    }

    /// Parent y coordinate of the first row.
    pub fn y0(&self) -> i32 {
        self.y0
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.data.ncols() as i32
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.data.nrows() as i32
    }

    /// The bounding box covered by this image.
    pub fn bbox(&self) -> BBox {
        BBox::from_corners(
            self.x0,
            self.y0,
            self.x0 + self.width() - 1,
            self.y0 + self.height() - 1,
        )
    }

    /// True if the parent-coordinate pixel (x, y) lies inside the buffer.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x0 + self.width() && y >= self.y0 && y < self.y0 + self.height()
    }

    /// Read the pixel at parent coordinates (x, y).
    ///
    /// Panics if (x, y) is outside the buffer.
    pub fn get(&self, x: i32, y: i32) -> T {
        self.data[[(y - self.y0) as usize, (x - self.x0) as usize]]
    }

    /// Write the pixel at parent coordinates (x, y).
    ///
    /// Panics if (x, y) is outside the buffer.
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        self.data[[(y - self.y0) as usize, (x - self.x0) as usize]] = value;
    }

    /// Set every pixel to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Overwrite this image's pixels with `other`'s.
    ///
    /// Panics if the two images have different dimensions.
    pub fn assign(&mut self, other: &Image<T>) {
        self.data.assign(&other.data);
    }

    /// The underlying array, rows indexed from the origin upward.
    pub fn array(&self) -> &Array2<T> {
        &self.data
    }

    /// Mutable access to the underlying array.
    pub fn array_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }
}

/// Co-located image, mask and variance planes sharing one bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    image: Image<ImagePixel>,
    mask: Image<MaskPixel>,
    variance: Image<VariancePixel>,
}

impl MaskedImage {
    /// Allocate a zero-filled masked image covering `bbox`.
    pub fn new(bbox: BBox) -> Self {
        Self {
            image: Image::new(bbox),
            mask: Image::new(bbox),
            variance: Image::new(bbox),
        }
    }

    /// Assemble from existing planes.
    ///
    /// Panics unless all three planes share a bounding box.
    pub fn from_planes(
        image: Image<ImagePixel>,
        mask: Image<MaskPixel>,
        variance: Image<VariancePixel>,
    ) -> Self {
        assert_eq!(image.bbox(), mask.bbox(), "mask plane bbox mismatch");
        assert_eq!(image.bbox(), variance.bbox(), "variance plane bbox mismatch");
        Self {
            image,
            mask,
            variance,
        }
    }

    /// The shared bounding box.
    pub fn bbox(&self) -> BBox {
        self.image.bbox()
    }

    /// The science image plane.
    pub fn image(&self) -> &Image<ImagePixel> {
        &self.image
    }

    /// The mask plane.
    pub fn mask(&self) -> &Image<MaskPixel> {
        &self.mask
    }

    /// The variance plane.
    pub fn variance(&self) -> &Image<VariancePixel> {
        &self.variance
    }

    /// Mutable science image plane.
    pub fn image_mut(&mut self) -> &mut Image<ImagePixel> {
        &mut self.image
    }

    /// Mutable mask plane.
    pub fn mask_mut(&mut self) -> &mut Image<MaskPixel> {
        &mut self.mask
    }

    /// Mutable variance plane.
    pub fn variance_mut(&mut self) -> &mut Image<VariancePixel> {
        &mut self.variance
    }
}
