//! Sensor grid dimensions and flat-index utilities

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel grid dimensions of a sensor or frame.
///
/// Arrays built from an `ImageSize` follow the row-major `(height, width)`
/// shape convention used throughout the workspace. Flat pixel indices run
/// row by row, so `flat = row * width + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Grid width in pixels
    pub width: usize,
    /// Grid height in pixels
    pub height: usize,
}

impl ImageSize {
    /// Create a new ImageSize
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Create a zeroed f64 array with this size, shape `(height, width)`
    pub fn zeros(&self) -> Array2<f64> {
        Array2::zeros((self.height, self.width))
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Array shape tuple `(height, width)` for ndarray constructors
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Convert a flat pixel index to `(row, col)` coordinates.
    ///
    /// Row-major unraveling: index 0 is the top-left pixel, indices advance
    /// along each row before moving to the next.
    pub fn unravel(&self, flat: usize) -> (usize, usize) {
        debug_assert!(flat < self.pixel_count());
        (flat / self.width, flat % self.width)
    }

    /// Convert `(row, col)` coordinates to a flat pixel index
    pub fn ravel(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    /// Dimensions of an existing array, as an ImageSize
    pub fn of(array: &Array2<f64>) -> Self {
        let (height, width) = array.dim();
        Self { width, height }
    }
}

impl From<(usize, usize)> for ImageSize {
    fn from(dimensions: (usize, usize)) -> Self {
        Self {
            width: dimensions.0,
            height: dimensions.1,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
