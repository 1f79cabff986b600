//! Warm-pixel bias synthesis.
//!
//! Warm pixels are not a sparse defect set: every pixel of the sensor gets
//! an additive bias drawn once per camera from a skewed excess-current
//! profile. The skew-normal sample set is rescaled so its empirical standard
//! deviation and mean hit the configured targets exactly, layered on top of
//! a Poisson dark-current base, and truncated to the unsigned 16-bit sensor
//! range.

use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, SkewNormal};
use shared::image_proc::noise::dark_current_field;
use shared::ImageSize;

use super::DefectError;

/// Parameters of the per-camera warm-pixel bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmPixelModel {
    /// Target empirical mean of the bias, in ADU
    pub mean_warm: f64,
    /// Target empirical standard deviation of the bias, in ADU
    pub std_warm: f64,
    /// Skewness (shape) parameter of the skew-normal profile
    pub skewness: f64,
    /// Dark current in electrons/pixel/second
    pub dark_current: f64,
    /// Exposure time in seconds
    pub exposure_time: f64,
}

/// Generate the full-grid warm-pixel bias array for a sensor.
///
/// Draws one skew-normal sample per pixel, rescales the sample set so its
/// empirical standard deviation equals `std_warm`, shifts it so its
/// empirical mean equals `mean_warm`, then adds Poisson dark-current shot
/// noise with per-pixel mean `dark_current * exposure_time`. The result is
/// clamped to `[0, u16::MAX]` and truncated (not rounded) to `u16`.
///
/// # Arguments
/// * `size` - Sensor grid dimensions
/// * `model` - Bias profile parameters
/// * `rng` - Random number generator
pub fn warm_pixel_bias(
    size: ImageSize,
    model: &WarmPixelModel,
    rng: &mut impl Rng,
) -> Result<Array2<u16>, DefectError> {
    let count = size.pixel_count();
    let skew_normal = SkewNormal::new(0.0, 1.0, model.skewness)?;

    let mut samples: Vec<f64> = (0..count).map(|_| skew_normal.sample(rng)).collect();

    // Rescale to the target standard deviation, then shift to the target
    // mean; the shift comes last so it lands exactly.
    let mean = samples.iter().sum::<f64>() / count as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        let scale = model.std_warm / std_dev;
        for value in &mut samples {
            *value *= scale;
        }
    }
    let scaled_mean = samples.iter().sum::<f64>() / count as f64;
    let shift = model.mean_warm - scaled_mean;
    for value in &mut samples {
        *value += shift;
    }

    let bias = Array2::from_shape_vec(size.shape(), samples)
        .expect("sample count matches grid size");

    let dark_electrons_mean = model.dark_current * model.exposure_time;
    let dark_base = dark_current_field(size, dark_electrons_mean, rng);

    let combined = dark_base + bias;
    Ok(combined.mapv(|value| value.clamp(0.0, f64::from(u16::MAX)) as u16))
}
