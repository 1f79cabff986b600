//! Noise generation primitives for detector simulation.
//!
//! Provides the per-pixel noise sources layered under every synthetic frame:
//! Gaussian read noise and Poisson dark-current shot noise. Dark current
//! switches to a Gaussian approximation when the per-pixel mean is small
//! enough that the Poisson tail is negligible.
//!
//! All generators take an explicit RNG (or seed) so frame sequences are
//! reproducible when a caller pins the seed.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

use crate::image_size::ImageSize;

/// Below this per-pixel mean (electrons) the dark-current distribution is
/// approximated as Gaussian rather than sampled as Poisson.
const POISSON_MEAN_CUTOFF: f64 = 0.1;

/// Generate a 2D array of normally distributed values for testing purposes.
///
/// Deterministic given the seed; useful for unit tests that need a
/// repeatable noise pattern rather than statistical assertions.
///
/// # Arguments
/// * `size` - Tuple of (height, width) for the output array dimensions
/// * `mean` - Mean value of the normal distribution
/// * `std_dev` - Standard deviation of the normal distribution
/// * `seed` - Random seed for deterministic output
pub fn simple_normal_array(
    size: (usize, usize),
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal_dist = Normal::new(mean, std_dev).unwrap();
    Array2::from_shape_fn(size, |_| normal_dist.sample(&mut rng))
}

/// Generate a per-pixel dark-current shot-noise field.
///
/// Each pixel is an independent draw with mean `dark_electrons_mean`
/// (electrons accumulated over the exposure). Means below 0.1 e⁻ use a
/// clamped Gaussian approximation; larger means use full Poisson statistics.
/// A non-positive mean yields a zero field.
///
/// # Arguments
/// * `size` - Output grid dimensions
/// * `dark_electrons_mean` - Expected dark electrons per pixel over the exposure
/// * `rng` - Random number generator
pub fn dark_current_field(
    size: ImageSize,
    dark_electrons_mean: f64,
    rng: &mut impl Rng,
) -> Array2<f64> {
    if dark_electrons_mean <= 0.0 {
        return size.zeros();
    }

    if dark_electrons_mean < POISSON_MEAN_CUTOFF {
        let dark_dist = Normal::new(0.0, dark_electrons_mean.sqrt()).unwrap();
        Array2::from_shape_fn(size.shape(), |_| dark_dist.sample(rng).max(0.0))
    } else {
        let dark_dist = Poisson::new(dark_electrons_mean).unwrap();
        Array2::from_shape_fn(size.shape(), |_| dark_dist.sample(rng))
    }
}

/// Generate a Gaussian read-noise floor.
///
/// Uses the `Normal(rms, sqrt(rms))` convention for the read stage, clamped
/// at zero (electron counts cannot go negative). A non-positive RMS yields a
/// zero field.
///
/// # Arguments
/// * `size` - Output grid dimensions
/// * `read_noise_rms` - Read noise RMS in electrons
/// * `rng` - Random number generator
pub fn read_noise_field(size: ImageSize, read_noise_rms: f64, rng: &mut impl Rng) -> Array2<f64> {
    if read_noise_rms <= 0.0 {
        return size.zeros();
    }

    let read_dist = Normal::new(read_noise_rms, read_noise_rms.sqrt()).unwrap();
    Array2::from_shape_fn(size.shape(), |_| read_dist.sample(rng).max(0.0))
}
