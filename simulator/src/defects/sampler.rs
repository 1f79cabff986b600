//! Stuck-pixel value sampling.
//!
//! Hot and dead values come from truncated Gaussians realized by rejection
//! sampling: draw, test against the limit, resample on rejection. The hot
//! distribution keeps the reference convention of treating its `std_dev`
//! parameter as a variance (`scale = sqrt(std_dev)`); the dead distribution
//! uses its `std_dev` as the scale directly.
//!
//! Rejection loops carry an explicit draw budget. When the limits make the
//! acceptance probability vanish (e.g. an upper limit far below the peak)
//! the sampler fails with [`DefectError::SamplingExhausted`] instead of
//! spinning forever.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::DefectError;

/// Draw budget per requested value used by [`default_attempt_budget`]
const DRAWS_PER_VALUE: usize = 1000;

/// Truncated Gaussian for hot (bright stuck) pixel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotPixelDistribution {
    /// Mean of the Gaussian
    pub peak: f64,
    /// Variance-convention spread: the sampling scale is `sqrt(std_dev)`
    pub std_dev: f64,
    /// Draws above this value are rejected
    pub upper_limit: f64,
}

/// Truncated Gaussian for dead (dark stuck) pixel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadPixelDistribution {
    /// Mean of the Gaussian
    pub mean: f64,
    /// Sampling scale, used directly
    pub std_dev: f64,
    /// Draws below this value are rejected
    pub lower_limit: f64,
}

impl Default for DeadPixelDistribution {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 10.0,
            lower_limit: 0.0,
        }
    }
}

/// Total draw budget for collecting `count` accepted values
pub fn default_attempt_budget(count: usize) -> usize {
    count.max(1) * DRAWS_PER_VALUE
}

/// Sample `count` hot pixel values.
///
/// Draws from `Normal(peak, sqrt(std_dev))`, rejecting values above
/// `upper_limit`, until `count` values are accepted or `max_attempts` draws
/// have been spent.
pub fn sample_hot_values(
    distribution: &HotPixelDistribution,
    count: usize,
    max_attempts: usize,
    rng: &mut impl Rng,
) -> Result<Vec<f64>, DefectError> {
    let normal = Normal::new(distribution.peak, distribution.std_dev.sqrt())?;
    let upper_limit = distribution.upper_limit;
    rejection_sample(normal, count, max_attempts, rng, |value| {
        value <= upper_limit
    })
}

/// Sample `count` dead pixel values.
///
/// Draws from `Normal(mean, std_dev)`, rejecting values below `lower_limit`,
/// until `count` values are accepted or `max_attempts` draws have been spent.
pub fn sample_dead_values(
    distribution: &DeadPixelDistribution,
    count: usize,
    max_attempts: usize,
    rng: &mut impl Rng,
) -> Result<Vec<f64>, DefectError> {
    let normal = Normal::new(distribution.mean, distribution.std_dev)?;
    let lower_limit = distribution.lower_limit;
    rejection_sample(normal, count, max_attempts, rng, |value| {
        value >= lower_limit
    })
}

fn rejection_sample(
    distribution: Normal<f64>,
    count: usize,
    max_attempts: usize,
    rng: &mut impl Rng,
    accept: impl Fn(f64) -> bool,
) -> Result<Vec<f64>, DefectError> {
    let mut values = Vec::with_capacity(count);
    let mut attempts = 0;

    while values.len() < count {
        if attempts >= max_attempts {
            return Err(DefectError::SamplingExhausted {
                attempts,
                accepted: values.len(),
                wanted: count,
            });
        }
        attempts += 1;

        let sample = distribution.sample(rng);
        if accept(sample) {
            values.push(sample);
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hot_values_respect_upper_limit() {
        let distribution = HotPixelDistribution {
            peak: 50_000.0,
            std_dev: 4_000_000.0, // scale = 2000
            upper_limit: 52_000.0,
        };
        let mut rng = StdRng::seed_from_u64(11);

        let values =
            sample_hot_values(&distribution, 500, default_attempt_budget(500), &mut rng).unwrap();
        assert_eq!(values.len(), 500);
        assert!(values.iter().all(|&v| v <= 52_000.0));
        // The truncation should actually bite for this configuration
        assert!(values.iter().any(|&v| v > 50_000.0));
    }

    #[test]
    fn test_hot_scale_is_sqrt_of_std_dev() {
        // With std_dev treated as a variance of 100 the sampling scale is
        // 10, so draws stay within ~6 scales of the peak.
        let distribution = HotPixelDistribution {
            peak: 1000.0,
            std_dev: 100.0,
            upper_limit: f64::INFINITY,
        };
        let mut rng = StdRng::seed_from_u64(12);

        let values =
            sample_hot_values(&distribution, 1000, default_attempt_budget(1000), &mut rng).unwrap();
        assert!(values.iter().all(|&v| (v - 1000.0).abs() < 60.0));
    }

    #[test]
    fn test_dead_values_respect_lower_limit() {
        let distribution = DeadPixelDistribution::default();
        let mut rng = StdRng::seed_from_u64(13);

        let values =
            sample_dead_values(&distribution, 500, default_attempt_budget(500), &mut rng).unwrap();
        assert_eq!(values.len(), 500);
        assert!(values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_zero_count_returns_empty() {
        let mut rng = StdRng::seed_from_u64(14);
        let values = sample_dead_values(
            &DeadPixelDistribution::default(),
            0,
            default_attempt_budget(0),
            &mut rng,
        )
        .unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_impossible_bounds_exhaust_instead_of_hanging() {
        // Upper limit ~5000 scales below the peak: acceptance probability is
        // effectively zero and the budget must trip.
        let distribution = HotPixelDistribution {
            peak: 50_000.0,
            std_dev: 100.0, // scale = 10
            upper_limit: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(15);

        let result = sample_hot_values(&distribution, 10, 5000, &mut rng);
        assert!(matches!(
            result,
            Err(DefectError::SamplingExhausted {
                attempts: 5000,
                accepted: 0,
                wanted: 10,
            })
        ));
    }

    #[test]
    fn test_non_finite_scale_rejected() {
        let distribution = DeadPixelDistribution {
            mean: 0.0,
            std_dev: f64::NAN,
            lower_limit: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(16);

        assert!(matches!(
            sample_dead_values(&distribution, 10, 100, &mut rng),
            Err(DefectError::Normal(_))
        ));
    }
}
