//! Sensor defect synthesis.
//!
//! The defect model is three stages passed explicit inputs (no ambient
//! state): the locator picks which pixels are defective, the sampler draws
//! the stuck values they take, and the applicator overlays them onto a frame
//! sequence and re-persists each frame with its metadata intact.

pub mod applicator;
pub mod locator;
pub mod sampler;
pub mod warm;

pub use applicator::{
    apply_static_defects, apply_telegraphic_defects, apply_warm_bias, ApplyConfig, ApplyError,
    TelegraphicConfig,
};
pub use locator::{select_bad_pixel_locations, select_telegraphic_locations, BadPixelLocations};
pub use sampler::{
    default_attempt_budget, sample_dead_values, sample_hot_values, DeadPixelDistribution,
    HotPixelDistribution,
};
pub use warm::{warm_pixel_bias, WarmPixelModel};

use thiserror::Error;

/// Errors from defect location selection and value sampling
#[derive(Error, Debug)]
pub enum DefectError {
    #[error("requested {requested} defective pixels but only {available} are available")]
    InsufficientPixels { requested: usize, available: usize },
    #[error("rejection sampling exhausted after {attempts} draws ({accepted}/{wanted} values accepted)")]
    SamplingExhausted {
        attempts: usize,
        accepted: usize,
        wanted: usize,
    },
    #[error("percentage {0} outside [0, 100]")]
    InvalidPercentage(f64),
    #[error("telegraphic interval must be at least 1")]
    InvalidInterval,
    #[error("invalid normal distribution parameters: {0}")]
    Normal(#[from] rand_distr::NormalError),
    #[error("invalid skew-normal distribution parameters: {0}")]
    SkewNormal(#[from] rand_distr::SkewNormalError),
}
