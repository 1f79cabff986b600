//! Guiding-camera frame synthesis and sensor defect injection.
//!
//! This crate generates sequences of simulated light and dark exposures and
//! corrupts them with the pixel-level sensor defects seen on real detectors:
//! hot and dead stuck pixels, telegraphic pixels that toggle intermittently,
//! and warm-pixel bias from elevated dark current. An animated GIF assembler
//! turns a frame sequence into a quick-look preview.
//!
//! # Modules
//! - [`defects`] - defect location selection, value sampling, and application
//!   across frame sequences
//! - [`synthesis`] - base light/dark frame generation
//! - [`animation`] - animated GIF preview assembly
//! - [`shared_args`] - CLI argument plumbing shared by the binaries

pub mod animation;
pub mod defects;
pub mod shared_args;
pub mod synthesis;
