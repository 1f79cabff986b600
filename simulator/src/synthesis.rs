//! Base frame generation for guiding sequences.
//!
//! Produces the raw light and dark exposures that the defect applicators
//! corrupt. A light frame is a small synthetic star field rendered with
//! Gaussian profiles (seeing-scaled) over a read-noise and dark-current
//! floor; a dark frame is the floor alone. Frame pointing is jittered
//! uniformly within a configurable pixel radius of the base coordinates so
//! consecutive frames drift the way a guiding test sequence should.

use chrono::{DateTime, Duration, Utc};
use indicatif::ProgressBar;
use log::info;
use ndarray::Array2;
use rand::Rng;
use shared::frame_io::{write_frame, FrameIoError};
use shared::image_proc::noise::{dark_current_field, read_noise_field};
use shared::{Frame, FrameClass, ImageSize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from frame sequence generation
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error(transparent)]
    FrameIo(#[from] FrameIoError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("seeing sequence has {provided} entries but {required} frames are requested")]
    SeeingTooShort { provided: usize, required: usize },
}

/// Conversion from a Gaussian FWHM to its standard deviation
const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949;

/// Camera sensor parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Sensor grid dimensions
    pub size: ImageSize,
    /// Pixel pitch in micrometers
    pub pitch_um: f64,
    /// Read noise RMS in electrons
    pub read_noise: f64,
    /// Dark current in electrons/pixel/second
    pub dark_current: f64,
}

/// Telescope optical parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeConfig {
    /// Focal length in millimeters
    pub focal_length_mm: f64,
}

impl TelescopeConfig {
    /// Plate scale in arcseconds per pixel for a given camera:
    /// `atan(pitch / focal_length) * (180/pi) * 3600`.
    pub fn plate_scale_arcsec(&self, camera: &CameraConfig) -> f64 {
        let pitch_m = camera.pitch_um * 1e-6;
        let focal_length_m = self.focal_length_mm * 1e-3;
        (pitch_m / focal_length_m).atan().to_degrees() * 3600.0
    }
}

/// A point source on the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyStar {
    /// Right ascension in degrees
    pub ra_deg: f64,
    /// Declination in degrees
    pub dec_deg: f64,
    /// Total flux in electrons per exposure
    pub flux: f64,
}

/// A fixed synthetic star field around a base pointing.
#[derive(Debug, Clone)]
pub struct SkyModel {
    stars: Vec<SkyStar>,
}

impl SkyModel {
    /// Build a star field from an explicit star list
    pub fn from_stars(stars: Vec<SkyStar>) -> Self {
        Self { stars }
    }

    /// Synthesize a random star field centered on `(ra_deg, dec_deg)`.
    ///
    /// Positions are uniform within `fov_deg` of the center in each axis;
    /// fluxes are uniform within `flux_range`.
    pub fn synthesize(
        count: usize,
        ra_deg: f64,
        dec_deg: f64,
        fov_deg: f64,
        flux_range: (f64, f64),
        rng: &mut impl Rng,
    ) -> Self {
        let stars = (0..count)
            .map(|_| SkyStar {
                ra_deg: rng.random_range(ra_deg - fov_deg..=ra_deg + fov_deg),
                dec_deg: rng.random_range(dec_deg - fov_deg..=dec_deg + fov_deg),
                flux: rng.random_range(flux_range.0..=flux_range.1),
            })
            .collect();
        Self { stars }
    }

    /// Render the star field for a pointing, adding Gaussian profiles onto
    /// `image`. Stars falling outside the frame contribute nothing.
    ///
    /// # Arguments
    /// * `image` - Accumulation buffer, shape `(height, width)`
    /// * `pointing_ra_deg` / `pointing_dec_deg` - Frame center coordinates
    /// * `degrees_per_pixel` - Plate scale converted to degrees
    /// * `sigma_pix` - Gaussian profile sigma in pixels (seeing-scaled)
    pub fn render(
        &self,
        image: &mut Array2<f64>,
        pointing_ra_deg: f64,
        pointing_dec_deg: f64,
        degrees_per_pixel: f64,
        sigma_pix: f64,
    ) {
        let (height, width) = image.dim();
        let center_col = width as f64 / 2.0;
        let center_row = height as f64 / 2.0;

        // 4 sigmas captures effectively all of the profile
        let max_pix_dist = (sigma_pix.max(1.0) * 4.0).ceil() as i64;
        let pre_term = 1.0 / (2.0 * sigma_pix * sigma_pix * std::f64::consts::PI);
        let denom = 2.0 * sigma_pix * sigma_pix;

        for star in &self.stars {
            let col = (star.ra_deg - pointing_ra_deg) / degrees_per_pixel + center_col;
            let row = (star.dec_deg - pointing_dec_deg) / degrees_per_pixel + center_row;

            let col_center = col.round() as i64;
            let row_center = row.round() as i64;

            for pix_row in (row_center - max_pix_dist)..=(row_center + max_pix_dist) {
                for pix_col in (col_center - max_pix_dist)..=(col_center + max_pix_dist) {
                    if pix_row < 0
                        || pix_col < 0
                        || pix_row >= height as i64
                        || pix_col >= width as i64
                    {
                        continue;
                    }

                    let d_col = col - pix_col as f64;
                    let d_row = row - pix_row as f64;
                    let distance_squared = d_col * d_col + d_row * d_row;
                    let contribution = star.flux * pre_term * (-distance_squared / denom).exp();
                    image[[pix_row as usize, pix_col as usize]] += contribution;
                }
            }
        }
    }
}

/// Parameters of a generated frame sequence.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base right ascension in degrees
    pub ra_deg: f64,
    /// Base declination in degrees
    pub dec_deg: f64,
    /// Exposure time in seconds; also the interval between frames
    pub exposure_time: f64,
    /// Timestamp of the first observation
    pub base_date: DateTime<Utc>,
    /// Pointing jitter radius in pixels
    pub num_pixels_shift: usize,
}

fn noise_floor(camera: &CameraConfig, exposure_time: f64, rng: &mut impl Rng) -> Array2<f64> {
    let dark_electrons_mean = camera.dark_current * exposure_time;
    dark_current_field(camera.size, dark_electrons_mean, rng)
        + read_noise_field(camera.size, camera.read_noise, rng)
}

fn frame_timestamp(config: &GenerationConfig, index: usize) -> DateTime<Utc> {
    config.base_date
        + Duration::microseconds((index as f64 * config.exposure_time * 1e6) as i64)
}

/// Generate a sequence of light frames.
///
/// Frame `i` points at the base coordinates jittered uniformly within
/// `num_pixels_shift` pixels, is timestamped `base_date + i * exposure_time`,
/// takes its seeing (FWHM, arcseconds) from `seeing[i]`, and is written as
/// `raw_image_light_{i+1}.fits` in the output directory (created if absent).
///
/// Returns the written paths in frame order.
pub fn generate_light_frames(
    config: &GenerationConfig,
    camera: &CameraConfig,
    telescope: &TelescopeConfig,
    sky: &SkyModel,
    seeing: &[f64],
    count: usize,
    output_dir: &Path,
    rng: &mut impl Rng,
) -> Result<Vec<PathBuf>, SynthesisError> {
    if seeing.len() < count {
        return Err(SynthesisError::SeeingTooShort {
            provided: seeing.len(),
            required: count,
        });
    }
    fs::create_dir_all(output_dir)?;

    let plate_scale = telescope.plate_scale_arcsec(camera);
    let degrees_per_pixel = plate_scale / 3600.0;
    let shift_deg = config.num_pixels_shift as f64 * degrees_per_pixel;

    let progress = ProgressBar::new(count as u64);
    let mut paths = Vec::with_capacity(count);
    for index in 0..count {
        let pointing_ra = if shift_deg > 0.0 {
            rng.random_range(config.ra_deg - shift_deg..=config.ra_deg + shift_deg)
        } else {
            config.ra_deg
        };
        let pointing_dec = if shift_deg > 0.0 {
            rng.random_range(config.dec_deg - shift_deg..=config.dec_deg + shift_deg)
        } else {
            config.dec_deg
        };

        let mut image = noise_floor(camera, config.exposure_time, rng);
        let sigma_pix = (seeing[index] / plate_scale / FWHM_TO_SIGMA).max(0.5);
        sky.render(
            &mut image,
            pointing_ra,
            pointing_dec,
            degrees_per_pixel,
            sigma_pix,
        );

        let frame = Frame::new(image, FrameClass::Light, frame_timestamp(config, index));
        let path = output_dir.join(format!("raw_image_light_{}.fits", index + 1));
        write_frame(&path, &frame)?;
        paths.push(path);
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        "{count} light frames written to {}",
        output_dir.display()
    );
    Ok(paths)
}

/// Generate a sequence of dark frames.
///
/// Dark frames carry no sky signal, only the sensor noise floor. Their
/// timestamps continue after the light sequence: the first dark is stamped
/// `base_date + num_light_frames * exposure_time`. Files are written as
/// `raw_image_dark_{i+1}.fits`.
pub fn generate_dark_frames(
    config: &GenerationConfig,
    camera: &CameraConfig,
    count: usize,
    num_light_frames: usize,
    output_dir: &Path,
    rng: &mut impl Rng,
) -> Result<Vec<PathBuf>, SynthesisError> {
    fs::create_dir_all(output_dir)?;

    let progress = ProgressBar::new(count as u64);
    let mut paths = Vec::with_capacity(count);
    for index in 0..count {
        let image = noise_floor(camera, config.exposure_time, rng);
        let frame = Frame::new(
            image,
            FrameClass::Dark,
            frame_timestamp(config, num_light_frames + index),
        );
        let path = output_dir.join(format!("raw_image_dark_{}.fits", index + 1));
        write_frame(&path, &frame)?;
        paths.push(path);
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!("{count} dark frames written to {}", output_dir.display());
    Ok(paths)
}

/// Copy the contents of the light and dark directories into one combined
/// directory (created if absent). Returns the number of files copied.
pub fn combine_folders(
    light_dir: &Path,
    dark_dir: &Path,
    combined_dir: &Path,
) -> Result<usize, SynthesisError> {
    fs::create_dir_all(combined_dir)?;

    let mut copied = 0;
    for source_dir in [light_dir, dark_dir] {
        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                let file_name = entry.file_name();
                fs::copy(&path, combined_dir.join(file_name))?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}
