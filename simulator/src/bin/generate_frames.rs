//! Generate a base sequence of light and dark guiding frames.
//!
//! # Usage
//!
//! ```bash
//! # 20 light + 10 dark frames around a pointing, combined into one directory
//! cargo run --release --bin generate_frames -- \
//!     --ra 120.0 --dec -30.0 --num-light 20 --num-dark 10 \
//!     --combined-dir images_all_guiding_pixels
//!
//! # Reproducible run with a pinned seed
//! cargo run --release --bin generate_frames -- --seed 42
//! ```
//!
//! Light frames are a drifting synthetic star field over the sensor noise
//! floor; dark frames are the noise floor alone, timestamped after the light
//! sequence. Per-frame seeing is jittered around `--seeing`.

use chrono::Utc;
use clap::Parser;
use rand_distr::{Distribution, Normal};
use simulator::shared_args::RandomnessArgs;
use simulator::synthesis::{
    combine_folders, generate_dark_frames, generate_light_frames, CameraConfig, GenerationConfig,
    SkyModel, TelescopeConfig,
};
use shared::ImageSize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate simulated light and dark guiding frames")]
struct Args {
    /// Right ascension of the pointing in degrees
    #[arg(long, default_value_t = 120.0)]
    ra: f64,

    /// Declination of the pointing in degrees
    #[arg(long, default_value_t = -30.0)]
    dec: f64,

    /// Exposure time in seconds (also the frame cadence)
    #[arg(long, default_value_t = 2.0)]
    exposure: f64,

    /// Number of light frames
    #[arg(long, default_value_t = 20)]
    num_light: usize,

    /// Number of dark frames
    #[arg(long, default_value_t = 10)]
    num_dark: usize,

    /// Sensor width in pixels
    #[arg(long, default_value_t = 1024)]
    width: usize,

    /// Sensor height in pixels
    #[arg(long, default_value_t = 1024)]
    height: usize,

    /// Pixel pitch in micrometers
    #[arg(long, default_value_t = 13.0)]
    pitch: f64,

    /// Telescope focal length in millimeters
    #[arg(long, default_value_t = 1000.0)]
    focal_length: f64,

    /// Read noise RMS in electrons
    #[arg(long, default_value_t = 2.0)]
    read_noise: f64,

    /// Dark current in electrons/pixel/second
    #[arg(long, default_value_t = 0.2)]
    dark_current: f64,

    /// Pointing jitter radius in pixels
    #[arg(long, default_value_t = 5)]
    num_pixels_shift: usize,

    /// Median seeing FWHM in arcseconds
    #[arg(long, default_value_t = 2.0)]
    seeing: f64,

    /// Number of stars in the synthetic field
    #[arg(long, default_value_t = 25)]
    num_stars: usize,

    /// Directory for light frames
    #[arg(long, default_value = "images_generated_light_guiding")]
    light_dir: PathBuf,

    /// Directory for dark frames
    #[arg(long, default_value = "images_generated_dark_guiding")]
    dark_dir: PathBuf,

    /// Optional combined directory receiving copies of both sets
    #[arg(long)]
    combined_dir: Option<PathBuf>,

    #[command(flatten)]
    randomness: RandomnessArgs,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = args.randomness.rng();

    let camera = CameraConfig {
        size: ImageSize::from_width_height(args.width, args.height),
        pitch_um: args.pitch,
        read_noise: args.read_noise,
        dark_current: args.dark_current,
    };
    let telescope = TelescopeConfig {
        focal_length_mm: args.focal_length,
    };
    let config = GenerationConfig {
        ra_deg: args.ra,
        dec_deg: args.dec,
        exposure_time: args.exposure,
        base_date: Utc::now(),
        num_pixels_shift: args.num_pixels_shift,
    };

    // Star field spanning a little more than the sensor footprint
    let plate_scale = telescope.plate_scale_arcsec(&camera);
    let fov_deg = plate_scale / 3600.0 * args.width.max(args.height) as f64 * 0.6;
    let sky = SkyModel::synthesize(
        args.num_stars,
        args.ra,
        args.dec,
        fov_deg,
        (5_000.0, 100_000.0),
        &mut rng,
    );

    // Per-frame seeing jitter around the median
    let seeing_jitter = Normal::new(args.seeing, args.seeing * 0.1)?;
    let seeing: Vec<f64> = (0..args.num_light + args.num_dark)
        .map(|_| seeing_jitter.sample(&mut rng).max(0.5))
        .collect();

    generate_light_frames(
        &config,
        &camera,
        &telescope,
        &sky,
        &seeing,
        args.num_light,
        &args.light_dir,
        &mut rng,
    )?;
    generate_dark_frames(
        &config,
        &camera,
        args.num_dark,
        args.num_light,
        &args.dark_dir,
        &mut rng,
    )?;

    if let Some(combined_dir) = &args.combined_dir {
        let copied = combine_folders(&args.light_dir, &args.dark_dir, combined_dir)?;
        println!(
            "{copied} frames combined into {}",
            combined_dir.display()
        );
    }

    println!(
        "{} light and {} dark frames generated",
        args.num_light, args.num_dark
    );
    Ok(())
}
