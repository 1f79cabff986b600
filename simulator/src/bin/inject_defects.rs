//! Inject sensor defects into a directory of generated frames.
//!
//! # Usage
//!
//! ```bash
//! # Permanent hot/dead stuck pixels on every frame
//! cargo run --release --bin inject_defects -- static \
//!     --source-dir images_all_guiding_pixels \
//!     --output-dir images_all_guiding_hot_cold_warm_pixels \
//!     --hot-percentage 0.5 --dead-percentage 0.5 \
//!     --hot-peak 50000 --hot-std-dev 1000000 --hot-upper-limit 65535
//!
//! # Telegraphic pixels toggling every 5th frame
//! cargo run --release --bin inject_defects -- telegraphic \
//!     --source-dir images_all_guiding_pixels \
//!     --output-dir images_all_guiding_bad_pixels \
//!     --percentage 0.1 --interval 5
//!
//! # Full-grid warm-pixel bias
//! cargo run --release --bin inject_defects -- warm \
//!     --source-dir images_all_guiding_pixels \
//!     --output-dir images_all_guiding_warm_pixels \
//!     --mean-warm 300 --std-warm 20 --skewness 5
//! ```
//!
//! All subcommands read frames from the source directory and write modified
//! copies to the output directory; sources are never touched. Pass `--seed`
//! to reproduce a defect pattern.

use clap::{Parser, Subcommand};
use shared::frame_io::{read_frame_size, FrameRepository};
use shared::ImageSize;
use simulator::defects::{
    apply_static_defects, apply_telegraphic_defects, apply_warm_bias, default_attempt_budget,
    sample_dead_values, sample_hot_values, select_bad_pixel_locations, warm_pixel_bias,
    ApplyConfig, DeadPixelDistribution, HotPixelDistribution, TelegraphicConfig, WarmPixelModel,
};
use simulator::shared_args::RandomnessArgs;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inject pixel-level sensor defects into frame sequences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Permanent hot and dead stuck pixels applied to every frame
    Static {
        /// Directory containing the raw frames
        #[arg(long)]
        source_dir: PathBuf,

        /// Directory receiving the modified frames
        #[arg(long)]
        output_dir: PathBuf,

        /// Percentage of pixels to set hot, in [0, 100]
        #[arg(long, default_value_t = 0.5)]
        hot_percentage: f64,

        /// Percentage of pixels to set dead, in [0, 100]
        #[arg(long, default_value_t = 0.5)]
        dead_percentage: f64,

        /// Mean of the hot-pixel Gaussian
        #[arg(long, default_value_t = 50_000.0)]
        hot_peak: f64,

        /// Variance-convention spread of the hot-pixel Gaussian
        /// (sampling scale is its square root)
        #[arg(long, default_value_t = 1_000_000.0)]
        hot_std_dev: f64,

        /// Hot draws above this value are rejected
        #[arg(long, default_value_t = 65_535.0)]
        hot_upper_limit: f64,

        /// Mean of the dead-pixel Gaussian
        #[arg(long, default_value_t = 0.0)]
        dead_mean: f64,

        /// Scale of the dead-pixel Gaussian
        #[arg(long, default_value_t = 10.0)]
        dead_std_dev: f64,

        /// Dead draws below this value are rejected
        #[arg(long, default_value_t = 0.0)]
        dead_lower_limit: f64,

        #[command(flatten)]
        randomness: RandomnessArgs,
    },

    /// Telegraphic pixels stuck at a fixed value on periodic frames
    Telegraphic {
        /// Directory containing the raw frames
        #[arg(long)]
        source_dir: PathBuf,

        /// Directory receiving the modified frames
        #[arg(long)]
        output_dir: PathBuf,

        /// Percentage of pixels toggling, in [0, 100]
        #[arg(long, default_value_t = 0.1)]
        percentage: f64,

        /// Frames between toggles (the first frame never fires)
        #[arg(long, default_value_t = 5)]
        interval: usize,

        /// Stuck value the pixels drop to
        #[arg(long, default_value_t = 0.0)]
        stuck_value: f64,

        #[command(flatten)]
        randomness: RandomnessArgs,
    },

    /// Full-grid warm-pixel bias added to every frame
    Warm {
        /// Directory containing the raw frames
        #[arg(long)]
        source_dir: PathBuf,

        /// Directory receiving the modified frames
        #[arg(long)]
        output_dir: PathBuf,

        /// Target mean of the bias in ADU
        #[arg(long, default_value_t = 300.0)]
        mean_warm: f64,

        /// Target standard deviation of the bias in ADU
        #[arg(long, default_value_t = 20.0)]
        std_warm: f64,

        /// Skewness of the excess-current profile
        #[arg(long, default_value_t = 5.0)]
        skewness: f64,

        /// Dark current in electrons/pixel/second
        #[arg(long, default_value_t = 0.2)]
        dark_current: f64,

        /// Exposure time in seconds
        #[arg(long, default_value_t = 2.0)]
        exposure: f64,

        #[command(flatten)]
        randomness: RandomnessArgs,
    },
}

/// Grid dimensions of the first frame under a directory, header read only
fn sensor_size(source_dir: &PathBuf) -> Result<ImageSize, Box<dyn Error>> {
    let repository = FrameRepository::scan(source_dir, 1)?;
    let path = repository
        .lights()
        .first()
        .or_else(|| repository.darks().first())
        .ok_or_else(|| format!("no frames found under {}", source_dir.display()))?;
    Ok(read_frame_size(path)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Static {
            source_dir,
            output_dir,
            hot_percentage,
            dead_percentage,
            hot_peak,
            hot_std_dev,
            hot_upper_limit,
            dead_mean,
            dead_std_dev,
            dead_lower_limit,
            randomness,
        } => {
            let mut rng = randomness.rng();
            let size = sensor_size(&source_dir)?;

            let locations =
                select_bad_pixel_locations(size, hot_percentage, dead_percentage, &mut rng)?;
            let hot_distribution = HotPixelDistribution {
                peak: hot_peak,
                std_dev: hot_std_dev,
                upper_limit: hot_upper_limit,
            };
            let dead_distribution = DeadPixelDistribution {
                mean: dead_mean,
                std_dev: dead_std_dev,
                lower_limit: dead_lower_limit,
            };
            let hot_values = sample_hot_values(
                &hot_distribution,
                locations.hot.len(),
                default_attempt_budget(locations.hot.len()),
                &mut rng,
            )?;
            let dead_values = sample_dead_values(
                &dead_distribution,
                locations.dead.len(),
                default_attempt_budget(locations.dead.len()),
                &mut rng,
            )?;

            let config = ApplyConfig {
                source_dir,
                output_dir,
            };
            apply_static_defects(&config, size, &locations, &hot_values, &dead_values)?;
            println!(
                "light and dark frames with bad pixels saved in {}",
                config.output_dir.display()
            );
        }

        Commands::Telegraphic {
            source_dir,
            output_dir,
            percentage,
            interval,
            stuck_value,
            randomness,
        } => {
            let mut rng = randomness.rng();
            let config = TelegraphicConfig {
                source_dir,
                output_dir,
                percentage,
                interval,
                stuck_value,
            };
            apply_telegraphic_defects(&config, &mut rng)?;
            println!(
                "light and dark frames with telegraphic pixels saved in {}",
                config.output_dir.display()
            );
        }

        Commands::Warm {
            source_dir,
            output_dir,
            mean_warm,
            std_warm,
            skewness,
            dark_current,
            exposure,
            randomness,
        } => {
            let mut rng = randomness.rng();
            let size = sensor_size(&source_dir)?;

            let model = WarmPixelModel {
                mean_warm,
                std_warm,
                skewness,
                dark_current,
                exposure_time: exposure,
            };
            let bias = warm_pixel_bias(size, &model, &mut rng)?;

            let config = ApplyConfig {
                source_dir,
                output_dir,
            };
            apply_warm_bias(&config, &bias)?;
            println!(
                "light and dark frames with warm-pixel bias saved in {}",
                config.output_dir.display()
            );
        }
    }

    Ok(())
}
