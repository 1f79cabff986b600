//! Assemble an animated GIF preview from a directory of light frames.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin frame_gif -- \
//!     --frames-dir images_generated_light_guiding --output output.gif
//! ```

use clap::Parser;
use simulator::animation::assemble_gif;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble an animated GIF from a frame sequence")]
struct Args {
    /// Directory containing the light frames
    #[arg(long, default_value = "images_generated_light_guiding")]
    frames_dir: PathBuf,

    /// Output GIF path
    #[arg(long, default_value = "output.gif")]
    output: PathBuf,

    /// Per-frame duration in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    assemble_gif(&args.frames_dir, &args.output, args.delay_ms)?;
    println!("GIF saved as {}", args.output.display());
    Ok(())
}
