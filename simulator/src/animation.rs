//! Animated GIF preview assembly.
//!
//! Turns a directory of light frames into a quick-look animation: each frame
//! is min-max normalized to the 8-bit range independently, then encoded into
//! an infinitely looping GIF with a fixed per-frame delay.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame as GifFrame, Rgba, RgbaImage};
use log::info;
use ndarray::Array2;
use shared::frame_io::{FrameIoError, FrameRepository};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from GIF assembly
#[derive(Error, Debug)]
pub enum AnimationError {
    #[error(transparent)]
    FrameIo(#[from] FrameIoError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GIF encoding error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("no light frames found under {0}")]
    NoFrames(PathBuf),
}

/// Min-max normalize a pixel grid to 8-bit grayscale.
///
/// A flat frame (max == min) maps to all zeros.
fn normalize_to_u8(data: &Array2<f64>) -> RgbaImage {
    let (height, width) = data.dim();
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let value = data[[y as usize, x as usize]];
        let level = if range > 0.0 {
            ((value - min) / range * 255.0) as u8
        } else {
            0
        };
        Rgba([level, level, level, 255])
    })
}

/// Assemble the light frames under `frames_dir` into an animated GIF.
///
/// Frames appear in acquisition order with `delay_ms` milliseconds each and
/// the animation loops forever.
pub fn assemble_gif(
    frames_dir: &Path,
    output_path: &Path,
    delay_ms: u32,
) -> Result<(), AnimationError> {
    let repository = FrameRepository::scan(frames_dir, 1)?;
    if repository.lights().is_empty() {
        return Err(AnimationError::NoFrames(frames_dir.to_path_buf()));
    }

    let file = File::create(output_path)?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;

    for index in 0..repository.lights().len() {
        let frame = repository.load_light(index)?;
        let rgba = normalize_to_u8(&frame.data);
        let gif_frame = GifFrame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
        encoder.encode_frame(gif_frame)?;
    }

    info!(
        "GIF with {} frames saved as {}",
        repository.lights().len(),
        output_path.display()
    );
    Ok(())
}
