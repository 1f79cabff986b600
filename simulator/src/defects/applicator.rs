//! Defect application across frame sequences.
//!
//! Each applicator scans a source directory, overlays its defect onto every
//! frame (or, for telegraphic pixels, onto periodic frames only), and
//! persists the result to a separate output directory with the original
//! frame class and observation date preserved. Source files are never
//! mutated. Any I/O failure aborts the run immediately; a failure
//! mid-sequence leaves a partially populated output directory.

use log::info;
use ndarray::Array2;
use rand::Rng;
use shared::frame_io::{write_frame, FrameIoError, FrameRepository};
use shared::{Frame, FrameClass, ImageSize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::locator::{select_telegraphic_locations, BadPixelLocations};
use super::DefectError;

/// Errors from defect application runs
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error(transparent)]
    Defect(#[from] DefectError),
    #[error(transparent)]
    FrameIo(#[from] FrameIoError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no frames found under {}", .0.display())]
    EmptySource(PathBuf),
    #[error("frame shape {frame} does not match expected shape {expected}")]
    ShapeMismatch { expected: ImageSize, frame: ImageSize },
    #[error("got {values} defect values for {coordinates} coordinates")]
    ValueCountMismatch { coordinates: usize, values: usize },
}

/// Source and destination directories for a defect application run.
///
/// Both paths are explicit; nothing is hardcoded inside the applicators.
#[derive(Debug, Clone)]
pub struct ApplyConfig {
    /// Directory holding the unmodified frames
    pub source_dir: PathBuf,
    /// Directory receiving the modified frames (created if absent)
    pub output_dir: PathBuf,
}

/// Configuration of a telegraphic defect run.
#[derive(Debug, Clone)]
pub struct TelegraphicConfig {
    /// Directory holding the unmodified frames
    pub source_dir: PathBuf,
    /// Directory receiving the modified frames (created if absent)
    pub output_dir: PathBuf,
    /// Percentage of pixels toggling, in [0, 100]
    pub percentage: f64,
    /// Frames between toggles; the defect fires on frame indices that are
    /// non-zero multiples of this interval
    pub interval: usize,
    /// Stuck value the pixels drop to while toggled
    pub stuck_value: f64,
}

/// Overwrite the pixels at `coords` with the paired `values`
fn overwrite_pixels(data: &mut Array2<f64>, coords: &[(usize, usize)], values: &[f64]) {
    debug_assert_eq!(coords.len(), values.len());
    for (&(row, col), &value) in coords.iter().zip(values.iter()) {
        data[[row, col]] = value;
    }
}

/// Set the pixels at `coords` to a single stuck value
fn stick_pixels(data: &mut Array2<f64>, coords: &[(usize, usize)], value: f64) {
    for &(row, col) in coords {
        data[[row, col]] = value;
    }
}

fn output_path(dir: &Path, class: FrameClass, defect_kind: &str, index: usize) -> PathBuf {
    dir.join(format!("image_{class}_{defect_kind}_pixels_{}.fits", index + 1))
}

/// Apply one transformation to every light and dark frame under the source
/// directory, writing results with the given defect-kind filename tag.
fn apply_to_sequence<F>(
    source_dir: &Path,
    output_dir: &Path,
    defect_kind: &str,
    mut transform: F,
) -> Result<FrameRepository, ApplyError>
where
    F: FnMut(usize, &mut Frame) -> Result<(), ApplyError>,
{
    let repository = FrameRepository::scan(source_dir, 1)?;
    fs::create_dir_all(output_dir)?;

    for index in 0..repository.lights().len() {
        let mut frame = repository.load_light(index)?;
        transform(index, &mut frame)?;
        write_frame(
            output_path(output_dir, FrameClass::Light, defect_kind, index),
            &frame,
        )?;
    }

    for index in 0..repository.darks().len() {
        let mut frame = repository.load_dark(index)?;
        transform(index, &mut frame)?;
        write_frame(
            output_path(output_dir, FrameClass::Dark, defect_kind, index),
            &frame,
        )?;
    }

    Ok(repository)
}

fn check_value_counts(coords: &[(usize, usize)], values: &[f64]) -> Result<(), ApplyError> {
    if coords.len() != values.len() {
        return Err(ApplyError::ValueCountMismatch {
            coordinates: coords.len(),
            values: values.len(),
        });
    }
    Ok(())
}

fn check_frame_shape(expected: ImageSize, frame: &Frame) -> Result<(), ApplyError> {
    if frame.size() != expected {
        return Err(ApplyError::ShapeMismatch {
            expected,
            frame: frame.size(),
        });
    }
    Ok(())
}

/// Overlay static hot and dead defects onto every frame in a sequence.
///
/// Every light and dark frame gets the same hot values at the hot
/// coordinates and dead values at the dead coordinates. Each frame must
/// match `size`, the grid the locations were drawn from, and each value
/// slice must pair one-to-one with its coordinate set. Outputs are named
/// `image_{class}_hcw_pixels_{n}.fits`, 1-indexed in acquisition order, with
/// the source frame's class and observation date preserved.
pub fn apply_static_defects(
    config: &ApplyConfig,
    size: ImageSize,
    locations: &BadPixelLocations,
    hot_values: &[f64],
    dead_values: &[f64],
) -> Result<(), ApplyError> {
    check_value_counts(&locations.hot, hot_values)?;
    check_value_counts(&locations.dead, dead_values)?;

    let repository = apply_to_sequence(
        &config.source_dir,
        &config.output_dir,
        "hcw",
        |_, frame| {
            check_frame_shape(size, frame)?;
            overwrite_pixels(&mut frame.data, &locations.hot, hot_values);
            overwrite_pixels(&mut frame.data, &locations.dead, dead_values);
            Ok(())
        },
    )?;

    info!(
        "{} light and {} dark frames with bad pixels written to {}",
        repository.lights().len(),
        repository.darks().len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Overlay telegraphic defects onto periodic frames of a sequence.
///
/// One coordinate set covering `percentage` of the grid is selected once;
/// frame index `i` (0-based, per class) has those pixels stuck at
/// `stuck_value` only when `i % interval == 0 && i != 0`. All other frames
/// pass through unmodified. The very first frame is always left untouched.
/// Every frame must match the grid of the frame the coordinates were drawn
/// from. Outputs are named `image_{class}_guiding_bad_pixels_{n}.fits`.
pub fn apply_telegraphic_defects(
    config: &TelegraphicConfig,
    rng: &mut impl Rng,
) -> Result<(), ApplyError> {
    if config.interval == 0 {
        return Err(DefectError::InvalidInterval.into());
    }

    // Grid dimensions come from the first frame in the sequence
    let repository = FrameRepository::scan(&config.source_dir, 1)?;
    let reference = if !repository.lights().is_empty() {
        repository.load_light(0)?
    } else if !repository.darks().is_empty() {
        repository.load_dark(0)?
    } else {
        return Err(ApplyError::EmptySource(config.source_dir.clone()));
    };
    let size = reference.size();
    let coords = select_telegraphic_locations(size, config.percentage, rng)?;

    let interval = config.interval;
    let stuck_value = config.stuck_value;
    let repository = apply_to_sequence(
        &config.source_dir,
        &config.output_dir,
        "guiding_bad",
        |index, frame| {
            check_frame_shape(size, frame)?;
            if index % interval == 0 && index != 0 {
                stick_pixels(&mut frame.data, &coords, stuck_value);
            }
            Ok(())
        },
    )?;

    info!(
        "{} light and {} dark frames with telegraphic pixels written to {}",
        repository.lights().len(),
        repository.darks().len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Add the same warm-pixel bias array to every frame in a sequence.
///
/// The bias grid (computed once per camera) is added to light and dark
/// frames alike before persistence. Outputs are named
/// `image_{class}_warm_pixels_{n}.fits`.
pub fn apply_warm_bias(config: &ApplyConfig, bias: &Array2<u16>) -> Result<(), ApplyError> {
    let bias_size = {
        let (height, width) = bias.dim();
        ImageSize::from_width_height(width, height)
    };
    let bias_adu = bias.mapv(f64::from);

    let repository = apply_to_sequence(
        &config.source_dir,
        &config.output_dir,
        "warm",
        |_, frame| {
            check_frame_shape(bias_size, frame)?;
            frame
                .data
                .zip_mut_with(&bias_adu, |pixel, &offset| *pixel += offset);
            Ok(())
        },
    )?;

    info!(
        "{} light and {} dark frames with warm-pixel bias written to {}",
        repository.lights().len(),
        repository.darks().len(),
        config.output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::frame_io::read_frame;
    use tempfile::tempdir;

    fn write_sequence(dir: &Path, lights: usize, darks: usize, size: ImageSize) {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        for i in 0..lights {
            let data = Array2::from_shape_fn(size.shape(), |(row, col)| {
                (i * 1000 + row * size.width + col) as f64
            });
            let frame = Frame::new(data, FrameClass::Light, base + Duration::seconds(i as i64));
            write_frame(dir.join(format!("raw_image_light_{}.fits", i + 1)), &frame).unwrap();
        }
        for i in 0..darks {
            let data = Array2::from_elem(size.shape(), 100.0 + i as f64);
            let frame = Frame::new(
                data,
                FrameClass::Dark,
                base + Duration::seconds((lights + i) as i64),
            );
            write_frame(dir.join(format!("raw_image_dark_{}.fits", i + 1)), &frame).unwrap();
        }
    }

    #[test]
    fn test_static_defects_applied_to_all_frames() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let size = ImageSize::from_width_height(6, 6);
        write_sequence(source.path(), 2, 1, size);

        let locations = BadPixelLocations {
            hot: vec![(0, 0), (3, 4)],
            dead: vec![(5, 5)],
        };
        let hot_values = vec![60_000.0, 58_000.0];
        let dead_values = vec![2.0];

        let config = ApplyConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
        };
        apply_static_defects(&config, size, &locations, &hot_values, &dead_values).unwrap();

        for (name, class) in [
            ("image_light_hcw_pixels_1.fits", FrameClass::Light),
            ("image_light_hcw_pixels_2.fits", FrameClass::Light),
            ("image_dark_hcw_pixels_1.fits", FrameClass::Dark),
        ] {
            let frame = read_frame(output.path().join(name)).unwrap();
            assert_eq!(frame.class, class);
            assert_eq!(frame.data[[0, 0]], 60_000.0);
            assert_eq!(frame.data[[3, 4]], 58_000.0);
            assert_eq!(frame.data[[5, 5]], 2.0);
        }
    }

    #[test]
    fn test_static_defects_leave_other_pixels_untouched() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let size = ImageSize::from_width_height(5, 4);
        write_sequence(source.path(), 1, 0, size);

        let locations = BadPixelLocations {
            hot: vec![(1, 1)],
            dead: vec![(2, 3)],
        };
        let config = ApplyConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
        };
        apply_static_defects(&config, size, &locations, &[55_000.0], &[0.0]).unwrap();

        let original = read_frame(source.path().join("raw_image_light_1.fits")).unwrap();
        let modified = read_frame(output.path().join("image_light_hcw_pixels_1.fits")).unwrap();

        assert_eq!(modified.timestamp, original.timestamp);
        for row in 0..4 {
            for col in 0..5 {
                if (row, col) == (1, 1) || (row, col) == (2, 3) {
                    continue;
                }
                assert_eq!(
                    modified.data[[row, col]],
                    original.data[[row, col]],
                    "pixel ({row}, {col}) changed"
                );
            }
        }
    }

    #[test]
    fn test_static_defects_reject_mixed_frame_sizes() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();

        // A stray cropped frame alongside the full-size one
        let full = Frame::new(Array2::zeros((8, 8)), FrameClass::Light, base);
        write_frame(source.path().join("raw_image_light_1.fits"), &full).unwrap();
        let cropped = Frame::new(
            Array2::zeros((4, 4)),
            FrameClass::Light,
            base + Duration::seconds(1),
        );
        write_frame(source.path().join("raw_image_light_2.fits"), &cropped).unwrap();

        let size = ImageSize::from_width_height(8, 8);
        let locations = BadPixelLocations {
            hot: vec![(7, 7)],
            dead: vec![],
        };
        let config = ApplyConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
        };
        assert!(matches!(
            apply_static_defects(&config, size, &locations, &[60_000.0], &[]),
            Err(ApplyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_static_defects_value_count_mismatch() {
        let size = ImageSize::from_width_height(8, 8);
        let locations = BadPixelLocations {
            hot: vec![(0, 0), (1, 1)],
            dead: vec![],
        };
        let config = ApplyConfig {
            source_dir: PathBuf::from("unused"),
            output_dir: PathBuf::from("unused"),
        };
        assert!(matches!(
            apply_static_defects(&config, size, &locations, &[60_000.0], &[]),
            Err(ApplyError::ValueCountMismatch {
                coordinates: 2,
                values: 1,
            })
        ));
    }

    #[test]
    fn test_telegraphic_fires_on_nonzero_interval_multiples() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let size = ImageSize::from_width_height(8, 8);
        write_sequence(source.path(), 12, 0, size);

        let config = TelegraphicConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            percentage: 10.0,
            interval: 5,
            stuck_value: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(31);
        apply_telegraphic_defects(&config, &mut rng).unwrap();

        // The coordinate selection consumed the same seeded stream
        let mut check_rng = StdRng::seed_from_u64(31);
        let coords = select_telegraphic_locations(size, 10.0, &mut check_rng).unwrap();
        assert!(!coords.is_empty());

        for index in 0..12 {
            let original = read_frame(
                source
                    .path()
                    .join(format!("raw_image_light_{}.fits", index + 1)),
            )
            .unwrap();
            let modified = read_frame(
                output
                    .path()
                    .join(format!("image_light_guiding_bad_pixels_{}.fits", index + 1)),
            )
            .unwrap();

            let should_fire = index == 5 || index == 10;
            for &(row, col) in &coords {
                if should_fire {
                    assert_eq!(
                        modified.data[[row, col]],
                        0.0,
                        "frame {index} should be stuck at ({row}, {col})"
                    );
                } else {
                    assert_eq!(
                        modified.data[[row, col]],
                        original.data[[row, col]],
                        "frame {index} should pass through at ({row}, {col})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_telegraphic_rejects_zero_interval() {
        let config = TelegraphicConfig {
            source_dir: PathBuf::from("unused"),
            output_dir: PathBuf::from("unused"),
            percentage: 1.0,
            interval: 0,
            stuck_value: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(32);
        assert!(matches!(
            apply_telegraphic_defects(&config, &mut rng),
            Err(ApplyError::Defect(DefectError::InvalidInterval))
        ));
    }

    #[test]
    fn test_telegraphic_rejects_mixed_frame_sizes() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();

        let full = Frame::new(Array2::zeros((8, 8)), FrameClass::Light, base);
        write_frame(source.path().join("raw_image_light_1.fits"), &full).unwrap();
        let cropped = Frame::new(
            Array2::zeros((4, 4)),
            FrameClass::Light,
            base + Duration::seconds(1),
        );
        write_frame(source.path().join("raw_image_light_2.fits"), &cropped).unwrap();

        let config = TelegraphicConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            percentage: 10.0,
            interval: 5,
            stuck_value: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(34);
        // The cropped frame never fires, but the mismatch still fails fast
        assert!(matches!(
            apply_telegraphic_defects(&config, &mut rng),
            Err(ApplyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_telegraphic_empty_source_is_an_error() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let config = TelegraphicConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            percentage: 1.0,
            interval: 5,
            stuck_value: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(33);
        assert!(matches!(
            apply_telegraphic_defects(&config, &mut rng),
            Err(ApplyError::EmptySource(_))
        ));
    }

    #[test]
    fn test_warm_bias_added_to_lights_and_darks() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        let size = ImageSize::from_width_height(4, 4);
        write_sequence(source.path(), 1, 1, size);

        let bias = Array2::from_elem(size.shape(), 25u16);
        let config = ApplyConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
        };
        apply_warm_bias(&config, &bias).unwrap();

        let original_light = read_frame(source.path().join("raw_image_light_1.fits")).unwrap();
        let modified_light =
            read_frame(output.path().join("image_light_warm_pixels_1.fits")).unwrap();
        for (modified, original) in modified_light.data.iter().zip(original_light.data.iter()) {
            assert_eq!(*modified, original + 25.0);
        }

        let modified_dark = read_frame(output.path().join("image_dark_warm_pixels_1.fits")).unwrap();
        assert_eq!(modified_dark.class, FrameClass::Dark);
        assert_eq!(modified_dark.data[[0, 0]], 125.0);
    }

    #[test]
    fn test_warm_bias_shape_mismatch() {
        let source = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_sequence(source.path(), 1, 0, ImageSize::from_width_height(4, 4));

        let bias = Array2::from_elem((8, 8), 1u16);
        let config = ApplyConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
        };
        assert!(matches!(
            apply_warm_bias(&config, &bias),
            Err(ApplyError::ShapeMismatch { .. })
        ));
    }
}
