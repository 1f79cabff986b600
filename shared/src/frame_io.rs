//! FITS persistence for simulated frames.
//!
//! Writes a frame as a single f64 image HDU carrying the `IMAGETYP` and
//! `DATE-OBS` keywords, and reads it back with metadata intact. The
//! [`FrameRepository`] scans a directory (depth-limited), classifies each
//! FITS file by its `IMAGETYP` keyword, and orders frames by observation
//! date so 1-indexed output numbering follows acquisition order.
//!
//! FITS stores images with a bottom-left origin; arrays are flipped
//! vertically on the way in and out so in-memory data keeps the ndarray
//! top-left convention.

use fitsio::compat::fitsfile::FitsFile;
use fitsio::compat::hdu::FitsHdu;
use fitsio::compat::images::{ImageDescription, ImageType, ReadImage, WriteImage};
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::frame::{Frame, FrameClass, KEYWORD_IMAGE_TYPE, KEYWORD_OBSERVATION_DATE};
use crate::image_size::ImageSize;

/// Errors from frame persistence and repository scans
#[derive(Error, Debug)]
pub enum FrameIoError {
    #[error("FITS I/O error: {0}")]
    Fits(#[from] fitsio::compat::errors::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no 2-D image HDU in {}", .0.display())]
    NoImageHdu(PathBuf),
    #[error("cannot reshape image data from {}", .0.display())]
    MalformedImage(PathBuf),
    #[error("missing header keyword {keyword} in {}", path.display())]
    MissingKeyword { keyword: &'static str, path: PathBuf },
    #[error("unrecognized {KEYWORD_IMAGE_TYPE} value {value:?} in {}", path.display())]
    UnknownFrameClass { value: String, path: PathBuf },
    #[error("invalid {KEYWORD_OBSERVATION_DATE} value {value:?} in {}: {source}", path.display())]
    InvalidObservationDate {
        value: String,
        path: PathBuf,
        source: chrono::ParseError,
    },
    #[error("frame index {index} out of range ({count} {class} frames)")]
    IndexOutOfRange {
        index: usize,
        count: usize,
        class: FrameClass,
    },
}

/// Name of the image HDU written by [`write_frame`]
const FRAME_HDU_NAME: &str = "FRAME";

/// Write a frame to `path`, overwriting any existing file.
///
/// The pixel grid is stored as a double-precision image HDU; the frame class
/// and observation date land in the `IMAGETYP` and `DATE-OBS` keywords.
pub fn write_frame<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<(), FrameIoError> {
    let (height, width) = frame.data.dim();
    let mut fptr = FitsFile::create(&path).overwrite().open()?;

    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: vec![width, height],
    };
    let hdu = fptr.create_image(FRAME_HDU_NAME, &description)?;

    // Flip rows to the FITS bottom-left origin
    let flipped = frame.data.slice(ndarray::s![..;-1, ..]);
    let flat: Vec<f64> = flipped.iter().copied().collect();
    f64::write_image(&mut fptr, &hdu, &flat)?;

    hdu.write_key(
        &mut fptr,
        KEYWORD_IMAGE_TYPE,
        &frame.class.keyword_value().to_string(),
    )?;
    hdu.write_key(
        &mut fptr,
        KEYWORD_OBSERVATION_DATE,
        &frame.format_observation_date(),
    )?;

    Ok(())
}

/// Find the first 2-D image HDU in an open FITS file
fn find_image_hdu(fptr: &FitsFile, path: &Path) -> Result<FitsHdu, FrameIoError> {
    let mut hdu_idx = 0;
    while let Ok(hdu) = fptr.hdu(hdu_idx) {
        let naxis = hdu.read_key::<i64>(fptr, "NAXIS").unwrap_or(0);
        if naxis == 2 {
            return Ok(hdu);
        }
        hdu_idx += 1;
    }
    Err(FrameIoError::NoImageHdu(path.to_path_buf()))
}

fn read_class_and_date(
    fptr: &FitsFile,
    hdu: &FitsHdu,
    path: &Path,
) -> Result<(FrameClass, chrono::DateTime<chrono::Utc>), FrameIoError> {
    let class_value =
        hdu.read_key::<String>(fptr, KEYWORD_IMAGE_TYPE)
            .map_err(|_| FrameIoError::MissingKeyword {
                keyword: KEYWORD_IMAGE_TYPE,
                path: path.to_path_buf(),
            })?;
    let class =
        FrameClass::from_keyword_value(&class_value).ok_or_else(|| FrameIoError::UnknownFrameClass {
            value: class_value.clone(),
            path: path.to_path_buf(),
        })?;

    let date_value =
        hdu.read_key::<String>(fptr, KEYWORD_OBSERVATION_DATE)
            .map_err(|_| FrameIoError::MissingKeyword {
                keyword: KEYWORD_OBSERVATION_DATE,
                path: path.to_path_buf(),
            })?;
    let timestamp = Frame::parse_observation_date(&date_value).map_err(|source| {
        FrameIoError::InvalidObservationDate {
            value: date_value,
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok((class, timestamp))
}

/// Read a frame written by [`write_frame`].
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<Frame, FrameIoError> {
    let path = path.as_ref();
    let fptr = FitsFile::open(path)?;
    let hdu = find_image_hdu(&fptr, path)?;

    let (class, timestamp) = read_class_and_date(&fptr, &hdu, path)?;

    let width = hdu.read_key::<i64>(&fptr, "NAXIS1").unwrap_or(0) as usize;
    let height = hdu.read_key::<i64>(&fptr, "NAXIS2").unwrap_or(0) as usize;

    let pixels = f64::read_image(&fptr, &hdu)?;
    let stored = Array2::from_shape_vec((height, width), pixels)
        .map_err(|_| FrameIoError::MalformedImage(path.to_path_buf()))?;

    // Undo the bottom-left origin flip applied on write
    let flipped_view = stored.slice(ndarray::s![..;-1, ..]);
    let data = Array2::from_shape_vec((height, width), flipped_view.iter().copied().collect())
        .map_err(|_| FrameIoError::MalformedImage(path.to_path_buf()))?;

    Ok(Frame::new(data, class, timestamp))
}

/// Read only the grid dimensions of a frame file, without loading pixels
pub fn read_frame_size<P: AsRef<Path>>(path: P) -> Result<ImageSize, FrameIoError> {
    let path = path.as_ref();
    let fptr = FitsFile::open(path)?;
    let hdu = find_image_hdu(&fptr, path)?;

    let width = hdu.read_key::<i64>(&fptr, "NAXIS1").unwrap_or(0) as usize;
    let height = hdu.read_key::<i64>(&fptr, "NAXIS2").unwrap_or(0) as usize;
    Ok(ImageSize::from_width_height(width, height))
}

/// Read only the metadata (class and observation date) of a frame file
pub fn read_frame_header<P: AsRef<Path>>(
    path: P,
) -> Result<(FrameClass, chrono::DateTime<chrono::Utc>), FrameIoError> {
    let path = path.as_ref();
    let fptr = FitsFile::open(path)?;
    let hdu = find_image_hdu(&fptr, path)?;
    read_class_and_date(&fptr, &hdu, path)
}

/// Directory scan of light and dark frames, ordered by observation date.
#[derive(Debug, Clone)]
pub struct FrameRepository {
    lights: Vec<PathBuf>,
    darks: Vec<PathBuf>,
}

impl FrameRepository {
    /// Scan `dir` for FITS frames, descending at most `depth` levels of
    /// subdirectories (0 scans only `dir` itself).
    ///
    /// Every `.fits` file must carry a readable `IMAGETYP`/`DATE-OBS` header;
    /// a malformed file aborts the scan (fail-fast, no partial recovery).
    pub fn scan<P: AsRef<Path>>(dir: P, depth: usize) -> Result<Self, FrameIoError> {
        let mut entries: Vec<(PathBuf, FrameClass, chrono::DateTime<chrono::Utc>)> = Vec::new();
        collect_fits_files(dir.as_ref(), depth, &mut entries)?;
        entries.sort_by_key(|(_, _, timestamp)| *timestamp);

        let mut lights = Vec::new();
        let mut darks = Vec::new();
        for (path, class, _) in entries {
            match class {
                FrameClass::Light => lights.push(path),
                FrameClass::Dark => darks.push(path),
            }
        }

        Ok(Self { lights, darks })
    }

    /// Paths of light frames in acquisition order
    pub fn lights(&self) -> &[PathBuf] {
        &self.lights
    }

    /// Paths of dark frames in acquisition order
    pub fn darks(&self) -> &[PathBuf] {
        &self.darks
    }

    /// True when the scan found no frames of either class
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty() && self.darks.is_empty()
    }

    /// Load the `index`-th light frame
    pub fn load_light(&self, index: usize) -> Result<Frame, FrameIoError> {
        let path = self
            .lights
            .get(index)
            .ok_or(FrameIoError::IndexOutOfRange {
                index,
                count: self.lights.len(),
                class: FrameClass::Light,
            })?;
        read_frame(path)
    }

    /// Load the `index`-th dark frame
    pub fn load_dark(&self, index: usize) -> Result<Frame, FrameIoError> {
        let path = self.darks.get(index).ok_or(FrameIoError::IndexOutOfRange {
            index,
            count: self.darks.len(),
            class: FrameClass::Dark,
        })?;
        read_frame(path)
    }
}

fn collect_fits_files(
    dir: &Path,
    depth: usize,
    entries: &mut Vec<(PathBuf, FrameClass, chrono::DateTime<chrono::Utc>)>,
) -> Result<(), FrameIoError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                collect_fits_files(&path, depth - 1, entries)?;
            }
            continue;
        }
        let is_fits = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("fits"))
            .unwrap_or(false);
        if !is_fits {
            continue;
        }
        let (class, timestamp) = read_frame_header(&path)?;
        entries.push((path, class, timestamp));
    }
    Ok(())
}
