//! Frame data model for simulated camera exposures.
//!
//! A frame pairs a 2D pixel grid with the acquisition metadata that survives
//! a round trip through FITS headers: the frame class (light or dark) and
//! the observation timestamp.

use chrono::{DateTime, NaiveDateTime, ParseError, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::image_size::ImageSize;

/// FITS header keyword carrying the frame class
pub const KEYWORD_IMAGE_TYPE: &str = "IMAGETYP";

/// FITS header keyword carrying the observation timestamp
pub const KEYWORD_OBSERVATION_DATE: &str = "DATE-OBS";

/// ISO-8601 with fixed six-digit microseconds, e.g. `2024-03-01T22:15:03.250000`
const OBSERVATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Classification of an exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameClass {
    /// Exposure containing simulated sky signal
    Light,
    /// Zero-signal calibration exposure capturing sensor noise only
    Dark,
}

impl FrameClass {
    /// Header value written under [`KEYWORD_IMAGE_TYPE`]
    pub fn keyword_value(&self) -> &'static str {
        match self {
            FrameClass::Light => "light",
            FrameClass::Dark => "dark",
        }
    }

    /// Parse a header value back into a frame class (case-insensitive)
    pub fn from_keyword_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(FrameClass::Light),
            "dark" => Some(FrameClass::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword_value())
    }
}

/// A single exposure: pixel data plus acquisition metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Pixel intensities, shape `(height, width)`
    pub data: Array2<f64>,
    /// Light or dark
    pub class: FrameClass,
    /// Acquisition timestamp (UTC)
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// Create a frame from pixel data and metadata
    pub fn new(data: Array2<f64>, class: FrameClass, timestamp: DateTime<Utc>) -> Self {
        Self {
            data,
            class,
            timestamp,
        }
    }

    /// Grid dimensions of the pixel data
    pub fn size(&self) -> ImageSize {
        ImageSize::of(&self.data)
    }

    /// Observation date string for the FITS header (microsecond precision)
    pub fn format_observation_date(&self) -> String {
        self.timestamp.format(OBSERVATION_DATE_FORMAT).to_string()
    }

    /// Parse an observation date string as written by [`Frame::format_observation_date`]
    pub fn parse_observation_date(value: &str) -> Result<DateTime<Utc>, ParseError> {
        NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
    }
}
