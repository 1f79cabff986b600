//! Shared components for the defect-sim workspace.
//!
//! Provides the frame data model, FITS frame persistence, and noise
//! generation primitives used by the simulator crate.

pub mod frame;
#[cfg(feature = "frame-writer")]
pub mod frame_io;
pub mod image_proc;
pub mod image_size;

pub use frame::{Frame, FrameClass};
pub use image_size::ImageSize;
