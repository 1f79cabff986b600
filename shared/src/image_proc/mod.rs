//! Image processing primitives shared across the workspace

pub mod noise;
