// SPDX-License-Identifier: GPL-3.0-only

//! Reconstruction constants - Single source of truth
//!
//! Thresholds, sentinels and defaults shared by the back-projector, normal
//! estimator, mesh assembler, colorizer and filters.

/// Depth-continuity threshold for normal accumulation (millimeters)
pub const NORMAL_DISCONTINUITY_MM: f32 = 5.0;

/// Minimum corner depth for a triangle to contribute to normals (millimeters)
pub const NORMAL_MIN_DEPTH_MM: f32 = 0.1;

/// Accumulated normals shorter than this are left as the zero sentinel
pub const NORMAL_MIN_MAGNITUDE: f32 = 1e-5;

/// Depth-continuity threshold for mesh faces (millimeters)
pub const FACE_DISCONTINUITY_MM: f32 = 10.0;

/// Sanity bound for center/offset rasters: values at or above are rejected
pub const OFFSET_RASTER_SANITY_BOUND: f32 = 90000.0;

/// Filtered values must exceed this to be written back
pub const FILTER_VALID_THRESHOLD: f32 = 1.0;

/// Sentinel for "no output vertex" in dense raster index maps
pub const INDEX_UNSET: u32 = u32::MAX;

/// Colorizer defaults
pub mod colorizer {
    /// Lookup table entries (N + 1 for N = 4000 steps)
    pub const TABLE_SIZE: usize = 4001;
    /// Default near bound of the colorized range (millimeters)
    pub const RANGE_MIN_MM: f32 = 0.0;
    /// Default far bound of the colorized range (millimeters)
    pub const RANGE_MAX_MM: f32 = 5000.0;
}

/// Kinect v1 camera intrinsics and depth coefficients
///
/// Reference resolution: 640x480 (medium resolution depth mode)
pub mod kinect {
    /// Focal length X (pixels) at 640x480 base resolution
    pub const FX: f32 = 594.21;
    /// Focal length Y (pixels) at 640x480 base resolution
    pub const FY: f32 = 591.04;
    /// Principal point X (pixels) at 640x480 base resolution
    pub const CX: f32 = 339.5;
    /// Principal point Y (pixels) at 640x480 base resolution
    pub const CY: f32 = 242.7;

    /// Disparity-to-depth coefficient A
    /// Used in formula: depth_m = 1.0 / (raw * DEPTH_COEFF_A + DEPTH_COEFF_B)
    pub const DEPTH_COEFF_A: f32 = -0.0030711;
    /// Disparity-to-depth coefficient B
    pub const DEPTH_COEFF_B: f32 = 3.3309495;

    /// Raw disparity values at or above this are the sensor's "no return" marker
    pub const DISPARITY_INVALID: u16 = 65472;

    /// Base width for intrinsics calculation
    pub const BASE_WIDTH: u32 = 640;
    /// Base height for intrinsics calculation
    pub const BASE_HEIGHT: u32 = 480;
}

/// File extensions understood by the exporter
pub mod file_formats {
    pub const PLY: &str = "ply";
    pub const MESH: &str = "mesh";
    pub const CSV: &str = "csv";
    pub const LAS: &str = "las";
    pub const GLB: &str = "glb";
    /// Side file next to positional exports
    pub const MAP: &str = "map";
    /// Texture written next to `.mesh` exports
    pub const BMP: &str = "bmp";
}

/// Build information
pub mod app_info {
    /// Version string stamped by build.rs
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
