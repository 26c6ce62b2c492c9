// SPDX-License-Identifier: GPL-3.0-only

//! depth-cloud - Depth map to point cloud and mesh reconstruction
//!
//! This library turns depth rasters from RGB-D sensors into 3D geometry,
//! optionally textured from a companion color stream, and writes it out in
//! common interchange formats.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`camera`]: Intrinsics, extrinsics and calibration bundles
//! - [`raster`]: Borrowed depth rasters over any numeric pixel type
//! - [`reconstruction`]: Back-projection, color mapping, normals and assembly
//! - [`export`]: PLY, mesh, CSV, positional, LAS and GLB writers
//! - [`colorizer`]: Depth to RGB visualization
//! - [`filters`]: Spatial denoising of depth rasters
//! - [`pipeline`]: One-call reconstruction driven by [`Config`]
//!
//! # Example
//!
//! ```no_run
//! use depth_cloud::{Calibration, Config, DepthRaster, Intrinsics, Reconstructor};
//!
//! let depth = vec![1000u16; 640 * 480];
//! let raster = DepthRaster::new(&depth, 640, 480, 1.0)?;
//! let reconstructor = Reconstructor::new(Config::default(), Calibration::depth_only(Intrinsics::kinect()));
//! let cloud = reconstructor.point_cloud(&raster)?;
//! depth_cloud::export::export_to_file("frame.ply", &cloud, None, &Default::default())?;
//! # Ok::<(), depth_cloud::DepthCloudError>(())
//! ```

pub mod camera;
pub mod colorizer;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod filters;
pub mod geometry;
pub mod pipeline;
pub mod raster;
pub mod reconstruction;

// Re-export commonly used types
pub use camera::{Calibration, ColorCalibration, Extrinsics, Intrinsics};
pub use colorizer::{ColorRamp, Colorizer, RampKind};
pub use config::Config;
pub use errors::{DepthCloudError, DepthCloudResult, ExportError, FilterError, MappingError};
pub use export::{ExportOptions, Texture};
pub use filters::{FilterKind, SpatialFilter};
pub use geometry::{Normal3, Point3, TexCoord};
pub use pipeline::Reconstructor;
pub use raster::{DepthRaster, DepthSample};
pub use reconstruction::{Mesh, PointCloud};
