// SPDX-License-Identifier: GPL-3.0-only

//! Depth map to point cloud reconstruction
//!
//! Back-projection produces a point grid, the normal estimator runs over
//! that grid, and the assembler turns both (plus optional color mapping)
//! into a [`PointCloud`] or [`Mesh`].

mod assembler;
mod backproject;
mod mapper;
mod normals;

pub use assembler::{
    Mesh, PointCloud, assemble_mesh, assemble_mesh_default, assemble_point_cloud,
};
pub use backproject::{back_project, back_project_offset_raster, back_project_xz};
pub use mapper::{ColorDepthLookup, map_to_color};
pub use normals::{NormalParams, estimate_normals};
