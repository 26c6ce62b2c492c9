// SPDX-License-Identifier: GPL-3.0-only

//! Frame reconstruction pipeline
//!
//! Runs the stages in order for one depth frame: optional denoising,
//! back-projection, normal estimation, then point cloud or mesh assembly
//! with optional color mapping.

use crate::camera::Calibration;
use crate::config::Config;
use crate::errors::DepthCloudResult;
use crate::geometry::{Normal3, Point3};
use crate::raster::{DepthRaster, DepthSample};
use crate::reconstruction::{
    Mesh, PointCloud, assemble_mesh, assemble_point_cloud, back_project, estimate_normals,
};
use image::RgbImage;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reconstructs depth frames with a fixed configuration and calibration
#[derive(Debug, Clone)]
pub struct Reconstructor {
    config: Config,
    calibration: Calibration,
}

impl Reconstructor {
    pub fn new(config: Config, calibration: Calibration) -> Self {
        if !calibration.depth.is_valid() {
            warn!(depth = ?calibration.depth, "Depth intrinsics look invalid");
        }
        Self {
            config,
            calibration,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Apply the configured filter to a copy of the raster samples
    ///
    /// Returns `None` when no filter is configured.
    pub fn denoise<T: DepthSample>(
        &self,
        raster: &DepthRaster<'_, T>,
    ) -> DepthCloudResult<Option<Vec<T>>> {
        let Some(filter) = self.config.filter else {
            return Ok(None);
        };
        let mut data = raster.data().to_vec();
        filter.apply(&mut data, raster.width(), raster.height())?;
        debug!(?filter, "Denoised depth raster");
        Ok(Some(data))
    }

    /// Points and normals for every raster pixel
    fn points_and_normals<T: DepthSample>(
        &self,
        raster: &DepthRaster<'_, T>,
    ) -> DepthCloudResult<(Vec<Point3>, Vec<Normal3>)> {
        let filtered = self.denoise(raster)?;
        let filtered_raster;
        let raster = match &filtered {
            Some(data) => {
                filtered_raster =
                    DepthRaster::new(data, raster.width(), raster.height(), raster.scale())?;
                &filtered_raster
            }
            None => raster,
        };

        let points = back_project(raster, &self.calibration.depth);
        let normals = estimate_normals(
            &points,
            raster.width(),
            raster.height(),
            &self.config.normal_params(),
        );
        Ok((points, normals))
    }

    pub fn point_cloud<T: DepthSample>(
        &self,
        raster: &DepthRaster<'_, T>,
    ) -> DepthCloudResult<PointCloud> {
        let start = Instant::now();
        let (points, normals) = self.points_and_normals(raster)?;
        let cloud = assemble_point_cloud(
            &points,
            &normals,
            raster.width(),
            raster.height(),
            self.calibration.color.as_ref(),
            self.config.remove_invalid,
        );

        info!(
            width = raster.width(),
            height = raster.height(),
            point_count = cloud.size(),
            valid_count = cloud.valid_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Reconstructed point cloud"
        );
        Ok(cloud)
    }

    pub fn mesh<T: DepthSample>(&self, raster: &DepthRaster<'_, T>) -> DepthCloudResult<Mesh> {
        let start = Instant::now();
        let (points, normals) = self.points_and_normals(raster)?;
        let mesh = assemble_mesh(
            &points,
            &normals,
            raster.width(),
            raster.height(),
            self.calibration.color.as_ref(),
            self.config.remove_invalid,
            self.config.face_discontinuity_mm,
        );

        info!(
            width = raster.width(),
            height = raster.height(),
            vertex_count = mesh.cloud.size(),
            face_count = mesh.face_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Reconstructed mesh"
        );
        Ok(mesh)
    }

    /// Colorize the raster with the configured ramp and range
    pub fn colorize<T: DepthSample>(&self, raster: &DepthRaster<'_, T>) -> RgbImage {
        self.config.colorizer.build().process_image(raster)
    }
}
