// SPDX-License-Identifier: GPL-3.0-only

//! Depth-to-color mapping
//!
//! Forward: a depth-frame point is moved into the color frame and projected
//! to normalized color coordinates. Backward: a coarse lookup grid built
//! from those coordinates resolves a color pixel to its nearest valid depth
//! sample with a bounded probe pattern.

use super::assembler::PointCloud;
use crate::camera::ColorCalibration;
use crate::constants::INDEX_UNSET;
use crate::errors::MappingError;
use crate::geometry::{Point3, TexCoord};
use tracing::debug;

/// Probe order when resolving a color coordinate: rows outer, columns inner
const SEARCH_DY: [i64; 3] = [0, 1, -1];
const SEARCH_DX: [i64; 5] = [0, 1, -1, 2, -2];

/// Project a depth-frame point into normalized color coordinates
///
/// Returns `None` when the point has no depth, lands behind the color
/// camera, or falls outside the color frame.
#[inline]
pub fn map_to_color(point: Point3, color: &ColorCalibration) -> Option<TexCoord> {
    if point.z <= 0.0 {
        return None;
    }

    let k = &color.intrinsics;
    let (fu, fv) = k.project(color.extrinsics.transform(point))?;

    let width = k.width as f32;
    let height = k.height as f32;
    if !(fu >= 0.0 && fu < width && fv >= 0.0 && fv < height) {
        return None;
    }

    Some(TexCoord::new(fu / width, fv / height))
}

/// Coarse color-space grid pointing back at point-cloud indices
///
/// Cells are keyed by the texture coordinate rescaled to a target depth
/// resolution; unset cells hold [`INDEX_UNSET`].
#[derive(Debug, Clone)]
pub struct ColorDepthLookup {
    grid_width: u32,
    grid_height: u32,
    depth_width: u32,
    cells: Vec<u32>,
}

impl ColorDepthLookup {
    /// Build from a point cloud that kept every raster slot
    ///
    /// The cloud must have been assembled without removing invalid samples,
    /// so point index == raster index. A texture coordinate of exactly (0,0)
    /// is how the assembler marks a failed color mapping, so such samples
    /// are skipped; use [`ColorDepthLookup::build_with_calibration`] when
    /// depth pixels may legitimately map onto color pixel (0,0).
    pub fn build(
        cloud: &PointCloud,
        grid_width: u32,
        grid_height: u32,
    ) -> Result<Self, MappingError> {
        Self::build_from(cloud, grid_width, grid_height, |p, tc| {
            (p.z > 0.0 && !(tc.u == 0.0 && tc.v == 0.0)).then_some(tc)
        })
    }

    /// Build by re-mapping every point through the color calibration
    ///
    /// Validity comes from [`map_to_color`] itself, so a sample landing on
    /// color pixel (0,0) is indexed like any other.
    pub fn build_with_calibration(
        cloud: &PointCloud,
        color: &ColorCalibration,
        grid_width: u32,
        grid_height: u32,
    ) -> Result<Self, MappingError> {
        Self::build_from(cloud, grid_width, grid_height, |p, _| map_to_color(p, color))
    }

    fn build_from<F>(
        cloud: &PointCloud,
        grid_width: u32,
        grid_height: u32,
        mapped: F,
    ) -> Result<Self, MappingError>
    where
        F: Fn(Point3, TexCoord) -> Option<TexCoord>,
    {
        let expected = cloud.width() as usize * cloud.height() as usize;
        if cloud.tex_coords.len() != expected {
            return Err(MappingError::DimensionMismatch {
                expected,
                actual: cloud.tex_coords.len(),
            });
        }

        let mut cells = vec![INDEX_UNSET; grid_width as usize * grid_height as usize];
        let mut filled = 0usize;

        if grid_width > 0 && grid_height > 0 {
            for (i, (&tc, &p)) in cloud.tex_coords.iter().zip(&cloud.points).enumerate() {
                let Some(tc) = mapped(p, tc) else {
                    continue;
                };
                let (gx, gy) = tc.to_pixel(grid_width, grid_height, false);
                let cell = &mut cells[(gy * grid_width + gx) as usize];
                // First sample wins
                if *cell == INDEX_UNSET {
                    *cell = i as u32;
                    filled += 1;
                }
            }
        }

        debug!(
            grid_width,
            grid_height,
            filled_cells = filled,
            "Built color-to-depth lookup"
        );

        Ok(Self {
            grid_width,
            grid_height,
            depth_width: cloud.width(),
            cells,
        })
    }

    fn cell(&self, gx: i64, gy: i64) -> Option<u32> {
        if gx < 0 || gy < 0 || gx >= self.grid_width as i64 || gy >= self.grid_height as i64 {
            return None;
        }
        let idx = self.cells[(gy * self.grid_width as i64 + gx) as usize];
        (idx != INDEX_UNSET).then_some(idx)
    }

    /// Point-cloud index nearest to a normalized color coordinate
    ///
    /// Coordinates outside `[0,1)` lie outside the color image and never
    /// resolve.
    pub fn resolve_index(&self, tc: TexCoord) -> Option<u32> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return None;
        }
        if !((0.0..1.0).contains(&tc.u) && (0.0..1.0).contains(&tc.v)) {
            return None;
        }
        let (gx, gy) = tc.to_pixel(self.grid_width, self.grid_height, false);
        let (gx, gy) = (gx as i64, gy as i64);

        SEARCH_DY.iter().find_map(|&dy| {
            SEARCH_DX
                .iter()
                .find_map(|&dx| self.cell(gx + dx, gy + dy))
        })
    }

    /// Depth pixel (u, v) nearest to color pixel (x, y)
    pub fn resolve(
        &self,
        x: f32,
        y: f32,
        color_width: u32,
        color_height: u32,
    ) -> Option<(u32, u32)> {
        if color_width == 0 || color_height == 0 || self.depth_width == 0 {
            return None;
        }
        let tc = TexCoord::new(x / color_width as f32, y / color_height as f32);
        let idx = self.resolve_index(tc)?;
        Some((idx % self.depth_width, idx / self.depth_width))
    }
}
