// SPDX-License-Identifier: GPL-3.0-only

//! Back-projection of depth pixels into the depth camera frame
//!
//! Invalid pixels are represented as the zero point, never rejected, so the
//! output grid always matches the input raster one to one.

use crate::camera::Intrinsics;
use crate::constants::OFFSET_RASTER_SANITY_BOUND;
use crate::geometry::Point3;
use crate::raster::{DepthRaster, DepthSample};
use crate::{DepthCloudError, DepthCloudResult};
use rayon::prelude::*;
use tracing::debug;

/// Back-project every pixel of a depth raster
///
/// For pixel (u, v) with scaled depth `z > 0` the point is
/// `((u - cx) * z / fx, (v - cy) * z / fy, z)`. Intrinsics are rescaled to the
/// raster resolution first.
pub fn back_project<T: DepthSample>(
    raster: &DepthRaster<'_, T>,
    intrinsics: &Intrinsics,
) -> Vec<Point3> {
    let width = raster.width() as usize;
    let k = intrinsics.rescaled(raster.width(), raster.height());
    let scale = raster.scale();
    let data = raster.data();

    let mut points = vec![Point3::ZERO; data.len()];
    if width == 0 {
        return points;
    }

    points
        .par_chunks_mut(width)
        .zip(data.par_chunks(width))
        .enumerate()
        .for_each(|(v, (row_out, row_in))| {
            for (u, (out, &raw)) in row_out.iter_mut().zip(row_in).enumerate() {
                let z = raw.to_f32() * scale;
                if z > 0.0 {
                    *out = k.unproject(u as f32, v as f32, z);
                }
            }
        });

    debug!(
        width = raster.width(),
        height = raster.height(),
        "Back-projected depth raster"
    );

    points
}

/// Back-project a packed center/offset raster
///
/// `packed` holds `width * height` row-coordinate offsets followed by
/// `width * height` raw depths. The offset refines the row position
/// (`v + offset`). A sample is kept when both values are below the sanity
/// bound and the depth is positive; the offset may be zero or negative.
pub fn back_project_offset_raster(
    packed: &[f32],
    width: u32,
    height: u32,
    scale: f32,
    intrinsics: &Intrinsics,
) -> DepthCloudResult<Vec<Point3>> {
    let count = width as usize * height as usize;
    if packed.len() != count * 2 {
        return Err(DepthCloudError::Raster(format!(
            "offset raster needs {} floats for {}x{}, got {}",
            count * 2,
            width,
            height,
            packed.len()
        )));
    }

    let (offsets, depths) = packed.split_at(count);
    let k = intrinsics.rescaled(width, height);
    let w = width as usize;

    let mut points = vec![Point3::ZERO; count];
    if w == 0 {
        return Ok(points);
    }

    points
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(v, row_out)| {
            for (u, out) in row_out.iter_mut().enumerate() {
                let idx = v * w + u;
                let offset = offsets[idx];
                let depth = depths[idx];
                if offset >= OFFSET_RASTER_SANITY_BOUND
                    || depth >= OFFSET_RASTER_SANITY_BOUND
                    || depth <= 0.0
                {
                    continue;
                }
                let z = depth * scale;
                if z > 0.0 {
                    *out = k.unproject(u as f32, v as f32 + offset, z);
                }
            }
        });

    Ok(points)
}

/// Back-project a two-row profile raster from a line-scan sensor
///
/// Row 0 holds X positions and row 1 holds depths, both in raw units. The
/// result is one point per column along the scan line, with `y = 0`.
/// Columns where either raw value reaches the sanity bound become the zero
/// point.
pub fn back_project_xz(raster: &[f32], width: u32, scale: f32) -> DepthCloudResult<Vec<Point3>> {
    let w = width as usize;
    if raster.len() != w * 2 {
        return Err(DepthCloudError::Raster(format!(
            "XZ raster needs {} floats for width {}, got {}",
            w * 2,
            width,
            raster.len()
        )));
    }

    let (xs, zs) = raster.split_at(w);
    Ok(xs
        .iter()
        .zip(zs)
        .map(|(&x, &z)| {
            if x >= OFFSET_RASTER_SANITY_BOUND || z >= OFFSET_RASTER_SANITY_BOUND {
                return Point3::ZERO;
            }
            let z = z * scale;
            if z > 0.0 {
                Point3::new(x * scale, 0.0, z)
            } else {
                Point3::ZERO
            }
        })
        .collect())
}
