// SPDX-License-Identifier: GPL-3.0-only

//! Per-vertex normal estimation over a grid of back-projected points
//!
//! Every grid quad is split into two triangles. A triangle contributes its
//! unnormalized cross product to all three corners when the corners have
//! depth and do not straddle a depth discontinuity. Accumulation finishes
//! for both triangle orientations before any vertex is normalized.

use crate::constants::{NORMAL_DISCONTINUITY_MM, NORMAL_MIN_DEPTH_MM, NORMAL_MIN_MAGNITUDE};
use crate::geometry::{Normal3, Point3};
use rayon::prelude::*;

/// Thresholds used when accepting a triangle's contribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParams {
    /// Maximum pairwise |dz| between the corners (millimeters)
    pub discontinuity_mm: f32,
    /// Corners must be deeper than this (millimeters)
    pub min_depth_mm: f32,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self {
            discontinuity_mm: NORMAL_DISCONTINUITY_MM,
            min_depth_mm: NORMAL_MIN_DEPTH_MM,
        }
    }
}

impl NormalParams {
    #[inline]
    fn accepts(&self, a: Point3, b: Point3, c: Point3) -> bool {
        a.z > self.min_depth_mm
            && b.z > self.min_depth_mm
            && c.z > self.min_depth_mm
            && (a.z - b.z).abs() <= self.discontinuity_mm
            && (a.z - c.z).abs() <= self.discontinuity_mm
            && (b.z - c.z).abs() <= self.discontinuity_mm
    }
}

/// Estimate a unit normal per grid point
///
/// Normals face the camera (negative z for a fronto-parallel surface).
/// Vertices without depth, or whose accumulated normal is degenerate, keep
/// the zero sentinel.
///
/// # Panics
///
/// Panics if `points.len()` is not `width * height`.
pub fn estimate_normals(
    points: &[Point3],
    width: u32,
    height: u32,
    params: &NormalParams,
) -> Vec<Normal3> {
    let w = width as usize;
    let h = height as usize;
    assert_eq!(
        points.len(),
        w * h,
        "point grid does not match {}x{}",
        width,
        height
    );

    let mut normals = vec![Point3::ZERO; points.len()];
    if w < 2 || h < 2 {
        return normals;
    }

    // Serial accumulation: neighbouring quads share corners
    for v in 0..h - 1 {
        for u in 0..w - 1 {
            let i00 = v * w + u;
            let i10 = i00 + 1;
            let i01 = i00 + w;
            let i11 = i01 + 1;

            let p00 = points[i00];
            let p10 = points[i10];
            let p01 = points[i01];
            let p11 = points[i11];

            // (u,v) -> (u,v+1) -> (u+1,v+1)
            if params.accepts(p00, p01, p11) {
                let n = (p01 - p00).cross(p11 - p00);
                normals[i00] += n;
                normals[i01] += n;
                normals[i11] += n;
            }

            // (u,v) -> (u+1,v) -> (u+1,v+1), reversed so both agree
            if params.accepts(p00, p10, p11) {
                let n = (p11 - p00).cross(p10 - p00);
                normals[i00] += n;
                normals[i10] += n;
                normals[i11] += n;
            }
        }
    }

    normals
        .par_iter_mut()
        .zip(points.par_iter())
        .for_each(|(n, p)| {
            *n = if p.z <= 0.0 {
                Point3::ZERO
            } else {
                n.normalized(NORMAL_MIN_MAGNITUDE).unwrap_or(Point3::ZERO)
            };
        });

    normals
}
