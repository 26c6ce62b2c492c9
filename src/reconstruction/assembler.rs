// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud and mesh assembly
//!
//! Combines a back-projected point grid with its normals and texture
//! coordinates into parallel arrays, row-major. Meshes additionally get
//! grid triangulation with depth discontinuity handling.

use super::mapper::map_to_color;
use crate::camera::ColorCalibration;
use crate::constants::{FACE_DISCONTINUITY_MM, INDEX_UNSET};
use crate::geometry::{Normal3, Point3, TexCoord};
use tracing::debug;

/// Parallel arrays of points, normals and texture coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3>,
    pub normals: Vec<Normal3>,
    pub tex_coords: Vec<TexCoord>,
    /// Source raster width
    width: u32,
    /// Source raster height
    height: u32,
    valid_count: usize,
}

impl PointCloud {
    pub fn with_capacity(width: u32, height: u32, capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            tex_coords: Vec::with_capacity(capacity),
            width,
            height,
            valid_count: 0,
        }
    }

    /// Append one sample; counts as valid when it has depth
    pub fn push(&mut self, point: Point3, normal: Normal3, tex_coord: TexCoord) {
        if point.z > 0.0 {
            self.valid_count += 1;
        }
        self.points.push(point);
        self.normals.push(normal);
        self.tex_coords.push(tex_coord);
    }

    /// Number of emitted samples (valid or not)
    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of emitted samples with positive depth
    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Point cloud plus triangle faces indexing into it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub cloud: PointCloud,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Shared assembly loop; fills `index_map` (raster index -> output index)
/// when one is given
fn assemble_into(
    points: &[Point3],
    normals: &[Normal3],
    width: u32,
    height: u32,
    color: Option<&ColorCalibration>,
    remove_invalid: bool,
    mut index_map: Option<&mut [u32]>,
) -> PointCloud {
    let w = width as usize;
    let count = w * height as usize;
    assert_eq!(points.len(), count, "points do not match {}x{}", width, height);
    assert_eq!(normals.len(), count, "normals do not match {}x{}", width, height);

    let capacity = if remove_invalid { count / 2 } else { count };
    let mut cloud = PointCloud::with_capacity(width, height, capacity);

    for (i, (&p, &n)) in points.iter().zip(normals).enumerate() {
        let has_depth = p.z > 0.0;

        let tex_coord = match color {
            Some(calib) => map_to_color(p, calib),
            None if has_depth => Some(TexCoord::new(
                (i % w) as f32 / width as f32,
                (i / w) as f32 / height as f32,
            )),
            None => None,
        };

        match (tex_coord, has_depth) {
            (None, _) if remove_invalid => continue,
            // Keep the slot, fully zeroed
            (None, false) => cloud.push(Point3::ZERO, Point3::ZERO, TexCoord::ZERO),
            (tc, _) => cloud.push(p, n, tc.unwrap_or(TexCoord::ZERO)),
        }

        if let Some(map) = index_map.as_deref_mut() {
            map[i] = (cloud.size() - 1) as u32;
        }
    }

    cloud
}

/// Build a point cloud from a point grid and its normals
///
/// With `remove_invalid` only samples with depth (and, when a color stream
/// is given, a valid color mapping) are emitted. Otherwise every raster slot
/// is emitted and invalid ones are zeroed; a sample with depth whose color
/// mapping fails keeps its point and normal with a (0,0) texture coordinate.
///
/// # Panics
///
/// Panics if `points` or `normals` does not hold `width * height` entries.
pub fn assemble_point_cloud(
    points: &[Point3],
    normals: &[Normal3],
    width: u32,
    height: u32,
    color: Option<&ColorCalibration>,
    remove_invalid: bool,
) -> PointCloud {
    let cloud = assemble_into(points, normals, width, height, color, remove_invalid, None);

    debug!(
        size = cloud.size(),
        valid_count = cloud.valid_count(),
        remove_invalid,
        textured = color.is_some(),
        "Assembled point cloud"
    );

    cloud
}

/// Build a mesh: the point cloud plus up to two faces per grid cell
///
/// A face is emitted only when all three corners were emitted, have depth,
/// and differ pairwise in depth by at most `discontinuity_mm`.
///
/// # Panics
///
/// Panics if `points` or `normals` does not hold `width * height` entries.
pub fn assemble_mesh(
    points: &[Point3],
    normals: &[Normal3],
    width: u32,
    height: u32,
    color: Option<&ColorCalibration>,
    remove_invalid: bool,
    discontinuity_mm: f32,
) -> Mesh {
    let w = width as usize;
    let h = height as usize;
    let mut index_map = vec![INDEX_UNSET; w * h];

    let cloud = assemble_into(
        points,
        normals,
        width,
        height,
        color,
        remove_invalid,
        Some(index_map.as_mut_slice()),
    );

    let vertex = |idx: usize| -> Option<(u32, f32)> {
        let out = index_map[idx];
        if out == INDEX_UNSET {
            return None;
        }
        let z = cloud.points[out as usize].z;
        (z > 0.0).then_some((out, z))
    };

    let continuous = |a: f32, b: f32, c: f32| {
        (a - b).abs() <= discontinuity_mm
            && (a - c).abs() <= discontinuity_mm
            && (b - c).abs() <= discontinuity_mm
    };

    let mut faces = Vec::new();
    for v in 0..h.saturating_sub(1) {
        for u in 0..w.saturating_sub(1) {
            let i00 = v * w + u;
            let c00 = vertex(i00);
            let c10 = vertex(i00 + 1);
            let c01 = vertex(i00 + w);
            let c11 = vertex(i00 + w + 1);

            // Same winding as the normal estimator's triangles
            if let (Some(a), Some(b), Some(c)) = (c00, c01, c11)
                && continuous(a.1, b.1, c.1)
            {
                faces.push([a.0, b.0, c.0]);
            }
            if let (Some(a), Some(b), Some(c)) = (c00, c11, c10)
                && continuous(a.1, b.1, c.1)
            {
                faces.push([a.0, b.0, c.0]);
            }
        }
    }

    debug!(
        vertex_count = cloud.size(),
        face_count = faces.len(),
        discontinuity_mm,
        "Assembled mesh"
    );

    Mesh { cloud, faces }
}

/// Mesh with the default face discontinuity threshold
///
/// Panics under the same conditions as [`assemble_mesh`].
pub fn assemble_mesh_default(
    points: &[Point3],
    normals: &[Normal3],
    width: u32,
    height: u32,
    color: Option<&ColorCalibration>,
    remove_invalid: bool,
) -> Mesh {
    assemble_mesh(
        points,
        normals,
        width,
        height,
        color,
        remove_invalid,
        FACE_DISCONTINUITY_MM,
    )
}
