// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text exports: CSV positions, positional `v`/`vn` text and its
//! `.map` side file. All three skip vertices without depth.

use super::{Geometry, Texture, valid_vertex_remap};
use crate::reconstruction::PointCloud;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// `x,y,z` with six decimals per valid vertex, no header
pub(super) fn write_csv(path: &Path, cloud: &PointCloud) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for p in cloud.points.iter().filter(|p| p.z > 0.0) {
        writeln!(writer, "{:.6},{:.6},{:.6}", p.x, p.y, p.z)?;
    }
    writer.flush()
}

/// `v`/`vn` lines per valid vertex, then 1-based `f` lines for mesh faces
/// whose corners all survived
pub(super) fn write_positional(path: &Path, geometry: Geometry<'_>) -> io::Result<()> {
    let cloud = geometry.cloud();
    let mut writer = BufWriter::new(File::create(path)?);

    for (p, n) in cloud.points.iter().zip(&cloud.normals) {
        if p.z <= 0.0 {
            continue;
        }
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    if let Some(faces) = geometry.faces() {
        let (remap, _) = valid_vertex_remap(cloud);
        for face in faces {
            let corners = face.map(|i| remap.get(i as usize).copied().flatten());
            if let [Some(a), Some(b), Some(c)] = corners {
                writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
            }
        }
    }

    writer.flush()
}

/// Source-image pixel `x y` per valid vertex
///
/// Coordinates are in the texture's pixel grid when one is given, otherwise
/// in the depth raster's.
pub(super) fn write_texture_map(
    path: &Path,
    cloud: &PointCloud,
    texture: Option<&Texture>,
) -> io::Result<()> {
    let (width, height) = texture
        .map(|t| (t.width(), t.height()))
        .unwrap_or((cloud.width(), cloud.height()));

    let mut writer = BufWriter::new(File::create(path)?);
    for (p, tc) in cloud.points.iter().zip(&cloud.tex_coords) {
        if p.z <= 0.0 {
            continue;
        }
        let (x, y) = tc.to_pixel(width, height, false);
        writeln!(writer, "{} {}", x, y)?;
    }
    writer.flush()
}
