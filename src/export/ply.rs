// SPDX-License-Identifier: GPL-3.0-only

//! PLY writer
//!
//! Vertices carry position and normal, optionally color sampled from the
//! texture. Faces (meshes only) are `uchar`-counted `uint` index lists,
//! optionally followed by per-corner texture coordinates.

use super::{Geometry, Texture};
use crate::constants::app_info;
use crate::geometry::TexCoord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn write_header<W: Write>(
    writer: &mut W,
    binary: bool,
    vertex_count: usize,
    face_count: Option<usize>,
    with_color: bool,
    texture_file: Option<&str>,
) -> io::Result<()> {
    writeln!(writer, "ply")?;
    if binary {
        writeln!(writer, "format binary_little_endian 1.0")?;
    } else {
        writeln!(writer, "format ascii 1.0")?;
    }
    writeln!(writer, "comment depth-cloud {}", app_info::version())?;
    if let Some(texture_file) = texture_file {
        writeln!(writer, "comment TextureFile {}", texture_file)?;
    }
    writeln!(writer, "element vertex {}", vertex_count)?;
    for name in ["x", "y", "z", "nx", "ny", "nz"] {
        writeln!(writer, "property float {}", name)?;
    }
    if with_color {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    if let Some(face_count) = face_count {
        writeln!(writer, "element face {}", face_count)?;
        writeln!(writer, "property list uchar uint vertex_indices")?;
        if texture_file.is_some() {
            writeln!(writer, "property list uchar float texcoord")?;
        }
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

/// PLY texture coordinates have their origin at the bottom-left
#[inline]
fn ply_uv(tc: TexCoord) -> [f32; 2] {
    [tc.u, 1.0 - tc.v]
}

/// Write every vertex (valid or not) and, for meshes, all faces
///
/// With `texture_file`, mesh faces also carry per-corner texture
/// coordinates and the header names that file.
pub(super) fn write_ply(
    path: &Path,
    geometry: Geometry<'_>,
    colors: Option<&Texture>,
    texture_file: Option<&str>,
    binary: bool,
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let cloud = geometry.cloud();
    let faces = geometry.faces();
    let texture_file = texture_file.filter(|_| faces.is_some());
    let with_face_texcoords = texture_file.is_some();

    write_header(
        &mut writer,
        binary,
        cloud.size(),
        faces.map(|f| f.len()),
        colors.is_some(),
        texture_file,
    )?;

    for i in 0..cloud.size() {
        let p = cloud.points[i];
        let n = cloud.normals[i];
        let color = colors.map(|tex| tex.sample(cloud.tex_coords[i]));

        if binary {
            for value in [p.x, p.y, p.z, n.x, n.y, n.z] {
                writer.write_all(&value.to_le_bytes())?;
            }
            if let Some(rgb) = color {
                writer.write_all(&rgb)?;
            }
        } else {
            write!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, n.x, n.y, n.z)?;
            if let Some([r, g, b]) = color {
                write!(writer, " {} {} {}", r, g, b)?;
            }
            writeln!(writer)?;
        }
    }

    for face in faces.unwrap_or_default() {
        let uvs = face.map(|i| ply_uv(cloud.tex_coords[i as usize]));

        if binary {
            writer.write_all(&[3u8])?;
            for index in face {
                writer.write_all(&index.to_le_bytes())?;
            }
            if with_face_texcoords {
                writer.write_all(&[6u8])?;
                for value in uvs.iter().flatten() {
                    writer.write_all(&value.to_le_bytes())?;
                }
            }
        } else {
            write!(writer, "3 {} {} {}", face[0], face[1], face[2])?;
            if with_face_texcoords {
                write!(writer, " 6")?;
                for value in uvs.iter().flatten() {
                    write!(writer, " {}", value)?;
                }
            }
            writeln!(writer)?;
        }
    }

    writer.flush()?;
    Ok(())
}
