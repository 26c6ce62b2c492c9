// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud and mesh export
//!
//! The output format is chosen by file extension:
//! - `.ply`: PLY point cloud (faces too when given a mesh), ASCII or binary
//! - `.mesh`: sibling `.ply` with faces and texcoords, plus a `.bmp` texture
//! - `.csv`: `x,y,z` per valid vertex
//! - `.las`: LAS 1.4 point cloud with color
//! - `.glb`: binary glTF with embedded JPEG texture
//! - anything else: positional `v`/`vn` text plus a sibling `.map` file

mod gltf_export;
mod las_export;
mod ply;
mod text;

use crate::constants::file_formats;
use crate::errors::ExportError;
use crate::geometry::TexCoord;
use crate::reconstruction::{Mesh, PointCloud};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Export switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Binary little-endian PLY instead of ASCII
    pub binary: bool,
    /// Write per-vertex color sampled from the texture, when one is given
    pub vertex_color: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            binary: false,
            vertex_color: true,
        }
    }
}

/// RGB8 texture with rows stored bottom-up (BMP row order)
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Wrap a bottom-up RGB8 buffer
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, ExportError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected || width == 0 || height == 0 {
            return Err(ExportError::Encoding(format!(
                "texture needs {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// From a regular top-down image
    pub fn from_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let flipped = image::imageops::flip_vertical(image);
        Self {
            data: flipped.into_raw(),
            width,
            height,
        }
    }

    /// Top-down image for encoders
    pub fn to_image(&self) -> RgbImage {
        // Length checked at construction
        let bottom_up = RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height));
        image::imageops::flip_vertical(&bottom_up)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(u * width, (1 - v) * height)`, clamped to the image
    pub fn sample(&self, tc: TexCoord) -> [u8; 3] {
        let (x, y) = tc.to_pixel(self.width, self.height, true);
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}

/// What to export
#[derive(Debug, Clone, Copy)]
pub enum Geometry<'a> {
    Cloud(&'a PointCloud),
    Mesh(&'a Mesh),
}

impl Geometry<'_> {
    pub fn cloud(&self) -> &PointCloud {
        match self {
            Geometry::Cloud(cloud) => cloud,
            Geometry::Mesh(mesh) => &mesh.cloud,
        }
    }

    pub fn faces(&self) -> Option<&[[u32; 3]]> {
        match self {
            Geometry::Cloud(_) => None,
            Geometry::Mesh(mesh) => Some(mesh.faces.as_slice()),
        }
    }
}

impl<'a> From<&'a PointCloud> for Geometry<'a> {
    fn from(cloud: &'a PointCloud) -> Self {
        Geometry::Cloud(cloud)
    }
}

impl<'a> From<&'a Mesh> for Geometry<'a> {
    fn from(mesh: &'a Mesh) -> Self {
        Geometry::Mesh(mesh)
    }
}

/// Owned geometry for background export
#[derive(Debug, Clone)]
pub enum OwnedGeometry {
    Cloud(PointCloud),
    Mesh(Mesh),
}

impl OwnedGeometry {
    pub fn as_geometry(&self) -> Geometry<'_> {
        match self {
            OwnedGeometry::Cloud(cloud) => Geometry::Cloud(cloud),
            OwnedGeometry::Mesh(mesh) => Geometry::Mesh(mesh),
        }
    }
}

/// Output index for each vertex with depth, plus how many there are
///
/// Formats that skip invalid vertices use this to renumber faces.
pub(crate) fn valid_vertex_remap(cloud: &PointCloud) -> (Vec<Option<u32>>, usize) {
    let mut next = 0u32;
    let remap = cloud
        .points
        .iter()
        .map(|p| {
            (p.z > 0.0).then(|| {
                next += 1;
                next - 1
            })
        })
        .collect();
    (remap, next as usize)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Write geometry to `path`, picking the format from its extension
pub fn export_to_file<'a>(
    path: impl AsRef<Path>,
    geometry: impl Into<Geometry<'a>>,
    texture: Option<&Texture>,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let geometry = geometry.into();
    let ext = extension(path);

    info!(
        path = %path.display(),
        format = %ext,
        vertex_count = geometry.cloud().size(),
        face_count = geometry.faces().map(|f| f.len()).unwrap_or(0),
        textured = texture.is_some(),
        binary = options.binary,
        "Exporting geometry"
    );

    let colors = if options.vertex_color { texture } else { None };

    match ext.as_str() {
        file_formats::PLY => ply::write_ply(path, geometry, colors, None, options.binary)?,
        file_formats::MESH => {
            let ply_path = path.with_extension(file_formats::PLY);
            let bmp_path = path.with_extension(file_formats::BMP);
            let bmp_name = bmp_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            let texture_file = texture.and(bmp_name.as_deref());
            ply::write_ply(&ply_path, geometry, colors, texture_file, options.binary)?;
            if let Some(texture) = texture {
                texture
                    .to_image()
                    .save_with_format(&bmp_path, image::ImageFormat::Bmp)
                    .map_err(|e| ExportError::Encoding(format!("Failed to write BMP: {}", e)))?;
                debug!(path = %bmp_path.display(), "Wrote mesh texture");
            }
        }
        file_formats::CSV => text::write_csv(path, geometry.cloud())?,
        file_formats::LAS => las_export::write_las(path, geometry.cloud(), texture)?,
        file_formats::GLB => gltf_export::write_glb(path, geometry, texture)?,
        _ => {
            text::write_positional(path, geometry)?;
            text::write_texture_map(&path.with_extension(file_formats::MAP), geometry.cloud(), texture)?;
        }
    }

    debug!(path = %path.display(), "Export complete");
    Ok(())
}

/// [`export_to_file`] on the blocking thread pool
pub async fn export_to_file_async(
    path: PathBuf,
    geometry: OwnedGeometry,
    texture: Option<Texture>,
    options: ExportOptions,
) -> Result<(), ExportError> {
    tokio::task::spawn_blocking(move || {
        export_to_file(&path, geometry.as_geometry(), texture.as_ref(), &options)
    })
    .await
    .map_err(|e| ExportError::Io(format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    fn checker() -> Texture {
        // Bottom row red, top row blue (bottom-up storage)
        let data = vec![255, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 255];
        Texture::new(data, 2, 2).unwrap()
    }

    #[test]
    fn test_texture_sample_flips_rows() {
        let tex = checker();
        // v = 0 is the top of the color image -> top row (blue)
        assert_eq!(tex.sample(TexCoord::new(0.0, 0.0)), [0, 0, 255]);
        assert_eq!(tex.sample(TexCoord::new(0.9, 0.9)), [255, 0, 0]);
    }

    #[test]
    fn test_texture_image_round_trip() {
        let tex = checker();
        let img = tex.to_image();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(Texture::from_image(&img), tex);
    }

    #[test]
    fn test_texture_rejects_short_buffer() {
        assert!(Texture::new(vec![0; 11], 2, 2).is_err());
    }

    #[test]
    fn test_valid_vertex_remap() {
        let mut cloud = PointCloud::with_capacity(3, 1, 3);
        cloud.push(Point3::new(0.0, 0.0, 5.0), Point3::ZERO, TexCoord::ZERO);
        cloud.push(Point3::ZERO, Point3::ZERO, TexCoord::ZERO);
        cloud.push(Point3::new(1.0, 0.0, 5.0), Point3::ZERO, TexCoord::ZERO);
        let (remap, count) = valid_vertex_remap(&cloud);
        assert_eq!(remap, vec![Some(0), None, Some(1)]);
        assert_eq!(count, 2);
    }
}
