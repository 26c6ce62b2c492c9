// SPDX-License-Identifier: GPL-3.0-only

//! LAS point cloud export
//!
//! Writes valid vertices as an uncompressed LAS 1.4 file in meters. Points
//! get color from the texture when one is given.

use super::Texture;
use crate::errors::ExportError;
use crate::reconstruction::PointCloud;
use las::{Builder, Color, Point, Writer};
use std::path::Path;
use tracing::{debug, info};

/// Millimeters to meters
const MM_TO_M: f64 = 0.001;

/// 1mm coordinate precision
const LAS_SCALE: f64 = 0.001;

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::MAX, f64::MIN), |(min, max), v| (min.min(v), max.max(v)))
}

fn centered_transform((min, max): (f64, f64)) -> las::Transform {
    las::Transform {
        scale: LAS_SCALE,
        offset: (min + max) / 2.0,
    }
}

pub(super) fn write_las(
    path: &Path,
    cloud: &PointCloud,
    texture: Option<&Texture>,
) -> Result<(), ExportError> {
    // (x, y, z) in meters plus 16-bit color
    let points: Vec<(f64, f64, f64, Option<Color>)> = cloud
        .points
        .iter()
        .zip(&cloud.tex_coords)
        .filter(|(p, _)| p.z > 0.0)
        .map(|(p, tc)| {
            let color = texture.map(|tex| {
                let [r, g, b] = tex.sample(*tc);
                Color::new(r as u16 * 256, g as u16 * 256, b as u16 * 256)
            });
            (
                p.x as f64 * MM_TO_M,
                p.y as f64 * MM_TO_M,
                p.z as f64 * MM_TO_M,
                color,
            )
        })
        .collect();

    if points.is_empty() {
        return Err(ExportError::EmptyGeometry);
    }

    info!(
        point_count = points.len(),
        colored = texture.is_some(),
        path = %path.display(),
        "Exporting LAS point cloud"
    );

    let mut builder = Builder::from((1, 4));
    builder.point_format.has_color = texture.is_some();
    builder.point_format.is_compressed = false;
    builder.transforms = las::Vector {
        x: centered_transform(bounds(points.iter().map(|p| p.0))),
        y: centered_transform(bounds(points.iter().map(|p| p.1))),
        z: centered_transform(bounds(points.iter().map(|p| p.2))),
    };

    let header = builder
        .into_header()
        .map_err(|e| ExportError::Encoding(format!("Failed to build LAS header: {}", e)))?;

    let mut writer = Writer::from_path(path, header)
        .map_err(|e| ExportError::Io(format!("Failed to create LAS writer: {}", e)))?;

    for (x, y, z, color) in points {
        let mut point = Point::default();
        point.x = x;
        point.y = y;
        point.z = z;
        point.color = color;

        writer
            .write_point(point)
            .map_err(|e| ExportError::Io(format!("Failed to write point: {}", e)))?;
    }

    writer
        .close()
        .map_err(|e| ExportError::Io(format!("Failed to close LAS file: {}", e)))?;

    debug!(path = %path.display(), "LAS export complete");
    Ok(())
}
