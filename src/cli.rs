// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for depth frame processing
//!
//! This module provides command-line functionality for:
//! - Reconstructing point clouds and meshes and exporting them
//! - Colorizing depth maps
//! - Denoising depth maps
//! - Printing depth statistics

use crate::DepthInput;
use chrono::Local;
use depth_cloud::constants::{file_formats, kinect};
use depth_cloud::export::{Geometry, export_to_file};
use depth_cloud::raster::{disparity_to_mm, u16_from_le_bytes};
use depth_cloud::{
    Calibration, Config, DepthRaster, Intrinsics, RampKind, Reconstructor, SpatialFilter, Texture,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Options for `reconstruct` beyond the depth input
pub struct ReconstructArgs {
    pub calibration: Option<PathBuf>,
    pub color: Option<PathBuf>,
    pub mesh: bool,
    pub remove_invalid: bool,
    pub binary: bool,
    pub output: Option<PathBuf>,
}

/// Config from an explicit path, or the default location
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    debug!(?config, "Using config");
    Ok(config)
}

/// Read a raw 16-bit dump and check it against the raster size
fn read_raw(input: &DepthInput) -> Result<Vec<u16>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(&input.depth)
        .map_err(|e| format!("Failed to read {}: {}", input.depth.display(), e))?;
    let samples = u16_from_le_bytes(&bytes)?;

    let expected = input.width as usize * input.height as usize;
    if samples.len() != expected {
        return Err(format!(
            "{} holds {} samples, expected {} for {}x{}",
            input.depth.display(),
            samples.len(),
            expected,
            input.width,
            input.height
        )
        .into());
    }
    Ok(samples)
}

/// Load depth as millimeters, converting disparity when requested
fn load_depth_mm(input: &DepthInput) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let raw = read_raw(input)?;
    let depth = if input.disparity {
        disparity_to_mm(&raw)
    } else {
        raw.iter().map(|&d| d as f32 * input.scale).collect()
    };
    Ok(depth)
}

/// Default output name in the working directory
fn timestamped_path(prefix: &str, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("{}_{}.{}", prefix, timestamp, extension))
}

fn default_calibration() -> Calibration {
    Calibration::depth_only(Intrinsics::kinect())
}

/// Reconstruct a frame and export it
pub fn reconstruct(mut config: Config, input: &DepthInput, args: ReconstructArgs) -> CliResult {
    let start = Instant::now();

    let calibration = match &args.calibration {
        Some(path) => Calibration::load(path)?,
        None => default_calibration(),
    };
    config.remove_invalid |= args.remove_invalid;
    config.export.binary |= args.binary;

    let texture = args
        .color
        .as_ref()
        .map(|path| -> Result<Texture, Box<dyn std::error::Error>> {
            let image = image::open(path)
                .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?
                .into_rgb8();
            Ok(Texture::from_image(&image))
        })
        .transpose()?;

    let depth = load_depth_mm(input)?;
    let raster = DepthRaster::new(&depth, input.width, input.height, 1.0)?;
    println!(
        "Depth: {}x{}, {} valid samples",
        input.width,
        input.height,
        raster.valid_count()
    );

    let output = args
        .output
        .unwrap_or_else(|| timestamped_path("depth_cloud", file_formats::PLY));
    let reconstructor = Reconstructor::new(config, calibration);
    let options = reconstructor.config().export;

    if args.mesh {
        let mesh = reconstructor.mesh(&raster)?;
        println!(
            "Mesh: {} vertices, {} faces",
            mesh.cloud.size(),
            mesh.face_count()
        );
        export_to_file(&output, Geometry::Mesh(&mesh), texture.as_ref(), &options)?;
    } else {
        let cloud = reconstructor.point_cloud(&raster)?;
        println!(
            "Point cloud: {} points, {} valid",
            cloud.size(),
            cloud.valid_count()
        );
        export_to_file(&output, Geometry::Cloud(&cloud), texture.as_ref(), &options)?;
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Reconstruct finished");
    println!("Saved: {}", output.display());
    Ok(())
}

fn parse_ramp(name: &str) -> Result<RampKind, String> {
    match name.to_ascii_lowercase().as_str() {
        "classic" => Ok(RampKind::Classic),
        "turbo" => Ok(RampKind::Turbo),
        "grayscale" | "gray" => Ok(RampKind::Grayscale),
        other => Err(format!(
            "Unknown ramp '{}' (expected classic, turbo or grayscale)",
            other
        )),
    }
}

/// Colorize a depth map into an image
pub fn colorize(
    mut config: Config,
    input: &DepthInput,
    ramp: Option<&str>,
    min_mm: Option<f32>,
    max_mm: Option<f32>,
    output: Option<PathBuf>,
) -> CliResult {
    if let Some(ramp) = ramp {
        config.colorizer.ramp = parse_ramp(ramp)?;
    }
    if let Some(min_mm) = min_mm {
        config.colorizer.min_mm = min_mm;
    }
    if let Some(max_mm) = max_mm {
        config.colorizer.max_mm = max_mm;
    }

    let depth = load_depth_mm(input)?;
    let raster = DepthRaster::new(&depth, input.width, input.height, 1.0)?;
    let image = Reconstructor::new(config, default_calibration()).colorize(&raster);

    let output = output.unwrap_or_else(|| timestamped_path("depth", "png"));
    image
        .save(&output)
        .map_err(|e| format!("Failed to save {}: {}", output.display(), e))?;

    println!("Saved: {}", output.display());
    Ok(())
}

/// Filter a raw dump and write the result in the same layout
pub fn filter(
    input: &DepthInput,
    kind: &str,
    size: usize,
    sigma: f32,
    output: Option<PathBuf>,
) -> CliResult {
    let filter = match kind.to_ascii_lowercase().as_str() {
        "mean" => SpatialFilter::mean(size),
        "gaussian" => SpatialFilter::gaussian(size, sigma),
        "median" => SpatialFilter::median(size),
        other => {
            return Err(format!(
                "Unknown filter '{}' (expected mean, gaussian or median)",
                other
            )
            .into());
        }
    };

    let mut raw = read_raw(input)?;
    let before = raw.clone();
    filter.apply(&mut raw, input.width, input.height)?;
    let changed = raw.iter().zip(&before).filter(|(a, b)| a != b).count();

    let output = output.unwrap_or_else(|| timestamped_path("depth_filtered", "raw"));
    let bytes: Vec<u8> = raw.iter().flat_map(|d| d.to_le_bytes()).collect();
    std::fs::write(&output, bytes)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

    println!("Filtered {} of {} samples", changed, raw.len());
    println!("Saved: {}", output.display());
    Ok(())
}

/// Print depth statistics
pub fn info(input: &DepthInput) -> CliResult {
    let depth = load_depth_mm(input)?;
    let raster = DepthRaster::new(&depth, input.width, input.height, 1.0)?;

    let (min, max, sum) = depth
        .iter()
        .filter(|&&d| d > 0.0)
        .fold((f32::MAX, f32::MIN, 0.0f64), |(min, max, sum), &d| {
            (min.min(d), max.max(d), sum + d as f64)
        });
    let valid = raster.valid_count();

    println!("File: {}", input.depth.display());
    println!("Size: {}x{}", input.width, input.height);
    if input.disparity {
        println!(
            "Encoding: Kinect disparity (invalid marker {})",
            kinect::DISPARITY_INVALID
        );
    } else {
        println!("Encoding: depth, {} mm per unit", input.scale);
    }
    println!(
        "Valid: {} of {} ({:.1}%)",
        valid,
        raster.len(),
        100.0 * valid as f64 / raster.len().max(1) as f64
    );
    if valid > 0 {
        println!("Range: {:.1} mm .. {:.1} mm", min, max);
        println!("Mean: {:.1} mm", sum / valid as f64);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ramp() {
        assert_eq!(parse_ramp("Turbo"), Ok(RampKind::Turbo));
        assert_eq!(parse_ramp("gray"), Ok(RampKind::Grayscale));
        assert!(parse_ramp("rainbow").is_err());
    }

    #[test]
    fn test_timestamped_path_extension() {
        let path = timestamped_path("depth_cloud", "ply");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("ply"));
        assert!(path.to_string_lossy().starts_with("depth_cloud_"));
    }
}
