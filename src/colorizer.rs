// SPDX-License-Identifier: GPL-3.0-only

//! Depth colorization
//!
//! A [`ColorRamp`] maps a normalized depth in [0,1] to RGB by piecewise
//! linear interpolation between control colors. The [`Colorizer`] bakes the
//! ramp into a dense lookup table once; changing the depth range afterwards
//! only changes how millimeters are normalized, never the table.

use crate::constants::colorizer::{RANGE_MAX_MM, RANGE_MIN_MM, TABLE_SIZE};
use crate::raster::{DepthRaster, DepthSample};
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Built-in ramps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampKind {
    /// blue -> cyan -> yellow -> red -> dark red
    #[default]
    Classic,
    /// Turbo rainbow (blue=near, red=far)
    Turbo,
    /// Grayscale (bright=near, dark=far)
    Grayscale,
}

/// Sorted control points from normalized depth to color
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f32, [u8; 3])>,
}

/// Turbo colormap polynomial approximation
///
/// Based on: https://ai.googleblog.com/2019/08/turbo-improved-rainbow-colormap-for.html
#[inline]
fn turbo(t: f32) -> [u8; 3] {
    let r = (0.13572138
        + t * (4.6153926 + t * (-42.66032 + t * (132.13108 + t * (-152.54825 + t * 59.28144)))))
        .clamp(0.0, 1.0);
    let g = (0.09140261
        + t * (2.19418 + t * (4.84296 + t * (-14.18503 + t * (4.27805 + t * 2.53377)))))
        .clamp(0.0, 1.0);
    let b = (0.1066733
        + t * (12.64194 + t * (-60.58204 + t * (109.99648 + t * (-82.52904 + t * 20.43388)))))
        .clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

impl ColorRamp {
    /// Ramp from arbitrary control points (sorted by key here)
    pub fn new(mut stops: Vec<(f32, [u8; 3])>) -> Self {
        stops.retain(|(key, _)| key.is_finite());
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// Control colors at 0, 0.25, 0.5, 0.75 and 1.0
    pub fn classic() -> Self {
        Self::new(vec![
            (0.0, [0, 0, 255]),
            (0.25, [0, 255, 255]),
            (0.5, [255, 255, 0]),
            (0.75, [255, 0, 0]),
            (1.0, [50, 0, 0]),
        ])
    }

    /// Turbo sampled at 17 control points
    pub fn turbo() -> Self {
        Self::new(
            (0..=16)
                .map(|i| {
                    let t = i as f32 / 16.0;
                    (t, turbo(t))
                })
                .collect(),
        )
    }

    pub fn grayscale() -> Self {
        Self::new(vec![(0.0, [255, 255, 255]), (1.0, [0, 0, 0])])
    }

    pub fn from_kind(kind: RampKind) -> Self {
        match kind {
            RampKind::Classic => Self::classic(),
            RampKind::Turbo => Self::turbo(),
            RampKind::Grayscale => Self::grayscale(),
        }
    }

    pub fn stops(&self) -> &[(f32, [u8; 3])] {
        &self.stops
    }

    /// Interpolated color at normalized position `t` (clamped to the ramp)
    pub fn color_at(&self, t: f32) -> [u8; 3] {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return [0, 0, 0];
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        // First stop strictly above t; t > first key so idx >= 1
        let idx = self.stops.partition_point(|(key, _)| *key <= t);
        let (k0, c0) = self.stops[idx - 1];
        let (k1, c1) = self.stops[idx];
        let f = if k1 > k0 { (t - k0) / (k1 - k0) } else { 0.0 };

        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
        [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])]
    }
}

/// Depth to RGB mapper with a precomputed lookup table
#[derive(Debug, Clone)]
pub struct Colorizer {
    ramp: ColorRamp,
    table: Vec<[u8; 3]>,
    min_mm: f32,
    max_mm: f32,
}

impl Default for Colorizer {
    fn default() -> Self {
        Self::new(ColorRamp::classic(), TABLE_SIZE)
    }
}

impl Colorizer {
    /// Bake `ramp` into `table_size` entries (at least 2)
    pub fn new(ramp: ColorRamp, table_size: usize) -> Self {
        let n = table_size.max(2);
        let steps = (n - 1) as f32;
        let table = (0..n).map(|i| ramp.color_at(i as f32 / steps)).collect();
        Self {
            ramp,
            table,
            min_mm: RANGE_MIN_MM,
            max_mm: RANGE_MAX_MM,
        }
    }

    /// Change the millimeter range mapped onto [0,1]; the table is untouched
    pub fn set_range(&mut self, min_mm: f32, max_mm: f32) {
        self.min_mm = min_mm;
        self.max_mm = max_mm;
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min_mm, self.max_mm)
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    /// Ramp color at a normalized fraction, bypassing the table
    pub fn get_color(&self, fraction: f32) -> [u8; 3] {
        self.ramp.color_at(fraction)
    }

    /// Color for one depth in millimeters; non-positive depth is black
    #[inline]
    pub fn colorize_mm(&self, depth_mm: f32) -> [u8; 3] {
        if depth_mm <= 0.0 || depth_mm.is_nan() {
            return [0, 0, 0];
        }
        let span = self.max_mm - self.min_mm;
        let t = if span > 0.0 {
            ((depth_mm - self.min_mm) / span).clamp(0.0, 1.0)
        } else {
            // Degenerate range: everything at or past max is far
            if depth_mm >= self.max_mm { 1.0 } else { 0.0 }
        };
        let idx = ((self.table.len() - 1) as f32 * t) as usize;
        self.table[idx.min(self.table.len() - 1)]
    }

    /// Colorize raw samples scaled by `scale` (millimeters per unit)
    pub fn process<T: DepthSample>(&self, depth: &[T], scale: f32) -> Vec<[u8; 3]> {
        depth
            .par_iter()
            .map(|d| self.colorize_mm(d.to_f32() * scale))
            .collect()
    }

    /// Colorize a raster into an RGB image
    pub fn process_image<T: DepthSample>(&self, raster: &DepthRaster<'_, T>) -> RgbImage {
        let rgb: Vec<u8> = self
            .process(raster.data(), raster.scale())
            .into_iter()
            .flatten()
            .collect();
        // Length always matches width x height x 3 for a constructed raster
        RgbImage::from_raw(raster.width(), raster.height(), rgb).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let colorizer = Colorizer::default();
        let out = colorizer.process(&[0u16, 2500, 5000], 1.0);
        assert_eq!(out[0], [0, 0, 0]);
        assert_eq!(out[1], [255, 255, 0]);
        assert_eq!(out[2], [50, 0, 0]);
    }

    #[test]
    fn test_table_has_default_size() {
        assert_eq!(Colorizer::default().table_size(), 4001);
    }

    #[test]
    fn test_process_matches_ramp() {
        let colorizer = Colorizer::default();
        let depth: Vec<f32> = (1..=50).map(|i| i as f32 * 100.0).collect();
        let out = colorizer.process(&depth, 1.0);

        for (d, color) in depth.iter().zip(&out) {
            let expected = colorizer.get_color(d / 5000.0);
            for c in 0..3 {
                assert!(
                    (color[c] as i32 - expected[c] as i32).abs() <= 1,
                    "depth {} got {:?} expected {:?}",
                    d,
                    color,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_range_change_keeps_table() {
        let mut colorizer = Colorizer::default();
        colorizer.set_range(1000.0, 2000.0);
        assert_eq!(colorizer.table_size(), 4001);
        assert_eq!(colorizer.colorize_mm(1000.0), [0, 0, 255]);
        assert_eq!(colorizer.colorize_mm(1500.0), [255, 255, 0]);
        // Clamped outside the range
        assert_eq!(colorizer.colorize_mm(500.0), [0, 0, 255]);
        assert_eq!(colorizer.colorize_mm(9000.0), [50, 0, 0]);
        // Still black for missing depth
        assert_eq!(colorizer.colorize_mm(-1.0), [0, 0, 0]);
    }

    #[test]
    fn test_ramp_interpolates_midpoints() {
        let ramp = ColorRamp::classic();
        assert_eq!(ramp.color_at(0.125), [0, 128, 255]);
        assert_eq!(ramp.color_at(-3.0), [0, 0, 255]);
        assert_eq!(ramp.color_at(7.0), [50, 0, 0]);
    }

    #[test]
    fn test_grayscale_near_is_bright() {
        let colorizer = Colorizer::new(ColorRamp::grayscale(), 256);
        assert!(colorizer.colorize_mm(100.0)[0] > 200);
        assert!(colorizer.colorize_mm(4900.0)[0] < 50);
    }

    #[test]
    fn test_process_image_dimensions() {
        let data = [1000u16; 6];
        let raster = DepthRaster::new(&data, 3, 2, 1.0).unwrap();
        let img = Colorizer::default().process_image(&raster);
        assert_eq!(img.dimensions(), (3, 2));
    }
}
