// SPDX-License-Identifier: GPL-3.0-only

//! Depth rasters
//!
//! A raster is a row-major grid of raw samples plus the scale that turns a
//! raw sample into millimeters. A scaled value of zero or less means the
//! sensor got no return for that pixel.

use crate::constants::kinect;
use crate::{DepthCloudError, DepthCloudResult};

/// Numeric pixel type a depth raster may carry
pub trait DepthSample: Copy + Send + Sync + 'static {
    fn to_f32(self) -> f32;
    /// Convert a filtered value back, saturating to the type's range
    fn from_f32(value: f32) -> Self;
}

macro_rules! impl_depth_sample_int {
    ($($t:ty),*) => {
        $(
            impl DepthSample for $t {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }

                #[inline]
                fn from_f32(value: f32) -> Self {
                    // `as` saturates float-to-int conversions
                    value.round() as $t
                }
            }
        )*
    };
}

impl_depth_sample_int!(u8, u16, u32, i16, i32);

impl DepthSample for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

/// Borrowed depth raster handed over by the device layer
#[derive(Debug, Clone, Copy)]
pub struct DepthRaster<'a, T: DepthSample> {
    data: &'a [T],
    width: u32,
    height: u32,
    /// Millimeters per raw unit
    scale: f32,
}

impl<'a, T: DepthSample> DepthRaster<'a, T> {
    /// Wrap a buffer; fails when its length is not width x height
    pub fn new(data: &'a [T], width: u32, height: u32, scale: f32) -> DepthCloudResult<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(DepthCloudError::Raster(format!(
                "expected {} samples for {}x{}, got {}",
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
            scale,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Scaled depth in millimeters at (u, v)
    #[inline]
    pub fn depth_mm(&self, u: u32, v: u32) -> f32 {
        self.data[(v * self.width + u) as usize].to_f32() * self.scale
    }

    /// Number of samples with a positive scaled depth
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|d| d.to_f32() * self.scale > 0.0)
            .count()
    }
}

/// Decode a little-endian 16-bit depth dump
pub fn u16_from_le_bytes(bytes: &[u8]) -> DepthCloudResult<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(DepthCloudError::Raster(format!(
            "16-bit depth dump has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// Convert Kinect 10-bit disparity (shifted to 16 bit) to millimeters
///
/// Uses `depth_m = 1 / (raw * A + B)`. Invalid markers and degenerate
/// denominators become 0.
pub fn disparity_to_mm(disparity: &[u16]) -> Vec<f32> {
    disparity
        .iter()
        .map(|&raw16| {
            if raw16 >= kinect::DISPARITY_INVALID {
                return 0.0;
            }
            let raw = (raw16 >> 6) as f32;
            let denom = raw * kinect::DEPTH_COEFF_A + kinect::DEPTH_COEFF_B;
            if denom <= 0.01 {
                return 0.0;
            }
            1000.0 / denom
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let data = [0u16; 5];
        assert!(DepthRaster::new(&data, 2, 2, 1.0).is_err());
        assert!(DepthRaster::new(&data[..4], 2, 2, 1.0).is_ok());
    }

    #[test]
    fn test_depth_mm_applies_scale() {
        let data = [0u16, 10, 20, 30];
        let raster = DepthRaster::new(&data, 2, 2, 0.5).unwrap();
        assert_eq!(raster.depth_mm(1, 1), 15.0);
        assert_eq!(raster.valid_count(), 3);
    }

    #[test]
    fn test_from_f32_saturates() {
        assert_eq!(u16::from_f32(70000.0), u16::MAX);
        assert_eq!(u8::from_f32(-3.0), 0);
        assert_eq!(u16::from_f32(1.6), 2);
    }

    #[test]
    fn test_le_decode() {
        assert_eq!(u16_from_le_bytes(&[0xE8, 0x03, 0, 0]).unwrap(), vec![1000, 0]);
        assert!(u16_from_le_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_disparity_invalid_marker() {
        let mm = disparity_to_mm(&[kinect::DISPARITY_INVALID, 600 << 6]);
        assert_eq!(mm[0], 0.0);
        // raw 600 -> about 0.68 m
        assert!(mm[1] > 600.0 && mm[1] < 800.0);
    }
}
