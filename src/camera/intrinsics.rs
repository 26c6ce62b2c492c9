// SPDX-License-Identifier: GPL-3.0-only

//! Pinhole camera intrinsics

use crate::constants::kinect;
use crate::geometry::Point3;
use serde::{Deserialize, Serialize};

/// Camera intrinsics at a calibration resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Calibration width (pixels)
    pub width: u32,
    /// Calibration height (pixels)
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Default for Intrinsics {
    fn default() -> Self {
        // Kinect defaults for 640x480 base resolution
        Self::kinect()
    }
}

impl Intrinsics {
    pub fn new(width: u32, height: u32, fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
        }
    }

    /// Kinect v1 depth camera at 640x480
    pub fn kinect() -> Self {
        Self::new(
            kinect::BASE_WIDTH,
            kinect::BASE_HEIGHT,
            kinect::FX,
            kinect::FY,
            kinect::CX,
            kinect::CY,
        )
    }

    /// Rescale to the actual frame resolution
    ///
    /// fx/cx scale with the width ratio, fy/cy with the height ratio.
    pub fn rescaled(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return *self;
        }
        let sx = width as f32 / self.width as f32;
        let sy = height as f32 / self.height as f32;
        Self {
            width,
            height,
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
        }
    }

    /// Back-project pixel (u, v) at depth z
    #[inline]
    pub fn unproject(&self, u: f32, v: f32, z: f32) -> Point3 {
        Point3::new((u - self.cx) * z / self.fx, (v - self.cy) * z / self.fy, z)
    }

    /// Pinhole projection; `None` for points at or behind the image plane
    #[inline]
    pub fn project(&self, p: Point3) -> Option<(f32, f32)> {
        if p.z <= 0.0 {
            return None;
        }
        Some((
            self.fx * p.x / p.z + self.cx,
            self.fy * p.y / p.z + self.cy,
        ))
    }

    /// True when focal lengths are usable
    pub fn is_valid(&self) -> bool {
        self.fx > 0.0 && self.fy > 0.0 && self.width > 0 && self.height > 0
    }
}
