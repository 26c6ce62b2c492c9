// SPDX-License-Identifier: GPL-3.0-only

//! Rigid transform from the depth camera frame to the color camera frame

use crate::geometry::Point3;
use serde::{Deserialize, Serialize};

/// Row-major 3x3 rotation plus translation, applied as `R * (p + t)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    pub rotation: [f32; 9],
    /// Translation in millimeters, added before rotating
    pub translation: [f32; 3],
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self::identity()
    }
}

impl Extrinsics {
    pub const fn identity() -> Self {
        Self {
            rotation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
        }
    }

    /// Pure translation (typical stereo baseline)
    pub const fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            rotation: Self::identity().rotation,
            translation,
        }
    }

    /// Map a depth-frame point into the color frame
    #[inline]
    pub fn transform(&self, p: Point3) -> Point3 {
        let t = [
            p.x + self.translation[0],
            p.y + self.translation[1],
            p.z + self.translation[2],
        ];
        let r = &self.rotation;
        Point3::new(
            r[0] * t[0] + r[1] * t[1] + r[2] * t[2],
            r[3] * t[0] + r[4] * t[1] + r[5] * t[2],
            r[6] * t[0] + r[7] * t[1] + r[8] * t[2],
        )
    }
}
