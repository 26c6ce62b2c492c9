// SPDX-License-Identifier: GPL-3.0-only

//! Camera calibration supplied by the device layer
//!
//! Intrinsics are calibrated at a reference resolution and rescaled to the
//! active stream; extrinsics map depth-frame points into the color frame.

mod extrinsics;
mod intrinsics;

pub use extrinsics::Extrinsics;
pub use intrinsics::Intrinsics;

use serde::{Deserialize, Serialize};

/// Color stream calibration used for texturing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorCalibration {
    pub intrinsics: Intrinsics,
    #[serde(default)]
    pub extrinsics: Extrinsics,
}

/// Everything needed to reconstruct one depth frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Depth stream intrinsics at their calibration resolution
    pub depth: Intrinsics,
    /// Optional color stream; `None` reconstructs without texture mapping
    #[serde(default)]
    pub color: Option<ColorCalibration>,
}

impl Calibration {
    pub fn depth_only(depth: Intrinsics) -> Self {
        Self { depth, color: None }
    }

    pub fn with_color(mut self, intrinsics: Intrinsics, extrinsics: Extrinsics) -> Self {
        self.color = Some(ColorCalibration {
            intrinsics,
            extrinsics,
        });
        self
    }

    /// Load calibration from a JSON file
    pub fn load(path: &std::path::Path) -> crate::DepthCloudResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            crate::DepthCloudError::Config(format!(
                "Failed to read calibration {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}
