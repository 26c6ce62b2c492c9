// SPDX-License-Identifier: GPL-3.0-only

use crate::colorizer::{ColorRamp, Colorizer, RampKind};
use crate::constants::{
    FACE_DISCONTINUITY_MM, NORMAL_DISCONTINUITY_MM, NORMAL_MIN_DEPTH_MM, colorizer,
};
use crate::errors::{DepthCloudError, DepthCloudResult};
use crate::export::ExportOptions;
use crate::filters::SpatialFilter;
use crate::reconstruction::NormalParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name inside the application config directory
const CONFIG_FILE: &str = "config.json";

/// Depth colorization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizerSettings {
    /// Near end of the colorized range (millimeters)
    pub min_mm: f32,
    /// Far end of the colorized range (millimeters)
    pub max_mm: f32,
    /// Lookup table entries
    pub table_size: usize,
    pub ramp: RampKind,
}

impl Default for ColorizerSettings {
    fn default() -> Self {
        Self {
            min_mm: colorizer::RANGE_MIN_MM,
            max_mm: colorizer::RANGE_MAX_MM,
            table_size: colorizer::TABLE_SIZE,
            ramp: RampKind::default(),
        }
    }
}

impl ColorizerSettings {
    /// Build a colorizer with this ramp, table size and range
    pub fn build(&self) -> Colorizer {
        let mut colorizer = Colorizer::new(ColorRamp::from_kind(self.ramp), self.table_size);
        colorizer.set_range(self.min_mm, self.max_mm);
        colorizer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Drop samples without depth (or without a color mapping) instead of
    /// emitting zeroed slots
    pub remove_invalid: bool,
    /// Corners differing by more than this skip normal accumulation (mm)
    pub normal_discontinuity_mm: f32,
    /// Corners at or below this depth skip normal accumulation (mm)
    pub normal_min_depth_mm: f32,
    /// Corners differing by more than this produce no mesh face (mm)
    pub face_discontinuity_mm: f32,
    pub colorizer: ColorizerSettings,
    pub export: ExportOptions,
    /// Denoise the depth raster before back-projection
    pub filter: Option<SpatialFilter>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remove_invalid: false,
            normal_discontinuity_mm: NORMAL_DISCONTINUITY_MM,
            normal_min_depth_mm: NORMAL_MIN_DEPTH_MM,
            face_discontinuity_mm: FACE_DISCONTINUITY_MM,
            colorizer: ColorizerSettings::default(),
            export: ExportOptions::default(),
            filter: None,
        }
    }
}

impl Config {
    /// `<config dir>/depth-cloud/config.json`, when the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> DepthCloudResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            DepthCloudError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            DepthCloudError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from the default location, or defaults if there is none
    pub fn load_default() -> DepthCloudResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> DepthCloudResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn normal_params(&self) -> NormalParams {
        NormalParams {
            discontinuity_mm: self.normal_discontinuity_mm,
            min_depth_mm: self.normal_min_depth_mm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();
        assert!(!config.remove_invalid);
        assert_eq!(config.normal_params(), NormalParams::default());
        assert_eq!(config.face_discontinuity_mm, 10.0);
        assert_eq!(config.colorizer.table_size, 4001);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"remove_invalid": true, "colorizer": {"ramp": "turbo"}}"#)
                .unwrap();
        assert!(config.remove_invalid);
        assert_eq!(config.colorizer.ramp, RampKind::Turbo);
        assert_eq!(config.colorizer.max_mm, 5000.0);
        assert!(config.export.vertex_color);
    }

    #[test]
    fn test_colorizer_settings_build() {
        let settings = ColorizerSettings {
            min_mm: 500.0,
            max_mm: 1500.0,
            table_size: 256,
            ramp: RampKind::Grayscale,
        };
        let colorizer = settings.build();
        assert_eq!(colorizer.table_size(), 256);
        assert_eq!(colorizer.range(), (500.0, 1500.0));
    }
}
