// SPDX-License-Identifier: GPL-3.0-only

//! Error types for depth reconstruction
//!
//! Per-pixel failures are never errors: invalid geometry is carried as zero
//! points, normals and texture coordinates. These types cover the few
//! operations that can fail as a whole.

use std::fmt;

/// Result type alias using DepthCloudError
pub type DepthCloudResult<T> = Result<T, DepthCloudError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum DepthCloudError {
    /// Cross-stream mapping errors
    Mapping(MappingError),
    /// Spatial filter errors
    Filter(FilterError),
    /// Export errors
    Export(ExportError),
    /// Configuration errors
    Config(String),
    /// Malformed input raster
    Raster(String),
    /// Generic error with message
    Other(String),
}

/// Cross-stream mapping errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Stored texture coordinate count does not match width x height
    DimensionMismatch { expected: usize, actual: usize },
}

/// Spatial filter precondition errors
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Window size must be odd and non-zero
    InvalidWindowSize(usize),
    /// Gaussian sigma must be positive and finite
    InvalidSigma(f32),
    /// Buffer length does not match width x height
    DimensionMismatch { expected: usize, actual: usize },
}

/// Export errors
#[derive(Debug, Clone)]
pub enum ExportError {
    /// File could not be created or written
    Io(String),
    /// Nothing valid to write (formats that require at least one point)
    EmptyGeometry,
    /// Texture or container encoding failed
    Encoding(String),
}

impl fmt::Display for DepthCloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthCloudError::Mapping(e) => write!(f, "Mapping error: {}", e),
            DepthCloudError::Filter(e) => write!(f, "Filter error: {}", e),
            DepthCloudError::Export(e) => write!(f, "Export error: {}", e),
            DepthCloudError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DepthCloudError::Raster(msg) => write!(f, "Raster error: {}", msg),
            DepthCloudError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::DimensionMismatch { expected, actual } => write!(
                f,
                "Texture coordinate count {} does not match raster size {}",
                actual, expected
            ),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::InvalidWindowSize(size) => {
                write!(f, "Window size must be odd and non-zero, got {}", size)
            }
            FilterError::InvalidSigma(sigma) => {
                write!(f, "Gaussian sigma must be positive, got {}", sigma)
            }
            FilterError::DimensionMismatch { expected, actual } => write!(
                f,
                "Buffer length {} does not match raster size {}",
                actual, expected
            ),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(msg) => write!(f, "I/O failure: {}", msg),
            ExportError::EmptyGeometry => write!(f, "No valid points to export"),
            ExportError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for DepthCloudError {}
impl std::error::Error for MappingError {}
impl std::error::Error for FilterError {}
impl std::error::Error for ExportError {}

// Conversions from sub-errors to DepthCloudError
impl From<MappingError> for DepthCloudError {
    fn from(err: MappingError) -> Self {
        DepthCloudError::Mapping(err)
    }
}

impl From<FilterError> for DepthCloudError {
    fn from(err: FilterError) -> Self {
        DepthCloudError::Filter(err)
    }
}

impl From<ExportError> for DepthCloudError {
    fn from(err: ExportError) -> Self {
        DepthCloudError::Export(err)
    }
}

impl From<String> for DepthCloudError {
    fn from(msg: String) -> Self {
        DepthCloudError::Other(msg)
    }
}

impl From<&str> for DepthCloudError {
    fn from(msg: &str) -> Self {
        DepthCloudError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for DepthCloudError {
    fn from(err: std::io::Error) -> Self {
        DepthCloudError::Export(ExportError::Io(err.to_string()))
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DepthCloudError {
    fn from(err: serde_json::Error) -> Self {
        DepthCloudError::Config(err.to_string())
    }
}
