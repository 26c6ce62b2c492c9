// SPDX-License-Identifier: GPL-3.0-only

//! Spatial denoising filters for depth rasters
//!
//! Mean, Gaussian and median filters over an odd square window. A pixel is
//! filtered only when its full window lies inside the raster and contains no
//! missing samples (zero, negative or non-finite); everything else keeps its original value. Results
//! are computed into scratch first and copied back where they exceed the
//! validity threshold.

use crate::constants::FILTER_VALID_THRESHOLD;
use crate::errors::FilterError;
use crate::raster::DepthSample;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Filter flavor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterKind {
    /// Uniform weights 1 / size^2
    Mean,
    /// Weights exp(-(x^2 + y^2) / (2 sigma^2)), normalized to sum 1
    Gaussian { sigma: f32 },
    /// Middle element of the sorted window
    Median,
}

/// A filter kind with its window size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFilter {
    #[serde(flatten)]
    pub kind: FilterKind,
    /// Odd window edge length
    pub size: usize,
}

impl SpatialFilter {
    pub fn mean(size: usize) -> Self {
        Self {
            kind: FilterKind::Mean,
            size,
        }
    }

    pub fn gaussian(size: usize, sigma: f32) -> Self {
        Self {
            kind: FilterKind::Gaussian { sigma },
            size,
        }
    }

    pub fn median(size: usize) -> Self {
        Self {
            kind: FilterKind::Median,
            size,
        }
    }

    /// Filter `data` (row-major, width x height) in place
    pub fn apply<T: DepthSample>(
        &self,
        data: &mut [T],
        width: u32,
        height: u32,
    ) -> Result<(), FilterError> {
        match self.kind {
            FilterKind::Mean => mean_filter(data, width, height, self.size),
            FilterKind::Gaussian { sigma } => gaussian_filter(data, width, height, self.size, sigma),
            FilterKind::Median => median_filter(data, width, height, self.size),
        }
    }
}

fn check_preconditions<T>(data: &[T], width: u32, height: u32, size: usize) -> Result<(), FilterError> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidWindowSize(size));
    }
    let expected = width as usize * height as usize;
    if data.len() != expected {
        return Err(FilterError::DimensionMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Row-major kernel of `size * size` weights
fn uniform_kernel(size: usize) -> Vec<f32> {
    let weight = 1.0 / (size * size) as f32;
    vec![weight; size * size]
}

fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-half..=half)
        .flat_map(|y| (-half..=half).map(move |x| (x, y)))
        .map(|(x, y)| (-((x * x + y * y) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// A sample with a positive, finite depth
#[inline]
fn is_valid_sample(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

/// Shared two-pass driver: `reduce` sees each complete, hole-free window
fn filter_windows<T, F>(data: &mut [T], width: u32, height: u32, size: usize, reduce: F)
where
    T: DepthSample,
    F: Fn(&mut Vec<f32>) -> f32 + Sync,
{
    let w = width as usize;
    let h = height as usize;
    let half = size / 2;
    if w < size || h < size {
        return;
    }

    let source: Vec<f32> = data.iter().map(|d| d.to_f32()).collect();
    let mut scratch = source.clone();

    scratch
        .par_chunks_mut(w)
        .enumerate()
        .skip(half)
        .take(h - 2 * half)
        .for_each_init(
            || Vec::with_capacity(size * size),
            |window, (v, row)| {
                'pixel: for u in half..w - half {
                    window.clear();
                    for wy in v - half..=v + half {
                        let line = &source[wy * w + u - half..=wy * w + u + half];
                        if line.iter().any(|&d| !is_valid_sample(d)) {
                            continue 'pixel;
                        }
                        window.extend_from_slice(line);
                    }
                    row[u] = reduce(window);
                }
            },
        );

    let mut written = 0usize;
    for ((out, &filtered), &original) in data.iter_mut().zip(&scratch).zip(&source) {
        if filtered > FILTER_VALID_THRESHOLD && filtered != original {
            *out = T::from_f32(filtered);
            written += 1;
        }
    }

    debug!(width, height, size, written, "Spatial filter applied");
}

/// Uniform mean over the window
pub fn mean_filter<T: DepthSample>(
    data: &mut [T],
    width: u32,
    height: u32,
    size: usize,
) -> Result<(), FilterError> {
    check_preconditions(data, width, height, size)?;
    let kernel = uniform_kernel(size);
    filter_windows(data, width, height, size, |window| {
        window.iter().zip(&kernel).map(|(v, k)| v * k).sum()
    });
    Ok(())
}

/// Normalized Gaussian weighting over the window
pub fn gaussian_filter<T: DepthSample>(
    data: &mut [T],
    width: u32,
    height: u32,
    size: usize,
    sigma: f32,
) -> Result<(), FilterError> {
    check_preconditions(data, width, height, size)?;
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(FilterError::InvalidSigma(sigma));
    }
    let kernel = gaussian_kernel(size, sigma);
    filter_windows(data, width, height, size, |window| {
        window.iter().zip(&kernel).map(|(v, k)| v * k).sum()
    });
    Ok(())
}

/// Median of the window (full sort)
pub fn median_filter<T: DepthSample>(
    data: &mut [T],
    width: u32,
    height: u32,
    size: usize,
) -> Result<(), FilterError> {
    check_preconditions(data, width, height, size)?;
    filter_windows(data, width, height, size, |window| {
        window.sort_unstable_by(|a, b| a.total_cmp(b));
        window[window.len() / 2]
    });
    Ok(())
}
