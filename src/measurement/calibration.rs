// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pixel to micron conversion

use super::types::PhysicalMeasurement;
use crate::config::ConfigError;

/// Default calibration factor (microns per pixel)
pub const DEFAULT_MICRONS_PER_PIXEL: f64 = 5.0;

/// Microns-per-pixel calibration factor
///
/// Always positive and finite. Invalid factors are rejected when the service
/// starts, so request handling never sees one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration(f64);

impl Calibration {
    pub fn new(microns_per_pixel: f64) -> Result<Self, ConfigError> {
        if !microns_per_pixel.is_finite() || microns_per_pixel <= 0.0 {
            return Err(ConfigError::InvalidCalibration(microns_per_pixel));
        }
        Ok(Self(microns_per_pixel))
    }

    pub fn microns_per_pixel(&self) -> f64 {
        self.0
    }

    /// Convert a pixel length to microns
    pub fn to_microns(&self, pixels: f64) -> f64 {
        pixels * self.0
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self(DEFAULT_MICRONS_PER_PIXEL)
    }
}

/// Convert pixel dimensions to a physical measurement
///
/// The diagonal is the Euclidean norm of the converted width and height.
/// A zero dimension is allowed and simply yields a degenerate diagonal.
pub fn convert_to_physical(
    width_px: f64,
    height_px: f64,
    calibration: &Calibration,
) -> PhysicalMeasurement {
    let width_microns = calibration.to_microns(width_px);
    let height_microns = calibration.to_microns(height_px);

    PhysicalMeasurement {
        width_microns,
        height_microns,
        diagonal_microns: width_microns.hypot(height_microns),
    }
}
