// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Calibration and size classification of detected particles
//!
//! This module provides:
//! - Pixel to micron conversion with a fixed calibration factor
//! - Ordered size category table with half-open ranges
//! - Per-detection measurement for the target label
//!
//! Everything here is pure and request-independent.

pub mod calibration;
pub mod categories;
pub mod classifier;
pub mod types;

pub use calibration::{convert_to_physical, Calibration, DEFAULT_MICRONS_PER_PIXEL};
pub use categories::{classify_size, SizeCategory, SizeCategoryTable, DEFAULT_BREAKPOINTS};
pub use classifier::{
    classify_detection, should_classify, validate_geometry, MalformedGeometry, MeasurementConfig,
    DEFAULT_TARGET_LABEL,
};
pub use types::{BoundingBox, Classification, ClassifiedDetection, PhysicalMeasurement, RawDetection};
