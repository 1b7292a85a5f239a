// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-detection measurement and classification

use thiserror::Error;

use super::calibration::{convert_to_physical, Calibration};
use super::categories::SizeCategoryTable;
use super::types::{Classification, ClassifiedDetection, RawDetection};

/// Label whose detections are measured and size-classified by default
pub const DEFAULT_TARGET_LABEL: &str = "microplastic";

/// Detector output that cannot be measured
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedGeometry {
    #[error("bounding box has non-finite coordinates: {0:?}")]
    NonFinite([f64; 4]),

    #[error("bounding box has negative size: {width}x{height}")]
    NegativeSize { width: f64, height: f64 },

    #[error("bounding box has negative origin: ({x}, {y})")]
    NegativeOrigin { x: f64, y: f64 },

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f32),
}

/// Read-only measurement settings shared by all requests
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementConfig {
    pub calibration: Calibration,
    pub categories: SizeCategoryTable,
    pub target_label: String,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            categories: SizeCategoryTable::default(),
            target_label: DEFAULT_TARGET_LABEL.to_string(),
        }
    }
}

/// Whether a label is the measurable target class (case-insensitive)
pub fn should_classify(label: &str, target_label: &str) -> bool {
    label.eq_ignore_ascii_case(target_label)
}

/// Check detector output before measuring it
///
/// Zero-width or zero-height boxes pass: they are degenerate, not malformed.
pub fn validate_geometry(detection: &RawDetection) -> Result<(), MalformedGeometry> {
    let bbox = &detection.bbox;
    let coords = bbox.to_xywh();

    if coords.iter().any(|v| !v.is_finite()) {
        return Err(MalformedGeometry::NonFinite(coords));
    }
    if bbox.width < 0.0 || bbox.height < 0.0 {
        return Err(MalformedGeometry::NegativeSize {
            width: bbox.width,
            height: bbox.height,
        });
    }
    if bbox.x < 0.0 || bbox.y < 0.0 {
        return Err(MalformedGeometry::NegativeOrigin {
            x: bbox.x,
            y: bbox.y,
        });
    }
    if !(0.0..=1.0).contains(&detection.confidence) {
        return Err(MalformedGeometry::ConfidenceOutOfRange(detection.confidence));
    }

    Ok(())
}

/// Measure and classify one detection
///
/// Detections whose label is not the target label are passed through as
/// `Classification::Unclassified`.
pub fn classify_detection(
    detection: RawDetection,
    config: &MeasurementConfig,
) -> Result<ClassifiedDetection, MalformedGeometry> {
    validate_geometry(&detection)?;

    let classification = if should_classify(&detection.label, &config.target_label) {
        let measurement = convert_to_physical(
            detection.bbox.width,
            detection.bbox.height,
            &config.calibration,
        );
        let category = config
            .categories
            .classify(measurement.diagonal_microns)
            .clone();
        Classification::Classified {
            measurement,
            category,
        }
    } else {
        Classification::Unclassified
    };

    Ok(ClassifiedDetection {
        detection,
        classification,
    })
}
