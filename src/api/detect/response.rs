// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire format of a detection report
//!
//! Physical values are rounded to two decimals here and nowhere else.

use serde::Serialize;

use crate::measurement::{Classification, ClassifiedDetection};
use crate::report::{DetectionReport, SizeCounts};

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One detection as returned to the client
///
/// The size fields are present only for detections of the target label.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: f32,
    /// `[x, y, width, height]` in pixels
    pub bbox: [f64; 4],
    pub width_px: f64,
    pub height_px: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_category: Option<String>,
    #[serde(rename = "width_µm", skip_serializing_if = "Option::is_none")]
    pub width_um: Option<f64>,
    #[serde(rename = "height_µm", skip_serializing_if = "Option::is_none")]
    pub height_um: Option<f64>,
    #[serde(rename = "diagonal_µm", skip_serializing_if = "Option::is_none")]
    pub diagonal_um: Option<f64>,
}

impl From<&ClassifiedDetection> for DetectionRecord {
    fn from(classified: &ClassifiedDetection) -> Self {
        let detection = &classified.detection;
        let mut record = DetectionRecord {
            label: detection.label.clone(),
            confidence: detection.confidence,
            bbox: detection.bbox.to_xywh(),
            width_px: detection.bbox.width,
            height_px: detection.bbox.height,
            size_category: None,
            width_um: None,
            height_um: None,
            diagonal_um: None,
        };

        if let Classification::Classified {
            measurement,
            category,
        } = &classified.classification
        {
            record.size_category = Some(category.name.clone());
            record.width_um = Some(round2(measurement.width_microns));
            record.height_um = Some(round2(measurement.height_microns));
            record.diagonal_um = Some(round2(measurement.diagonal_microns));
        }

        record
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalibrationInfoResponse {
    pub microns_per_pixel: f64,
    /// `[width, height]` of the imaged area
    #[serde(rename = "field_of_view_µm")]
    pub field_of_view_um: [f64; 2],
}

/// Response of POST /detect
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectResponse {
    pub count: usize,
    pub detections: Vec<DetectionRecord>,
    /// `[width, height]` in pixels
    pub image_size: [u32; 2],
    pub size_counts: SizeCounts,
    pub calibration_info: CalibrationInfoResponse,
}

impl From<&DetectionReport> for DetectResponse {
    fn from(report: &DetectionReport) -> Self {
        let (fov_w, fov_h) = report.calibration.field_of_view_microns;

        Self {
            count: report.count(),
            detections: report.detections.iter().map(DetectionRecord::from).collect(),
            image_size: [report.image_size.width, report.image_size.height],
            size_counts: report.size_counts.clone(),
            calibration_info: CalibrationInfoResponse {
                microns_per_pixel: report.calibration.microns_per_pixel,
                field_of_view_um: [round2(fov_w), round2(fov_h)],
            },
        }
    }
}
