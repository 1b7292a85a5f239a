// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection and measurement data types

use super::categories::SizeCategory;

/// Axis-aligned bounding box in pixel coordinates (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// X coordinate of top-left corner
    pub x: f64,
    /// Y coordinate of top-left corner
    pub y: f64,
    /// Width of the bounding box
    pub width: f64,
    /// Height of the bounding box
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from corner coordinates (x1, y1, x2, y2)
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// `[x, y, width, height]`, the layout used on the wire
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A single detection as produced by the detector
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Detector-assigned class name
    pub label: String,
    /// Detection confidence score (0.0-1.0)
    pub confidence: f32,
    /// Box location and size in pixels
    pub bbox: BoundingBox,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Physical size of a detection, in microns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalMeasurement {
    pub width_microns: f64,
    pub height_microns: f64,
    pub diagonal_microns: f64,
}

/// Size classification attached to a detection
///
/// `Unclassified` means the detection was never measured (its label is not
/// the target label). It is not the same as a measurement of zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Unclassified,
    Classified {
        measurement: PhysicalMeasurement,
        category: SizeCategory,
    },
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        matches!(self, Classification::Classified { .. })
    }

    pub fn category(&self) -> Option<&SizeCategory> {
        match self {
            Classification::Classified { category, .. } => Some(category),
            Classification::Unclassified => None,
        }
    }

    pub fn measurement(&self) -> Option<&PhysicalMeasurement> {
        match self {
            Classification::Classified { measurement, .. } => Some(measurement),
            Classification::Unclassified => None,
        }
    }
}

/// A raw detection together with its (optional) size classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDetection {
    pub detection: RawDetection,
    pub classification: Classification,
}
