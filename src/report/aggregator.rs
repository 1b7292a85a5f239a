// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Builds one detection report from a detector run

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::measurement::{
    classify_detection, ClassifiedDetection, MalformedGeometry, MeasurementConfig, RawDetection,
    SizeCategoryTable,
};

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What to do with a detection whose geometry cannot be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Leave the detection out of the report and keep going
    #[default]
    Drop,
    /// Fail the whole report
    Reject,
}

impl FromStr for MalformedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(MalformedPolicy::Drop),
            "reject" => Ok(MalformedPolicy::Reject),
            other => Err(ConfigError::InvalidValue {
                field: "malformed_policy".to_string(),
                message: format!("expected 'drop' or 'reject', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("detection #{index} has malformed geometry: {source}")]
    MalformedGeometry {
        index: usize,
        #[source]
        source: MalformedGeometry,
    },
}

/// Per-category counts, kept in table order
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCounts {
    counts: Vec<(String, usize)>,
}

impl SizeCounts {
    /// Every category of the table, starting at zero
    pub fn zeroed(table: &SizeCategoryTable) -> Self {
        Self {
            counts: table.names().map(|name| (name.to_string(), 0)).collect(),
        }
    }

    fn increment(&mut self, name: &str) {
        if let Some((_, count)) = self.counts.iter_mut().find(|(n, _)| n == name) {
            *count += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for SizeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, count) in &self.counts {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Calibration metadata for one image, at full precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationInfo {
    pub microns_per_pixel: f64,
    /// (width, height) of the imaged area in microns
    pub field_of_view_microns: (f64, f64),
}

/// Everything measured in one image
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    /// Detections in detector output order
    pub detections: Vec<ClassifiedDetection>,
    pub size_counts: SizeCounts,
    pub image_size: ImageSize,
    pub calibration: CalibrationInfo,
    /// Detections left out under `MalformedPolicy::Drop`
    pub dropped: usize,
}

impl DetectionReport {
    pub fn count(&self) -> usize {
        self.detections.len()
    }

    /// Number of detections that received a size category
    pub fn classified_count(&self) -> usize {
        self.detections
            .iter()
            .filter(|d| d.classification.is_classified())
            .count()
    }
}

/// Aggregate the detections of one image into a report
///
/// Output order matches input order. An empty input is a valid report with
/// all counts at zero.
pub fn build_report(
    detections: Vec<RawDetection>,
    image_size: ImageSize,
    config: &MeasurementConfig,
    policy: MalformedPolicy,
) -> Result<DetectionReport, ReportError> {
    let mut size_counts = SizeCounts::zeroed(&config.categories);
    let mut classified = Vec::with_capacity(detections.len());
    let mut dropped = 0;

    for (index, detection) in detections.into_iter().enumerate() {
        match classify_detection(detection, config) {
            Ok(result) => {
                if let Some(category) = result.classification.category() {
                    size_counts.increment(&category.name);
                }
                classified.push(result);
            }
            Err(source) => match policy {
                MalformedPolicy::Drop => {
                    warn!("Dropping detection #{}: {}", index, source);
                    dropped += 1;
                }
                MalformedPolicy::Reject => {
                    return Err(ReportError::MalformedGeometry { index, source });
                }
            },
        }
    }

    let calibration = &config.calibration;
    let field_of_view_microns = (
        calibration.to_microns(image_size.width as f64),
        calibration.to_microns(image_size.height as f64),
    );

    debug!(
        "Report built: {} detections, {} classified, {} dropped",
        classified.len(),
        size_counts.total(),
        dropped
    );

    Ok(DetectionReport {
        detections: classified,
        size_counts,
        image_size,
        calibration: CalibrationInfo {
            microns_per_pixel: calibration.microns_per_pixel(),
            field_of_view_microns,
        },
        dropped,
    })
}
