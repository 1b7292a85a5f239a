// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Particle detector integration
//!
//! This module provides:
//! - The `ObjectDetector` seam used by the HTTP layer
//! - A YOLO detector running on ONNX Runtime (CPU)
//! - `DetectorManager`, which loads the detector at startup
//!
//! The detector applies the confidence threshold itself; detections reach
//! the measurement engine already filtered.

pub mod labels;
pub mod postprocessing;
pub mod preprocessing;
pub mod yolo;

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;

use crate::measurement::{RawDetection, DEFAULT_TARGET_LABEL};

pub use labels::LabelTable;
pub use preprocessing::DEFAULT_INPUT_SIZE;
pub use yolo::YoloDetector;

/// Something that finds objects in an image
///
/// Implementations must be safe to call from several request handlers at
/// once; any internal serialization is their own business.
pub trait ObjectDetector: Send + Sync {
    /// Detections in detector output order, already confidence-filtered
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<RawDetection>>;

    /// Name of the underlying model
    fn model_name(&self) -> String;
}

/// Configuration for loading the detector
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the ONNX model (optional)
    pub model_path: Option<PathBuf>,
    pub labels: LabelTable,
    /// Label used for every class when `labels` is empty
    pub fallback_label: String,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: Some(PathBuf::from("best.onnx")),
            labels: LabelTable::default(),
            fallback_label: DEFAULT_TARGET_LABEL.to_string(),
            confidence_threshold: 0.4,
            iou_threshold: 0.45,
            input_size: DEFAULT_INPUT_SIZE,
            max_detections: 300,
            intra_threads: 4,
        }
    }
}

/// Holds the detector, if one could be loaded
pub struct DetectorManager {
    detector: Option<Arc<dyn ObjectDetector>>,
}

impl DetectorManager {
    /// Load the detector described by `config`
    ///
    /// A missing or broken model is logged and leaves the manager empty; the
    /// service keeps running and reports the model as not loaded.
    pub async fn new(config: DetectorConfig) -> Self {
        let detector = match config.model_path {
            Some(ref path) => match YoloDetector::new(path, &config).await {
                Ok(detector) => {
                    tracing::info!("✅ Model loaded successfully from {}", path.display());
                    Some(Arc::new(detector) as Arc<dyn ObjectDetector>)
                }
                Err(e) => {
                    tracing::warn!("❌ Error loading model from {}: {:#}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        Self { detector }
    }

    /// Wrap an already constructed detector
    pub fn with_detector(detector: Arc<dyn ObjectDetector>) -> Self {
        Self {
            detector: Some(detector),
        }
    }

    /// A manager with no detector loaded
    pub fn empty() -> Self {
        Self { detector: None }
    }

    pub fn get_detector(&self) -> Option<Arc<dyn ObjectDetector>> {
        self.detector.clone()
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn model_name(&self) -> Option<String> {
        self.detector.as_ref().map(|d| d.model_name())
    }
}
