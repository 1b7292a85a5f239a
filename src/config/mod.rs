// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every option can be given as a command-line flag or an environment
//! variable (a `.env` file is loaded first by the binary). Configuration is
//! validated once at startup; an invalid value stops the service.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::detector::{DetectorConfig, LabelTable};
use crate::measurement::{Calibration, MeasurementConfig, SizeCategoryTable};
use crate::report::MalformedPolicy;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("microns per pixel must be positive and finite, got {0}")]
    InvalidCalibration(f64),

    #[error("invalid size category table: {0}")]
    InvalidCategoryTable(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Microplastics detection service
#[derive(Parser, Debug, Clone)]
#[command(name = "microplastics-detector")]
#[command(about = "HTTP service that detects, measures and size-classifies microplastic particles", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Path to the YOLO detector exported as ONNX
    #[arg(long, env = "MODEL_PATH", default_value = "best.onnx")]
    pub model_path: PathBuf,

    /// Class labels: a file with one label per line, or a comma-separated list
    #[arg(long, env = "LABELS")]
    pub labels: Option<String>,

    /// Calibration factor in microns per pixel
    #[arg(long, env = "MICRONS_PER_PIXEL", default_value_t = 5.0)]
    pub microns_per_pixel: f64,

    /// Minimum detector confidence for a detection to be reported
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = 0.4)]
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = 0.45)]
    pub iou_threshold: f32,

    /// Square input size of the detector
    #[arg(long, env = "INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    /// Label whose detections are measured and size-classified
    #[arg(long, env = "TARGET_LABEL", default_value = "microplastic")]
    pub target_label: String,

    /// Size categories as name:lower_bound pairs, in microns
    #[arg(
        long,
        env = "SIZE_CATEGORIES",
        default_value = "nanoplastic:0,small:1,medium:100,large:1000"
    )]
    pub size_categories: String,

    /// Handling of detections with malformed geometry: drop or reject
    #[arg(long, env = "MALFORMED_POLICY", default_value = "drop")]
    pub malformed_policy: String,

    /// Timeout for a single detector run in seconds (0 disables)
    #[arg(long, env = "DETECT_TIMEOUT_SECS", default_value_t = 30)]
    pub detect_timeout_secs: u64,
}

impl ServiceConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: "host".to_string(),
                message: format!("{}:{} is not a socket address: {}", self.host, self.port, e),
            })
    }

    /// Calibration, category table and target label
    pub fn measurement_config(&self) -> Result<MeasurementConfig, ConfigError> {
        let calibration = Calibration::new(self.microns_per_pixel)?;
        let categories: SizeCategoryTable = self.size_categories.parse()?;

        let target_label = self.target_label.trim();
        if target_label.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "target_label".to_string(),
                message: "target label must not be empty".to_string(),
            });
        }

        Ok(MeasurementConfig {
            calibration,
            categories,
            target_label: target_label.to_string(),
        })
    }

    pub fn malformed_policy(&self) -> Result<MalformedPolicy, ConfigError> {
        self.malformed_policy.parse()
    }

    pub fn detect_timeout(&self) -> Option<Duration> {
        (self.detect_timeout_secs > 0).then(|| Duration::from_secs(self.detect_timeout_secs))
    }

    pub fn detector_config(&self) -> Result<DetectorConfig, ConfigError> {
        check_unit_interval("confidence_threshold", self.confidence_threshold)?;
        check_unit_interval("iou_threshold", self.iou_threshold)?;
        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(ConfigError::InvalidValue {
                field: "input_size".to_string(),
                message: format!("must be a positive multiple of 32, got {}", self.input_size),
            });
        }

        let labels = match self.labels.as_deref() {
            Some(source) => LabelTable::load(source).map_err(|e| ConfigError::InvalidValue {
                field: "labels".to_string(),
                message: e.to_string(),
            })?,
            None => LabelTable::default(),
        };

        Ok(DetectorConfig {
            model_path: Some(self.model_path.clone()),
            labels,
            fallback_label: self.target_label.trim().to_string(),
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            input_size: self.input_size,
            ..DetectorConfig::default()
        })
    }
}

fn check_unit_interval(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("must be within [0, 1], got {}", value),
        })
    }
}
