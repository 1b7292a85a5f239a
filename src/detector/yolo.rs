// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO particle detector running on ONNX Runtime
//!
//! Runs on CPU only. The session is not reentrant, so inference calls are
//! serialized through a mutex.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use super::postprocessing::{decode_output, non_max_suppression, to_raw_detections};
use super::preprocessing::preprocess_for_detection;
use super::{DetectorConfig, LabelTable, ObjectDetector};
use crate::measurement::RawDetection;

/// YOLO object detector (Ultralytics ONNX export)
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model name shown in logs and health output
    model_name: String,
    labels: LabelTable,
    fallback_label: String,
    confidence_threshold: f32,
    iou_threshold: f32,
    input_size: u32,
    max_detections: usize,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("labels", &self.labels.len())
            .field("confidence_threshold", &self.confidence_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>>(model_path: P, config: &DetectorConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detector model not found: {}", model_path.display());
        }

        info!("Loading detector model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detector model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detector input shape: {:?}", input.input_type);
        }

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());

        info!(
            "✅ Detector model '{}' loaded (CPU-only, {} labels)",
            model_name,
            config.labels.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            model_name,
            labels: config.labels.clone(),
            fallback_label: config.fallback_label.clone(),
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
            input_size: config.input_size,
            max_detections: config.max_detections,
        })
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    fn run(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        let started = Instant::now();
        let (input, letterbox) = preprocess_for_detection(image, self.input_size);

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let candidates = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("Detector session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Detector inference failed")?;

            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;

            debug!("Detector output shape: {:?}", output_tensor.shape());

            decode_output(output_tensor.view(), self.confidence_threshold)?
        };

        let kept = non_max_suppression(candidates, self.iou_threshold, self.max_detections);

        let detections =
            to_raw_detections(&kept, &letterbox, &self.labels, &self.fallback_label);

        debug!(
            "Detected {} objects in {}ms",
            detections.len(),
            started.elapsed().as_millis()
        );

        Ok(detections)
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        self.run(image)
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}
