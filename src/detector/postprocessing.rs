// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of the YOLO detection head
//!
//! The exported head has shape `[1, 4 + num_classes, num_anchors]`, each
//! anchor holding `(cx, cy, w, h)` in input pixels followed by one score per
//! class. Some exports transpose the last two axes; both layouts are accepted.

use anyhow::Result;
use ndarray::{ArrayViewD, Axis, Ix2};

use super::labels::LabelTable;
use super::preprocessing::LetterboxInfo;
use crate::measurement::{BoundingBox, RawDetection};

/// A box that survived confidence filtering, in `(x1, y1, x2, y2)` form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Decode the raw head into candidates in input-image space
pub fn decode_output(output: ArrayViewD<f32>, confidence_threshold: f32) -> Result<Vec<Candidate>> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        anyhow::bail!(
            "Unexpected detector output shape: {:?}, expected [1, 4 + classes, anchors]",
            shape
        );
    }

    let preds = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()?;

    // Attributes along rows, anchors along columns. Anchors always outnumber
    // the attributes of a real model, which tells the two layouts apart.
    let preds = if shape[1] > shape[2] {
        preds.reversed_axes()
    } else {
        preds
    };

    let num_attrs = preds.nrows();
    if num_attrs < 5 {
        anyhow::bail!(
            "Detector output has {} attributes per anchor, need at least 5",
            num_attrs
        );
    }

    let mut candidates = Vec::new();
    for anchor in preds.axis_iter(Axis(1)) {
        let (class_id, confidence) = anchor
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (id, score)| {
                if score > best.1 {
                    (id, score)
                } else {
                    best
                }
            });

        if confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        candidates.push(Candidate {
            class_id,
            confidence,
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        });
    }

    Ok(candidates)
}

/// Per-class non-maximum suppression
///
/// Keeps the highest-confidence box of every overlapping group and returns
/// the survivors sorted by descending confidence, at most `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Map a candidate from input space back to the original image, clipped to its bounds
pub fn scale_to_original(candidate: &Candidate, info: &LetterboxInfo) -> Candidate {
    let max_x = info.original_width as f32;
    let max_y = info.original_height as f32;

    let (x1, y1) = info.to_original(candidate.x1, candidate.y1);
    let (x2, y2) = info.to_original(candidate.x2, candidate.y2);

    Candidate {
        x1: x1.clamp(0.0, max_x),
        y1: y1.clamp(0.0, max_y),
        x2: x2.clamp(0.0, max_x),
        y2: y2.clamp(0.0, max_y),
        ..*candidate
    }
}

/// Turn kept candidates into detections in original image coordinates
///
/// Order is preserved. Labels come from `labels`, or `fallback` when the
/// table is empty.
pub fn to_raw_detections(
    candidates: &[Candidate],
    info: &LetterboxInfo,
    labels: &LabelTable,
    fallback: &str,
) -> Vec<RawDetection> {
    candidates
        .iter()
        .map(|c| scale_to_original(c, info))
        .map(|c| {
            RawDetection::new(
                labels.resolve(c.class_id, fallback),
                c.confidence,
                BoundingBox::from_corners(c.x1 as f64, c.y1 as f64, c.x2 as f64, c.y2 as f64),
            )
        })
        .collect()
}
