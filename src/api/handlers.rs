// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Status endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::http_server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

/// GET / - Service banner and model state
pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "Microplastics AI Backend Running".to_string(),
        model_loaded: state.detectors.has_detector(),
    })
}

/// GET /health - Liveness check
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = if state.detectors.has_detector() {
        "loaded"
    } else {
        "not loaded"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        model: model.to_string(),
    })
}
