//! HTTP routes for the prediction API

use crate::error::PredictError;
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::metadata::ModelMetadata;
use crate::types::prediction::PredictionResponse;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Version reported by the home route
pub const API_VERSION: &str = "1.0";

/// Route table, logged at startup
pub const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/", "Home"),
    ("GET", "/model-info", "Model information"),
    ("POST", "/predict", "Make prediction"),
    ("GET", "/health", "Health check"),
];

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: Arc<InferenceEngine>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { engine, metrics }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/model-info", get(model_info))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
    pub status: String,
    pub model_accuracy: f64,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Obesity Prediction API".to_string(),
        status: "running".to_string(),
        model_accuracy: state.engine.metadata().accuracy,
        version: API_VERSION.to_string(),
    })
}

async fn model_info(State(state): State<AppState>) -> Json<ModelMetadata> {
    Json(state.engine.metadata().clone())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    let start_time = Instant::now();

    match run_prediction(&state.engine, &body) {
        Ok(result) => {
            let latency = start_time.elapsed();
            state
                .metrics
                .record_prediction(latency, &result.class, result.confidence);
            info!(
                class = %result.class,
                confidence = result.confidence,
                bmi = result.bmi,
                latency_us = latency.as_micros() as u64,
                "Prediction served"
            );
            Ok(Json(result.into_response()))
        }
        Err(e) => {
            state.metrics.record_failure(start_time.elapsed(), e.kind());
            Err(e)
        }
    }
}

fn run_prediction(
    engine: &InferenceEngine,
    body: &[u8],
) -> Result<crate::types::prediction::PredictionResult, PredictError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| PredictError::MalformedBody(e.to_string()))?;
    // Anything but an object carries no fields
    let record = match payload {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    engine.predict(&record)
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Prediction failed");
        } else {
            warn!(kind = self.kind(), error = %self, "Prediction rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: "error".to_string(),
        };
        (status, Json(body)).into_response()
    }
}
