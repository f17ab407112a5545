//! Prediction endpoint
//!
//! Accepts a multipart upload with a `file` field, runs the classifier,
//! and returns the predicted class, its description, and the confidence
//! as a percentage.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use oncolens::OncoLensError;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub description: String,
    pub confidence: f64,
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// POST /predict - Classify an uploaded image
pub async fn predict(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, (StatusCode, Json<Value>)> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("Invalid multipart request: {}", e),
        )
    })? {
        if field.name() == Some("file") {
            file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Failed to read uploaded file: {}", e),
                )
            })?;
            file_bytes = Some(bytes.to_vec());
        }
    }

    let bytes = match file_bytes {
        Some(bytes) if !bytes.is_empty() => bytes,
        Some(_) => {
            return Err(error_response(StatusCode::BAD_REQUEST, "No selected file"));
        }
        None => {
            return Err(error_response(StatusCode::BAD_REQUEST, "No file part"));
        }
    };

    // The forward pass is CPU-bound; keep it off the async workers
    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let predictor = worker_state
            .predictor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        predictor.predict_bytes(&bytes)
    })
    .await
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Inference task failed: {}", e),
            )
        })?;

    match result {
        Ok(prediction) => {
            info!(
                "Predicted '{}' ({:.2}%) for '{}' in {:.1} ms",
                prediction.prediction, prediction.confidence, file_name, prediction.inference_time_ms
            );
            Ok(Json(PredictResponse {
                prediction: prediction.prediction,
                description: prediction.description,
                confidence: prediction.confidence,
            }))
        }
        Err(e @ (OncoLensError::ImageDecode(_) | OncoLensError::InvalidInput(_))) => {
            warn!("Rejected upload '{}': {}", file_name, e);
            Err(error_response(StatusCode::BAD_REQUEST, &e.to_string()))
        }
        Err(e) => {
            warn!("Inference failed for '{}': {}", file_name, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ))
        }
    }
}
