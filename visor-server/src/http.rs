//! HTTP server with API routes for the vision analyzers

use crate::quotes::{get_counting_message, get_quote};
use crate::rest::{to_data_uri, ErrorResponse, ImageInput};
use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use image::RgbImage;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use visor_core::VisionError;
use visor_vision::objects::CountStrategy;
use visor_vision::AnalysisOrchestrator;

/// Uploads are capped at 50 MB.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

/// API failure: a status code plus an `{ "error": ... }` body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<VisionError> for ApiError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::Input(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Request failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Create the HTTP router with all API routes.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/api/health", get(health_handler))
        .route("/api/detect-emotion", post(detect_emotion_handler))
        .route("/api/count-fingers", post(count_fingers_handler))
        .route("/api/count-objects", post(count_objects_handler))
        .route("/api/analyze-all", post(analyze_all_handler))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn home_handler() -> Json<Value> {
    Json(json!({
        "message": "Visor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET  /api/health",
            "POST /api/detect-emotion",
            "POST /api/count-fingers",
            "POST /api/count-objects",
            "POST /api/analyze-all",
        ]
    }))
}

async fn health_handler(State(state): State<ApiState>) -> Json<Value> {
    let capabilities = state.orchestrator.capabilities();
    Json(json!({
        "status": "healthy",
        "model": if capabilities.emotion { "loaded" } else { "not loaded" },
        "features": ["emotion", "fingers", "objects"],
        "capabilities": capabilities,
    }))
}

async fn detect_emotion_handler(
    State(state): State<ApiState>,
    input: ImageInput,
) -> Result<Json<Value>, ApiError> {
    let (analysis, annotated) = state.orchestrator.detect_emotion(&input.image, input.annotate);
    let mut body = to_json(&analysis)?;
    if let Some(emotions) = body.get_mut("emotions").and_then(Value::as_array_mut) {
        for entry in emotions {
            if let Some(label) = entry.get("emotion").and_then(Value::as_str) {
                let quote = get_quote(label);
                entry["quote"] = Value::String(quote);
            }
        }
    }
    attach_annotated(&mut body, annotated)?;
    Ok(Json(body))
}

async fn count_fingers_handler(
    State(state): State<ApiState>,
    input: ImageInput,
) -> Result<Json<Value>, ApiError> {
    let (analysis, annotated) = state.orchestrator.count_fingers(&input.image, input.annotate);
    let mut body = to_json(&analysis)?;
    body["message"] = Value::String(get_counting_message(analysis.total_fingers as usize, "fingers"));
    attach_annotated(&mut body, annotated)?;
    Ok(Json(body))
}

#[derive(Debug, Default, Deserialize)]
struct ObjectParams {
    method: Option<String>,
    color: Option<String>,
}

async fn count_objects_handler(
    State(state): State<ApiState>,
    Query(params): Query<ObjectParams>,
    input: ImageInput,
) -> Result<Json<Value>, ApiError> {
    let (analysis, annotated) = match (&params.color, &params.method) {
        (Some(color), _) => state.orchestrator.count_by_color(&input.image, color, input.annotate)?,
        (None, Some(method)) if method.trim().eq_ignore_ascii_case("auto") => {
            state.orchestrator.count_objects_auto(&input.image, input.annotate)
        }
        (None, Some(method)) => state.orchestrator.count_objects(
            &input.image,
            CountStrategy::from_name(method),
            input.annotate,
        ),
        (None, None) => {
            state.orchestrator.count_objects(&input.image, CountStrategy::Contour, input.annotate)
        }
    };
    let mut body = to_json(&analysis)?;
    body["message"] = Value::String(get_counting_message(analysis.count, "objects"));
    attach_annotated(&mut body, annotated)?;
    Ok(Json(body))
}

async fn analyze_all_handler(
    State(state): State<ApiState>,
    input: ImageInput,
) -> Result<Json<Value>, ApiError> {
    info!("Running combined analysis");
    let (combined, annotated) = state.orchestrator.analyze_all(&input.image, input.annotate);
    let mut body = to_json(&combined)?;

    if let Some(emotions) = body["emotion"].get_mut("emotions").and_then(Value::as_array_mut) {
        for entry in emotions {
            if let Some(label) = entry.get("emotion").and_then(Value::as_str) {
                let quote = get_quote(label);
                entry["quote"] = Value::String(quote);
            }
        }
    }
    body["fingers"]["message"] =
        Value::String(get_counting_message(combined.fingers.total_fingers as usize, "fingers"));
    body["objects"]["message"] =
        Value::String(get_counting_message(combined.objects.count, "objects"));

    attach_annotated(&mut body, annotated)?;
    Ok(Json(body))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn attach_annotated(body: &mut Value, annotated: Option<RgbImage>) -> Result<(), ApiError> {
    if let Some(image) = annotated {
        body["annotated_image"] = Value::String(to_data_uri(&image)?);
    }
    Ok(())
}
