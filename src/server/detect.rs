//! `POST /generate`: multipart image upload in, Florence `<OD>` detections out.

use crate::core::florence::{parse_od, OD_TASK};
use crate::domain::model::VisionInput;
use crate::domain::ports::VisionModel;
use crate::server::error::{ApiError, ApiResult};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::ImageFormat;
use serde_json::{Map, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const GENERATE_PATH: &str = "/generate";
pub const FILE_FIELD: &str = "file";

const NO_FILE_PART: &str = "No file part in the request";
const NO_SELECTED_FILE: &str = "No selected file";

#[derive(Clone)]
pub struct DetectState {
    pub model: Arc<dyn VisionModel>,
}

pub fn router(state: DetectState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(GENERATE_PATH, post(generate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<DetectState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request is not multipart");
        ApiError::BadRequest(NO_FILE_PART.to_string())
    })?;

    let (filename, data) = read_file_field(&mut multipart).await?;
    tracing::info!(filename = %filename, bytes = data.len(), "📷 Received image");

    let input = tokio::task::spawn_blocking(move || decode_image(&data))
        .await
        .map_err(|e| ApiError::Internal(format!("image decoding task failed: {}", e)))??;

    let text = state.model.generate(OD_TASK, &input).await?;
    let detections = parse_od(&text, input.width, input.height);
    tracing::info!(objects = detections.len(), "Detection finished");

    let mut body = Map::new();
    body.insert(
        OD_TASK.to_string(),
        serde_json::to_value(&detections).map_err(crate::utils::error::ToolError::from)?,
    );
    Ok(Json(Value::Object(body)))
}

async fn read_file_field(multipart: &mut Multipart) -> ApiResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::BadRequest(NO_SELECTED_FILE.to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        return Ok((filename, data.to_vec()));
    }

    Err(ApiError::BadRequest(NO_FILE_PART.to_string()))
}

// 保留原本的狀態碼，超過上傳上限時為 413
fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::Rejected {
        status: e.status(),
        message: e.body_text(),
    }
}

/// Decodes any supported format, converts to RGB and re-encodes as PNG.
pub fn decode_image(data: &[u8]) -> ApiResult<VisionInput> {
    let rgb = image::load_from_memory(data)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .to_rgb8();

    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ApiError::Internal(format!("failed to encode image: {}", e)))?;

    Ok(VisionInput {
        png,
        width: rgb.width(),
        height: rgb.height(),
    })
}
