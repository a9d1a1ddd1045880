//! Streaming text generation RPC.
//!
//! `POST /TextGenerator/GenerateTextStream` takes `{"prompt": "..."}` and answers
//! with newline-delimited `{"response": "..."}` frames until generation ends.

use crate::domain::model::{TextRequest, TextResponse};
use crate::domain::ports::TextGenerator;
use crate::server::error::{ApiError, ApiResult};
use crate::utils::error::Result;
use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

pub const GENERATE_TEXT_STREAM_PATH: &str = "/TextGenerator/GenerateTextStream";
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Clone)]
pub struct TextGenState {
    generator: Arc<dyn TextGenerator>,
    // 同時進行中的串流數上限，許可在串流結束時釋放
    streams: Arc<Semaphore>,
}

impl TextGenState {
    pub fn new(generator: Arc<dyn TextGenerator>, max_concurrent_streams: usize) -> Self {
        Self {
            generator,
            streams: Arc::new(Semaphore::new(max_concurrent_streams)),
        }
    }
}

pub fn router(state: TextGenState) -> Router {
    Router::new()
        .route(GENERATE_TEXT_STREAM_PATH, post(generate_text_stream))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<TextGenState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "available_streams": state.streams.available_permits(),
    }))
}

fn encode_frame(item: Result<String>) -> Bytes {
    let frame = match item {
        Ok(text) => TextResponse::text(text),
        Err(e) => {
            tracing::warn!(error = %e, "Generation failed mid-stream");
            TextResponse::failure(e.user_friendly_message())
        }
    };

    encode_line(&frame)
}

/// Frame sent when a frame itself cannot be serialised.
const ENCODE_FAILURE_FRAME: &[u8] = b"{\"response\":\"\",\"error\":\"failed to encode response frame\"}\n";

fn encode_line<T: Serialize>(value: &T) -> Bytes {
    match serde_json::to_vec(value) {
        Ok(mut line) => {
            line.push(b'\n');
            Bytes::from(line)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response frame");
            Bytes::from_static(ENCODE_FAILURE_FRAME)
        }
    }
}

async fn generate_text_stream(
    State(state): State<TextGenState>,
    request: std::result::Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = request.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let permit = state
        .streams
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Internal("text generator is shutting down".to_string()))?;

    tracing::info!(
        prompt_chars = request.prompt.chars().count(),
        "📝 Text generation requested"
    );
    let stream = state.generator.generate_stream(&request.prompt).await?;

    let frames = stream.map(move |item| {
        let _permit = &permit;
        Ok::<_, Infallible>(encode_frame(item))
    });

    Ok(([(CONTENT_TYPE, NDJSON_CONTENT_TYPE)], Body::from_stream(frames)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ToolError;

    #[test]
    fn test_encode_frame() {
        assert_eq!(
            encode_frame(Ok("Hello".to_string())),
            Bytes::from_static(b"{\"response\":\"Hello\"}\n")
        );

        let failed = encode_frame(Err(ToolError::backend("ollama", "out of memory")));
        let frame: TextResponse = serde_json::from_slice(&failed).unwrap();
        assert_eq!(frame.response, "");
        assert!(frame.error.unwrap().contains("out of memory"));
    }

    #[test]
    fn test_unencodable_frame_becomes_error_frame() {
        // JSON 物件的 key 必須是字串
        let mut unencodable = std::collections::BTreeMap::new();
        unencodable.insert((1, 2), "value");

        let line = encode_line(&unencodable);
        assert!(line.ends_with(b"\n"));

        let frame: TextResponse = serde_json::from_slice(&line).unwrap();
        assert_eq!(frame.response, "");
        assert_eq!(frame.error.as_deref(), Some("failed to encode response frame"));
    }
}
