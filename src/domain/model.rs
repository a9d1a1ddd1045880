use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One window of a source text produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Index of the text this chunk was cut from.
    pub source_index: usize,
    /// Offset in characters inside the source text.
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingReport {
    pub model: String,
    pub chunks: Vec<Chunk>,
    pub embeddings: Vec<Vec<f32>>,
    pub similarity: Vec<Vec<f32>>,
    pub generated_at: DateTime<Utc>,
}

impl EmbeddingReport {
    pub fn dimensions(&self) -> usize {
        self.embeddings.first().map(|e| e.len()).unwrap_or(0)
    }
}

/// Object detection output, boxes are `[x1, y1, x2, y2]` in image pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detections {
    pub bboxes: Vec<[f32; 4]>,
    pub labels: Vec<String>,
}

impl Detections {
    pub fn push(&mut self, bbox: [f32; 4], label: String) {
        self.bboxes.push(bbox);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// An RGB image ready to be sent to a vision backend.
#[derive(Debug, Clone)]
pub struct VisionInput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
}

/// One frame of the text generation stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TextResponse {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub backend_output: String,
}

#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub status: i32,
    pub output: String,
}

/// Parameters for one `sd` (stable-diffusion.cpp) invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdParams {
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub vae: Option<String>,
    pub init_image: Option<String>,
    pub mode: Option<String>,
    pub output: PathBuf,
    pub cfg_scale: f32,
    pub steps: u32,
    pub seed: i64,
    pub sampling_method: String,
    pub schedule: String,
    pub width: u32,
    pub height: u32,
    pub clip_skip: i32,
    pub threads: Option<u32>,
}
