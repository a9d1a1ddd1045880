use crate::core::ndjson::{text_stream, Frame};
use crate::domain::ports::{Embedder, TextGenerator, TextStream};
use crate::utils::error::{Result, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const BACKEND: &str = "ollama";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// `model` or `model:revision`, the form Ollama uses for tags.
pub fn model_reference(model: &str, revision: Option<&str>) -> String {
    match revision.map(str::trim).filter(|r| !r.is_empty()) {
        Some(revision) => format!("{}:{}", model, revision),
        None => model.to_string(),
    }
}

async fn backend_failure(response: reqwest::Response) -> ToolError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    // Ollama 錯誤格式為 {"error": "..."}
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    ToolError::backend(BACKEND, format!("HTTP {}: {}", status, message))
}

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        tracing::debug!(base_url, model, "Ollama embedder initialized");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let start = Instant::now();
        let response = self.client.post(self.embed_url()).json(&request).send().await?;
        tracing::debug!(
            status = %response.status(),
            batch_size = texts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Received embedding response"
        );

        if !response.status().is_success() {
            return Err(backend_failure(response).await);
        }

        let body: EmbedResponse = response.json().await?;
        Ok(body.embeddings)
    }
}

#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: usize,
}

impl OllamaGenerator {
    /// Generation streams can run for minutes, so only the connect phase has a timeout.
    pub fn new(base_url: &str, model: &str, max_tokens: usize, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        tracing::debug!(base_url, model, max_tokens, "Ollama generator initialized");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

fn parse_generate_line(line: &[u8]) -> Result<Frame> {
    let chunk: GenerateChunk = serde_json::from_slice(line)?;
    if let Some(error) = chunk.error {
        return Err(ToolError::backend(BACKEND, error));
    }
    if chunk.done {
        // 最後一筆可能仍帶有文字
        if chunk.response.is_empty() {
            return Ok(Frame::Done);
        }
        tracing::trace!("Final chunk carried text; emitting it before done");
        return Ok(Frame::Text(chunk.response));
    }
    if chunk.response.is_empty() {
        Ok(Frame::Skip)
    } else {
        Ok(Frame::Text(chunk.response))
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            options: GenerateOptions {
                num_predict: self.max_tokens,
            },
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Starting generation");
        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_failure(response).await);
        }

        Ok(text_stream(response.bytes_stream(), parse_generate_line))
    }
}
