use crate::domain::model::VisionInput;
use crate::domain::ports::VisionModel;
use crate::utils::error::{Result, ToolError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND: &str = "vision";

#[derive(Serialize)]
struct VisionRequest<'a> {
    task: &'a str,
    image: String,
    width: u32,
    height: u32,
    max_new_tokens: usize,
    num_beams: usize,
    do_sample: bool,
}

#[derive(Deserialize)]
struct VisionResponse {
    generated_text: String,
}

/// Decoding settings forwarded to the model server.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub max_new_tokens: usize,
    pub num_beams: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_new_tokens: 1024,
            num_beams: 3,
        }
    }
}

/// Client for a Florence-2 style model server that answers a task prompt plus
/// a base64 PNG with the raw generated text.
#[derive(Debug, Clone)]
pub struct HttpVisionModel {
    client: Client,
    endpoint: String,
    settings: GenerationSettings,
}

impl HttpVisionModel {
    pub fn new(endpoint: &str, settings: GenerationSettings, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            settings,
        })
    }
}

#[async_trait]
impl VisionModel for HttpVisionModel {
    async fn generate(&self, task: &str, image: &VisionInput) -> Result<String> {
        let request = VisionRequest {
            task,
            image: STANDARD.encode(&image.png),
            width: image.width,
            height: image.height,
            max_new_tokens: self.settings.max_new_tokens,
            num_beams: self.settings.num_beams,
            do_sample: false,
        };

        tracing::debug!(
            task,
            width = image.width,
            height = image.height,
            "Sending image to vision backend"
        );
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::backend(BACKEND, format!("HTTP {}: {}", status, body)));
        }

        let body: VisionResponse = response.json().await?;
        Ok(body.generated_text)
    }
}
