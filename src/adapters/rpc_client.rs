use crate::core::ndjson::{text_stream, Frame};
use crate::domain::model::{TextRequest, TextResponse};
use crate::domain::ports::{TextGenerator, TextStream};
use crate::server::textgen::GENERATE_TEXT_STREAM_PATH;
use crate::utils::error::{Result, ToolError};
use async_trait::async_trait;
use reqwest::Client;

/// Client side of `TextGenerator/GenerateTextStream`.
#[derive(Debug, Clone)]
pub struct TextGeneratorClient {
    client: Client,
    base_url: String,
}

impl TextGeneratorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_frame(line: &[u8]) -> Result<Frame> {
    let frame: TextResponse = serde_json::from_slice(line)?;
    if let Some(error) = frame.error {
        return Err(ToolError::backend("textgen-server", error));
    }
    Ok(if frame.response.is_empty() {
        Frame::Skip
    } else {
        Frame::Text(frame.response)
    })
}

#[async_trait]
impl TextGenerator for TextGeneratorClient {
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        let url = format!("{}{}", self.base_url, GENERATE_TEXT_STREAM_PATH);
        let response = self
            .client
            .post(url)
            .json(&TextRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::backend(
                "textgen-server",
                format!("HTTP {}: {}", status, body),
            ));
        }

        Ok(text_stream(response.bytes_stream(), parse_frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        assert_eq!(
            parse_frame(br#"{"response":"fmt.Println"}"#).unwrap(),
            Frame::Text("fmt.Println".to_string())
        );
        assert_eq!(parse_frame(br#"{"response":""}"#).unwrap(), Frame::Skip);
        assert!(parse_frame(br#"{"response":"","error":"backend down"}"#).is_err());
    }
}
