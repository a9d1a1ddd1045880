use crate::adapters::script::ScriptExecutor;
use crate::domain::model::{GeneratedImage, SdParams};
use crate::domain::ports::ImageGenerator;
use crate::utils::error::{Result, ToolError};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;

/// Generates images by running stable-diffusion.cpp's `sd` command line tool.
#[derive(Debug, Clone)]
pub struct SdCliGenerator {
    binary: PathBuf,
    executor: ScriptExecutor,
}

impl SdCliGenerator {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            executor: ScriptExecutor::direct(),
        }
    }
}

#[async_trait]
impl ImageGenerator for SdCliGenerator {
    async fn generate(&self, params: &SdParams) -> Result<GeneratedImage> {
        params.validate()?;

        if let Some(parent) = params.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!(
            "🎨 Generating image: {} steps, cfg {}, seed {}",
            params.steps,
            params.cfg_scale,
            params.seed
        );
        let start = Instant::now();
        let output = self.executor.execute(&self.binary, &params.to_args()).await?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "sd finished");

        if !tokio::fs::try_exists(&params.output).await? {
            return Err(ToolError::ProcessError {
                program: self.binary.display().to_string(),
                code: Some(output.status),
                output: format!(
                    "no image written to {}\n{}",
                    params.output.display(),
                    output.output
                ),
            });
        }

        let (width, height) = image::image_dimensions(&params.output)?;

        Ok(GeneratedImage {
            path: params.output.clone(),
            width,
            height,
            backend_output: output.output,
        })
    }
}
