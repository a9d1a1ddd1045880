use crate::utils::error::{Result, ToolError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_socket_addr, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "eternal.toml";

/// Shared settings for every tool. Each section is optional; missing fields
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub embedding: EmbeddingSection,
    pub textgen: TextGenSection,
    pub detection: DetectionSection,
    pub imagegen: ImageGenSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub backend_url: String,
    pub model: String,
    pub revision: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:11434".to_string(),
            model: "avsolatorio/GIST-small-Embedding-v0".to_string(),
            revision: None,
            chunk_size: 128,
            chunk_overlap: 32,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenSection {
    pub bind: String,
    pub backend_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub max_concurrent_streams: usize,
    pub connect_timeout_seconds: u64,
}

impl Default for TextGenSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:50051".to_string(),
            backend_url: "http://localhost:11434".to_string(),
            model: "phi3:3.8b-mini-128k-instruct-q8_0".to_string(),
            max_tokens: 128_000,
            max_concurrent_streams: 10,
            connect_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSection {
    pub bind: String,
    pub backend_url: String,
    pub max_new_tokens: usize,
    pub num_beams: usize,
    pub max_upload_mb: usize,
    pub timeout_seconds: u64,
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8081".to_string(),
            backend_url: "http://localhost:8090/generate".to_string(),
            max_new_tokens: 1024,
            num_beams: 3,
            max_upload_mb: 32,
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGenSection {
    pub sd_binary: String,
    pub model: Option<String>,
    pub vae: Option<String>,
    pub output: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub seed: i64,
    pub sampling_method: String,
    pub schedule: String,
    pub width: u32,
    pub height: u32,
    pub clip_skip: i32,
    pub threads: Option<u32>,
}

impl Default for ImageGenSection {
    fn default() -> Self {
        Self {
            sd_binary: "sd".to_string(),
            model: None,
            vae: None,
            output: "./image.png".to_string(),
            steps: 6,
            cfg_scale: 2.0,
            seed: 0,
            sampling_method: "dpm++2m".to_string(),
            schedule: "karras".to_string(),
            width: 512,
            height: 512,
            clip_skip: 1,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// JSON log lines for the servers.
    pub json: bool,
    /// EnvFilter directive, `RUST_LOG` still wins when set.
    pub filter: Option<String>,
}

impl ToolsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ToolError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ToolError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// An explicit path must exist; without one `eternal.toml` is used when
    /// present, otherwise the built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                Self::from_file(path)
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::info!("📁 Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// 替換環境變數 (例如 ${OLLAMA_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ToolError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for EmbeddingSection {
    fn validate(&self) -> Result<()> {
        validate_url("embedding.backend_url", &self.backend_url)?;
        validate_non_empty_string("embedding.model", &self.model)?;
        validate_positive_number("embedding.chunk_size", self.chunk_size, 1)?;
        validate_range(
            "embedding.chunk_overlap",
            self.chunk_overlap,
            0,
            self.chunk_size.saturating_sub(1),
        )?;
        validate_positive_number("embedding.timeout_seconds", self.timeout_seconds as usize, 1)?;
        Ok(())
    }
}

impl Validate for TextGenSection {
    fn validate(&self) -> Result<()> {
        validate_socket_addr("textgen.bind", &self.bind)?;
        validate_url("textgen.backend_url", &self.backend_url)?;
        validate_non_empty_string("textgen.model", &self.model)?;
        validate_positive_number("textgen.max_tokens", self.max_tokens, 1)?;
        validate_positive_number("textgen.max_concurrent_streams", self.max_concurrent_streams, 1)?;
        Ok(())
    }
}

impl Validate for DetectionSection {
    fn validate(&self) -> Result<()> {
        validate_socket_addr("detection.bind", &self.bind)?;
        validate_url("detection.backend_url", &self.backend_url)?;
        validate_positive_number("detection.max_new_tokens", self.max_new_tokens, 1)?;
        validate_positive_number("detection.num_beams", self.num_beams, 1)?;
        validate_range("detection.max_upload_mb", self.max_upload_mb, 1, 1024)?;
        Ok(())
    }
}

impl Validate for ImageGenSection {
    fn validate(&self) -> Result<()> {
        validate_path("imagegen.sd_binary", &self.sd_binary)?;
        validate_path("imagegen.output", &self.output)?;
        validate_positive_number("imagegen.steps", self.steps as usize, 1)?;
        validate_range("imagegen.cfg_scale", self.cfg_scale, 0.0, 30.0)?;
        Ok(())
    }
}

impl Validate for ToolsConfig {
    fn validate(&self) -> Result<()> {
        self.embedding.validate()?;
        self.textgen.validate()?;
        self.detection.validate()?;
        self.imagegen.validate()?;
        Ok(())
    }
}
