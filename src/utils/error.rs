use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Backend request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Backend error ({backend}): {message}")]
    BackendError { backend: String, message: String },

    #[error("Process '{program}' failed with exit code {code:?}: {output}")]
    ProcessError {
        program: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Backend,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ToolError {
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::BackendError {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolError::ApiError(_) => ErrorCategory::Network,
            ToolError::ConfigValidationError { .. }
            | ToolError::InvalidConfigValueError { .. }
            | ToolError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ToolError::BackendError { .. } | ToolError::ProcessError { .. } => {
                ErrorCategory::Backend
            }
            ToolError::SerializationError(_)
            | ToolError::ImageError(_)
            | ToolError::ProcessingError { .. }
            | ToolError::ValidationError { .. } => ErrorCategory::Data,
            ToolError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 後端暫時不可用，通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Backend => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 命令列結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ToolError::ApiError(e) if e.is_connect() => {
                "Could not connect to the inference backend".to_string()
            }
            ToolError::ApiError(e) if e.is_timeout() => {
                "The inference backend did not answer in time".to_string()
            }
            ToolError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            ToolError::ProcessError { program, code, .. } => match code {
                Some(code) => format!("'{}' exited with code {}", program, code),
                None => format!("'{}' was terminated by a signal", program),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the backend URL is correct and the service is running",
            ErrorCategory::Configuration => "Review the command line flags and eternal.toml",
            ErrorCategory::Backend => "Inspect the backend output above; the model may be missing or failed to load",
            ErrorCategory::Data => "Check the input data passed to the tool",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_one() {
        let err = ToolError::MissingConfigError {
            field: "imagegen.model".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("imagegen.model"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = ToolError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_process_error_message() {
        let err = ToolError::ProcessError {
            program: "sd".to_string(),
            code: Some(4),
            output: "model not found".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "'sd' exited with code 4");
        assert!(err.to_string().contains("model not found"));
    }
}
