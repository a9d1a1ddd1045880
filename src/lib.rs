pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use config::{EmbedConfig, ToolsConfig};
pub use core::embedding_run::EmbeddingRun;
pub use utils::error::{Result, ToolError};
