pub mod toml_config;

use crate::config::toml_config::EmbeddingSection;
use clap::Parser;

pub use toml_config::ToolsConfig;

pub const DEFAULT_TEXTS: [&str; 3] = [
    "Illustration of the REaLTabFormer model. The left block shows the non-relational tabular data model using GPT-2 with a causal LM head. In contrast, the right block shows how a relational dataset's child table is modeled using a sequence-to-sequence (Seq2Seq) model. The Seq2Seq model uses the observations in the parent table to condition the generation of the observations in the child table. The trained GPT-2 model on the parent table, with weights frozen, is also used as the encoder in the Seq2Seq model.",
    "Predicting human mobility holds significant practical value, with applications ranging from enhancing disaster risk planning to simulating epidemic spread. In this paper, we present the GeoFormer, a decoder-only transformer model adapted from the GPT architecture to forecast human mobility.",
    "As the economies of Southeast Asia continue adopting digital technologies, policy makers increasingly ask how to prepare the workforce for emerging labor demands. However, little is known about the skills that workers need to adapt to these changes",
];

/// Flags of the `embed` tool. Unset flags fall back to `[embedding]` in the config file.
#[derive(Debug, Clone, Parser)]
#[command(name = "embed")]
#[command(about = "Chunk texts, embed every chunk and print their cosine similarity")]
pub struct EmbedConfig {
    #[arg(long = "model-name", visible_alias = "model_name", help = "Name of the model to use")]
    pub model_name: Option<String>,

    #[arg(long, help = "Model revision to use")]
    pub revision: Option<String>,

    #[arg(long, num_args = 1.., help = "List of texts to encode")]
    pub texts: Vec<String>,

    #[arg(long, visible_alias = "chunk_size", help = "Size of each chunk")]
    pub chunk_size: Option<usize>,

    #[arg(long, visible_alias = "chunk_overlap", help = "Overlap between chunks")]
    pub chunk_overlap: Option<usize>,

    #[arg(long, help = "Embedding backend (Ollama) base URL")]
    pub backend_url: Option<String>,

    #[arg(short, long, help = "Path to eternal.toml")]
    pub config: Option<String>,

    #[arg(long, help = "Also write the full report as JSON to this path")]
    pub output_json: Option<String>,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl EmbedConfig {
    /// Applies command line overrides on top of the file settings.
    pub fn resolve(&self, file: &EmbeddingSection) -> EmbeddingSection {
        let mut section = file.clone();
        if let Some(model) = &self.model_name {
            section.model = model.clone();
        }
        if self.revision.is_some() {
            section.revision = self.revision.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            section.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = self.chunk_overlap {
            section.chunk_overlap = chunk_overlap;
        }
        if let Some(url) = &self.backend_url {
            section.backend_url = url.clone();
        }
        section
    }

    pub fn texts(&self) -> Vec<String> {
        if self.texts.is_empty() {
            DEFAULT_TEXTS.iter().map(|t| t.to_string()).collect()
        } else {
            self.texts.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_file_section() {
        let config = EmbedConfig::parse_from(["embed"]);
        let section = config.resolve(&EmbeddingSection::default());

        assert_eq!(section.model, "avsolatorio/GIST-small-Embedding-v0");
        assert_eq!(section.chunk_size, 128);
        assert_eq!(config.texts().len(), 3);
    }

    #[test]
    fn test_flags_override_file_section() {
        let config = EmbedConfig::parse_from([
            "embed",
            "--model_name",
            "nomic-embed-text",
            "--revision",
            "v1.5",
            "--chunk-size",
            "64",
            "--chunk_overlap",
            "8",
            "--texts",
            "first text",
            "second text",
        ]);
        let section = config.resolve(&EmbeddingSection::default());

        assert_eq!(section.model, "nomic-embed-text");
        assert_eq!(section.revision.as_deref(), Some("v1.5"));
        assert_eq!(section.chunk_size, 64);
        assert_eq!(section.chunk_overlap, 8);
        assert_eq!(config.texts(), vec!["first text", "second text"]);
    }
}
