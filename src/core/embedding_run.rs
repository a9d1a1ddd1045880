use crate::core::chunking::split_texts;
use crate::core::similarity::similarity_matrix;
use crate::domain::model::EmbeddingReport;
use crate::domain::ports::Embedder;
use crate::utils::error::{Result, ToolError};
use crate::utils::monitor::SystemMonitor;

/// Chunk -> embed -> compare, the whole job of the `embed` tool.
pub struct EmbeddingRun<E: Embedder> {
    embedder: E,
    chunk_size: usize,
    chunk_overlap: usize,
    monitor: SystemMonitor,
}

impl<E: Embedder> EmbeddingRun<E> {
    pub fn new(embedder: E, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            embedder,
            chunk_size,
            chunk_overlap,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(
        embedder: E,
        chunk_size: usize,
        chunk_overlap: usize,
        enable_monitoring: bool,
    ) -> Self {
        Self {
            embedder,
            chunk_size,
            chunk_overlap,
            monitor: SystemMonitor::new(enable_monitoring),
        }
    }

    pub async fn run(&self, texts: &[String]) -> Result<EmbeddingReport> {
        self.monitor.log_stats("Start");

        let chunks = split_texts(texts, self.chunk_size, self.chunk_overlap)?;
        tracing::info!("✂️ Split {} texts into {} chunks", texts.len(), chunks.len());
        self.monitor.log_stats("Chunking");

        let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = if inputs.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&inputs).await?
        };
        self.monitor.log_stats("Embedding");

        if embeddings.len() != chunks.len() {
            return Err(ToolError::ProcessingError {
                message: format!(
                    "embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }
        if let Some(first) = embeddings.first() {
            if embeddings.iter().any(|e| e.len() != first.len()) {
                return Err(ToolError::ProcessingError {
                    message: "embedder returned vectors of differing dimensions".to_string(),
                });
            }
        }

        let similarity = similarity_matrix(&embeddings);
        self.monitor.log_stats("Similarity");
        self.monitor.log_final_stats();

        Ok(EmbeddingReport {
            model: self.embedder.model_id().to_string(),
            chunks,
            embeddings,
            similarity,
            generated_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 以字元統計產生固定向量
    struct CharCountEmbedder;

    #[async_trait]
    impl Embedder for CharCountEmbedder {
        fn model_id(&self) -> &str {
            "char-count"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.chars().filter(|c| "aeiou".contains(*c)).count() as f32,
                        t.chars().filter(|c| c.is_whitespace()).count() as f32,
                        t.len() as f32,
                    ]
                })
                .collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_id(&self) -> &str {
            "short"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    #[tokio::test]
    async fn test_report_shape() {
        let run = EmbeddingRun::new(CharCountEmbedder, 10, 2);
        let texts = vec!["the quick brown fox jumps".to_string(), "over".to_string()];

        let report = run.run(&texts).await.unwrap();

        // 25 chars, step 8 -> 0, 8, 16, 24 ; "over" -> 1
        assert_eq!(report.chunks.len(), 5);
        assert_eq!(report.embeddings.len(), 5);
        assert_eq!(report.dimensions(), 3);
        assert_eq!(report.similarity.len(), 5);
        assert!(report.similarity.iter().all(|row| row.len() == 5));
        assert_eq!(report.model, "char-count");
    }

    #[tokio::test]
    async fn test_no_chunks_skips_embedder() {
        let run = EmbeddingRun::new(ShortEmbedder, 10, 2);
        let report = run.run(&[String::new()]).await.unwrap();
        assert!(report.chunks.is_empty());
        assert!(report.similarity.is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_vector_count() {
        let run = EmbeddingRun::new(ShortEmbedder, 2, 0);
        let err = run.run(&["abcd".to_string()]).await.unwrap_err();
        assert!(matches!(err, ToolError::ProcessingError { .. }));
    }
}
