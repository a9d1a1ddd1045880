use crate::domain::model::{GeneratedImage, SdParams, VisionInput};
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String>>;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream>;
}

/// A sequence-to-sequence vision model driven by a task prompt such as `<OD>`.
/// Returns the raw generated text including location tokens.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, task: &str, image: &VisionInput) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, params: &SdParams) -> Result<GeneratedImage>;
}
