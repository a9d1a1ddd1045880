pub mod chunking;
pub mod diffusion;
pub mod embedding_run;
pub mod florence;
pub mod line_buffer;
pub mod ndjson;
pub mod similarity;

pub use crate::domain::model::{Chunk, Detections, EmbeddingReport, SdParams};
pub use crate::domain::ports::{Embedder, ImageGenerator, Storage, TextGenerator, VisionModel};
pub use crate::utils::error::Result;
