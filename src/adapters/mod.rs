// Adapters layer: concrete implementations of the domain ports (inference backends, storage, subprocesses).

pub mod ollama;
pub mod rpc_client;
pub mod script;
pub mod stable_diffusion;
pub mod storage;
pub mod vision;

pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use rpc_client::TextGeneratorClient;
pub use script::ScriptExecutor;
pub use stable_diffusion::SdCliGenerator;
pub use storage::LocalStorage;
pub use vision::{GenerationSettings, HttpVisionModel};
