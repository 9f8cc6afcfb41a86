//! Infrastructure layer wiring concrete adapters (embeddings, storage, model
//! runtime, rendering).

pub mod embeddings;
pub mod ollama;
pub mod render;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use embeddings::{OllamaEmbedEngine, SimpleEmbedEngine};
pub use ollama::{OllamaClient, OllamaReasoningService};
pub use render::{DotRenderer, GraphvizRenderer};
pub use storage::{RemoteKnowledgeStore, SledKnowledgeStore};
