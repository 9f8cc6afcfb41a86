pub mod ollama_engine;
pub mod simple_engine;

pub use ollama_engine::OllamaEmbedEngine;
pub use simple_engine::SimpleEmbedEngine;
