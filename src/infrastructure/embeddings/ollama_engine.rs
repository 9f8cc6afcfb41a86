use serde::{Deserialize, Serialize};

use crate::{
    application::services::EmbeddingEngine,
    domain::DomainError,
    infrastructure::ollama::OllamaClient,
};

pub const DEFAULT_OLLAMA_EMBED_MODEL: &str = "nomic-embed-text";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding engine backed by Ollama's `/api/embed`.
/// The model is chosen per call by the store that owns the vectors.
pub struct OllamaEmbedEngine {
    client: OllamaClient,
}

impl OllamaEmbedEngine {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

impl EmbeddingEngine for OllamaEmbedEngine {
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text payload cannot be empty"));
        }

        let request = EmbedRequest {
            model,
            input: [text],
        };
        let response: EmbedResponse = self.client.post_json("embed", &request).map_err(|err| {
            DomainError::embedding(format!("ollama embedding with `{model}` failed: {err}"))
        })?;

        response
            .embeddings
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| DomainError::embedding("ollama returned no embedding"))
    }
}
