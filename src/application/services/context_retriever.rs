use std::sync::Arc;

use tracing::debug;

use crate::domain::{ContextBlock, DomainError, Query, RetrievedDocument};

/// Number of documents pulled from the knowledge store for every query.
pub const RETRIEVAL_FAN_OUT: usize = 3;

/// Abstraction over any embedding engine (Ollama, offline hash, ...).
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError>;

    fn dims(&self, _model: &str) -> Option<usize> {
        None
    }
}

/// Contract for the knowledge store collaborator.
///
/// Implementations return at most `k` documents ordered by similarity. No
/// relevance threshold is applied. Failures must be reported as
/// [`DomainError::RetrievalUnavailable`].
pub trait KnowledgeStore: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize)
        -> Result<Vec<RetrievedDocument>, DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// Turns a query into the context block that prefixes the prompt.
pub struct ContextRetriever {
    store: Arc<dyn KnowledgeStore>,
    k: usize,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            k: RETRIEVAL_FAN_OUT,
        }
    }

    /// Returns the joined context together with the documents it was built from.
    pub fn retrieve_documents(
        &self,
        query: &Query,
    ) -> Result<(ContextBlock, Vec<RetrievedDocument>), DomainError> {
        let documents = self
            .store
            .similarity_search(query.as_str(), self.k)
            .map_err(into_retrieval_error)?;

        debug!(
            target: "killchain::pipeline",
            requested = self.k,
            returned = documents.len(),
            "retrieved context documents"
        );

        Ok((ContextBlock::from_documents(&documents), documents))
    }

    pub fn retrieve(&self, query: &Query) -> Result<ContextBlock, DomainError> {
        self.retrieve_documents(query).map(|(block, _)| block)
    }
}

fn into_retrieval_error(err: DomainError) -> DomainError {
    match err {
        DomainError::RetrievalUnavailable(_) => err,
        other => DomainError::retrieval(other.to_string()),
    }
}
