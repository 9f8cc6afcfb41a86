use thiserror::Error;

/// Errors shared across the analysis pipeline.
///
/// Every variant is terminal for the current query. Nothing is retried and
/// nothing is demoted to a warning; the caller resubmits.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The incoming query was empty or otherwise unusable.
    #[error("validation error: {0}")]
    Validation(String),

    /// The knowledge store could not be reached, opened, or queried.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The reasoning service was unreachable, rejected the model, or answered
    /// with a payload we could not read.
    #[error("reasoning failure: {0}")]
    ReasoningFailure(String),

    /// The stage graph could not be turned into a displayable artifact.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// Embedding engine misconfiguration or dimension mismatch.
    #[error("embedding mismatch: {0}")]
    Embedding(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::RetrievalUnavailable(msg.into())
    }

    pub fn reasoning(msg: impl Into<String>) -> Self {
        Self::ReasoningFailure(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable machine-readable code used by the HTTP interface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RetrievalUnavailable(_) => "retrieval_unavailable",
            Self::ReasoningFailure(_) => "reasoning_failure",
            Self::RenderFailure(_) => "render_failure",
            Self::Embedding(_) => "embedding",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
