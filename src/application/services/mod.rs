//! Service layer: the analysis pipeline and the collaborator contracts it
//! depends on.

mod analysis_service;
mod context_retriever;
mod presentation;
mod prompt_builder;
mod reasoning_invoker;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis_service::AnalysisService;
pub use context_retriever::{ContextRetriever, EmbeddingEngine, KnowledgeStore, RETRIEVAL_FAN_OUT};
pub use presentation::{GraphFormat, GraphRenderer, Presenter, RenderedGraph};
pub use prompt_builder::PromptBuilder;
pub use reasoning_invoker::{ReasoningInvoker, ReasoningService};
