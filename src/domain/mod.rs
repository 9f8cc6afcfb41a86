//! Domain layer: core entities and value objects for the kill-chain analyst.

pub mod breakdown;
pub mod errors;
pub mod graph;
pub mod models;
pub mod stages;

pub use breakdown::{StepBreakdown, StepLine};
pub use errors::DomainError;
pub use graph::{build_graph, GraphEdge, GraphNode, GraphSpec, NodeShape, NodeStyle, RankDirection};
pub use models::{
    ChatMessage, ChatRole, ContextBlock, DocumentEmbedding, KnowledgeRecord, Prompt, Query,
    ResponseText, RetrievedDocument,
};
pub use stages::KillChainStage;
