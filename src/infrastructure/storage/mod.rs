//! Knowledge store adapters.
//!
//! The embedded sled store reads documents written by an external indexer;
//! the remote store proxies similarity search to a running search service.

pub mod remote_store;
pub mod sled_store;

pub use remote_store::RemoteKnowledgeStore;
pub use sled_store::SledKnowledgeStore;
