use std::path::{Path, PathBuf};
use std::sync::Arc;

use bincode::Options;
use serde::de::DeserializeOwned;
use sled::{Config, Db, IVec, Tree};
use tracing::{debug, info};

use crate::{
    application::services::{EmbeddingEngine, KnowledgeStore},
    domain::{DomainError, KnowledgeRecord, RetrievedDocument},
};

pub(crate) const DOCUMENTS_TREE: &str = "documents";
const SLED_CONF_FILE: &str = "conf";

/// Embedded knowledge store backed by `sled`.
///
/// Records are bincode-encoded [`KnowledgeRecord`]s keyed by their UUID in
/// the `documents` tree. Similarity is a brute-force cosine scan over every
/// record, which is fine for reference corpora of a few thousand documents.
pub struct SledKnowledgeStore {
    db: Db,
    documents: Tree,
    path: PathBuf,
    embedder: Arc<dyn EmbeddingEngine>,
    embedding_model: String,
}

impl SledKnowledgeStore {
    /// Opens an existing store. A directory without sled's `conf` file means
    /// nobody has indexed anything there yet, which is reported instead of
    /// letting sled lay out a fresh database.
    pub fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingEngine>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let path = path.as_ref().to_path_buf();
        if !path.join(SLED_CONF_FILE).is_file() {
            return Err(DomainError::retrieval(format!(
                "knowledge store at {} has not been initialised",
                path.display()
            )));
        }

        let db = Config::default()
            .path(&path)
            .cache_capacity(64 * 1024 * 1024)
            .open()
            .map_err(|err| DomainError::retrieval(format!("failed to open sled db: {err}")))?;

        if !has_documents_tree(&db) {
            return Err(DomainError::retrieval(format!(
                "knowledge store at {} has no `{DOCUMENTS_TREE}` tree",
                path.display()
            )));
        }

        let documents = db.open_tree(DOCUMENTS_TREE).map_err(|err| {
            DomainError::retrieval(format!("failed to open documents tree: {err}"))
        })?;

        info!(
            target: "killchain::store",
            path = %path.display(),
            documents = documents.len(),
            "knowledge store opened"
        );

        Ok(Self {
            db,
            documents,
            path,
            embedder,
            embedding_model: embedding_model.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::retrieval(format!("corrupt knowledge record: {err}")))
    }

    fn decode_record(bytes: &IVec) -> Result<KnowledgeRecord, DomainError> {
        Self::decode(bytes.as_ref())
    }

    /// Zero vectors score 0 rather than failing, so every record still ranks.
    fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, DomainError> {
        if query.len() != candidate.len() {
            return Err(DomainError::retrieval(format!(
                "embedding dimension mismatch: query {} vs stored {}",
                query.len(),
                candidate.len()
            )));
        }

        let mut dot = 0.0f32;
        let mut q_norm = 0.0f32;
        let mut c_norm = 0.0f32;

        for (q, c) in query.iter().zip(candidate.iter()) {
            dot += q * c;
            q_norm += q * q;
            c_norm += c * c;
        }

        let denom = q_norm.sqrt() * c_norm.sqrt();
        if denom == 0.0 {
            return Ok(0.0);
        }

        Ok((dot / denom).clamp(-1.0, 1.0))
    }
}

impl KnowledgeStore for SledKnowledgeStore {
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, DomainError> {
        let query_vector = self
            .embedder
            .embed(&self.embedding_model, query)
            .map_err(|err| DomainError::retrieval(format!("failed to embed query: {err}")))?;

        let mut scored: Vec<(KnowledgeRecord, f32)> = Vec::new();
        for entry in self.documents.iter() {
            let (_, value) = entry.map_err(|err| {
                DomainError::retrieval(format!("failed to read knowledge record: {err}"))
            })?;
            let record = Self::decode_record(&value)?;
            let score = Self::cosine_similarity(&query_vector, &record.embedding.vector)?;
            scored.push((record, score));
        }

        // stable sort: equal scores keep key order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(
            target: "killchain::store",
            candidates = self.documents.len(),
            returned = scored.len(),
            "similarity search"
        );

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (record, score))| {
                RetrievedDocument::new(record.content, rank)
                    .with_score(score)
                    .with_source(record.source)
            })
            .collect())
    }

    /// Read-only: checks the tree is still listed and its first record reads.
    fn ping(&self) -> Result<(), DomainError> {
        if !has_documents_tree(&self.db) {
            return Err(DomainError::retrieval(format!(
                "knowledge store at {} lost its `{DOCUMENTS_TREE}` tree",
                self.path.display()
            )));
        }
        self.documents.first().map_err(|err| {
            DomainError::retrieval(format!(
                "knowledge store at {} is unreadable: {err}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

fn has_documents_tree(db: &Db) -> bool {
    db.tree_names()
        .iter()
        .any(|name| name.as_ref() == DOCUMENTS_TREE.as_bytes())
}
