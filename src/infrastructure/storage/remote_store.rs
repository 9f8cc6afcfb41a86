//! Knowledge store that proxies similarity search to a remote search service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    application::services::KnowledgeStore,
    domain::{DomainError, RetrievedDocument},
};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct RemoteDocument {
    text: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    documents: Vec<RemoteDocument>,
}

/// Posts `{query, k}` to `<base_url>/api/search` and expects
/// `{"documents": [{"text": ...}]}` in similarity order.
pub struct RemoteKnowledgeStore {
    base_url: String,
    agent: ureq::Agent,
}

impl RemoteKnowledgeStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

impl KnowledgeStore for RemoteKnowledgeStore {
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, DomainError> {
        let url = self.api_url("search");

        let response = self
            .agent
            .post(&url)
            .send_json(SearchRequest { query, k })
            .map_err(|e| DomainError::retrieval(format!("Search failed: {}", e)))?;

        let parsed: SearchResponse = response
            .into_json()
            .map_err(|e| DomainError::retrieval(format!("Failed to parse search response: {}", e)))?;

        // never trust the remote to honour k
        Ok(parsed
            .documents
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, doc)| {
                let mut retrieved = RetrievedDocument::new(doc.text, rank).with_source(doc.source);
                retrieved.score = doc.score;
                retrieved
            })
            .collect())
    }

    fn ping(&self) -> Result<(), DomainError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| DomainError::retrieval(format!("Health check failed: {}", e)))?;

        if response.status() == 200 {
            Ok(())
        } else {
            Err(DomainError::retrieval("Remote knowledge store is not healthy"))
        }
    }
}
