//! In-memory collaborators shared by the service tests.

use parking_lot::Mutex;

use crate::domain::{ChatMessage, DomainError, GraphSpec, RetrievedDocument};

use super::{GraphFormat, GraphRenderer, KnowledgeStore, ReasoningService, RenderedGraph};

pub(crate) struct FakeStore {
    texts: Vec<String>,
    failure: Mutex<Option<DomainError>>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl FakeStore {
    pub(crate) fn with_texts(texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            failure: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(err: DomainError) -> Self {
        Self {
            texts: Vec::new(),
            failure: Mutex::new(Some(err)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().clone()
    }
}

impl KnowledgeStore for FakeStore {
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, DomainError> {
        self.requests.lock().push((query.to_string(), k));
        if let Some(err) = self.failure.lock().take() {
            return Err(err);
        }
        Ok(self
            .texts
            .iter()
            .take(k)
            .enumerate()
            .map(|(rank, text)| RetrievedDocument::new(text.clone(), rank))
            .collect())
    }

    fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

pub(crate) struct FakeReasoning {
    answer: Result<String, String>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl FakeReasoning {
    pub(crate) fn answering(text: impl Into<String>) -> Self {
        Self {
            answer: Ok(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(msg: impl Into<String>) -> Self {
        Self {
            answer: Err(msg.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().clone()
    }
}

impl ReasoningService for FakeReasoning {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, DomainError> {
        self.calls.lock().push((model.to_string(), messages.to_vec()));
        self.answer.clone().map_err(DomainError::reasoning)
    }
}

pub(crate) struct FakeRenderer {
    body: Result<String, String>,
}

impl FakeRenderer {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Self { body: Ok(body.into()) }
    }

    pub(crate) fn failing(msg: impl Into<String>) -> Self {
        Self { body: Err(msg.into()) }
    }
}

impl GraphRenderer for FakeRenderer {
    fn render(&self, _graph: &GraphSpec) -> Result<RenderedGraph, DomainError> {
        self.body
            .clone()
            .map(|body| RenderedGraph {
                format: GraphFormat::Dot,
                body,
            })
            .map_err(DomainError::render)
    }
}
