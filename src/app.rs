//! Long-lived application context.
//!
//! Holds the handles every query shares: configuration, the reasoning
//! service, the stage graph (built once), and the knowledge store, which is
//! expensive to open and therefore constructed lazily on first use and then
//! reused for the lifetime of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::info;

use crate::{
    application::{
        services::{EmbeddingEngine, KnowledgeStore, ReasoningService},
        AnalysisReport, AnalysisService, HealthStatusResponse,
    },
    domain::{build_graph, DomainError, GraphSpec, Query},
    infrastructure::{
        OllamaClient, OllamaEmbedEngine, OllamaReasoningService, RemoteKnowledgeStore,
        SimpleEmbedEngine, SledKnowledgeStore,
    },
    settings::{AppConfig, EmbeddingBackend, KnowledgeStoreBackend},
};

/// Builds the knowledge store handle. Called at most once per successful
/// initialisation.
pub type StoreFactory =
    Box<dyn Fn() -> Result<Arc<dyn KnowledgeStore>, DomainError> + Send + Sync>;

pub struct AppContext {
    config: AppConfig,
    data_dir: PathBuf,
    store: Mutex<Option<Arc<dyn KnowledgeStore>>>,
    store_factory: StoreFactory,
    reasoning: Arc<dyn ReasoningService>,
    graph: Arc<GraphSpec>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        data_dir: PathBuf,
        store_factory: StoreFactory,
        reasoning: Arc<dyn ReasoningService>,
    ) -> Self {
        Self {
            config,
            data_dir,
            store: Mutex::new(None),
            store_factory,
            reasoning,
            graph: Arc::new(build_graph()),
        }
    }

    /// Wires the Ollama-backed services and the configured store backend.
    pub fn from_config(config: AppConfig, data_dir: PathBuf) -> Self {
        let client = OllamaClient::new(config.ollama.base_url.clone(), config.ollama.timeout());
        let reasoning: Arc<dyn ReasoningService> =
            Arc::new(OllamaReasoningService::new(client.clone()));

        let store_config = config.clone();
        let store_dir = data_dir.clone();
        let factory: StoreFactory =
            Box::new(move || open_store(&store_config, &store_dir, &client));

        Self::new(config, data_dir, factory, reasoning)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn graph(&self) -> Arc<GraphSpec> {
        Arc::clone(&self.graph)
    }

    /// Returns the process-wide store handle, opening it on first call.
    /// A failed open is not cached; the next call tries again.
    pub fn knowledge_store(&self) -> Result<Arc<dyn KnowledgeStore>, DomainError> {
        let mut guard = self.store.lock();
        if let Some(store) = guard.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store = (self.store_factory)()?;
        info!(
            target: "killchain::store",
            backend = self.config.knowledge_store.id(),
            "knowledge store initialised"
        );
        *guard = Some(Arc::clone(&store));
        Ok(store)
    }

    pub fn analysis_service(&self) -> Result<AnalysisService, DomainError> {
        Ok(AnalysisService::new(
            self.knowledge_store()?,
            Arc::clone(&self.reasoning),
            self.config.reasoning.model.clone(),
            self.graph(),
        ))
    }

    pub fn analyze(&self, raw_query: &str) -> Result<AnalysisReport, DomainError> {
        // reject blank input before touching the store
        Query::parse(raw_query)?;
        self.analysis_service()?.analyze(raw_query)
    }

    pub fn health(&self) -> HealthStatusResponse {
        let store = self.knowledge_store().and_then(|store| store.ping());
        let reasoning = self.reasoning.ping();
        let ok = store.is_ok() && reasoning.is_ok();

        let describe = |result: &Result<(), DomainError>| match result {
            Ok(()) => "ok".to_string(),
            Err(err) => err.to_string(),
        };

        HealthStatusResponse {
            ok,
            message: if ok { "ready".into() } else { "degraded".into() },
            details: Some(format!(
                "store ({}): {}, reasoning ({}): {}, checked_at: {}",
                self.config.knowledge_store.id(),
                describe(&store),
                self.config.reasoning.model,
                describe(&reasoning),
                Utc::now()
            )),
        }
    }
}

fn open_store(
    config: &AppConfig,
    data_dir: &Path,
    client: &OllamaClient,
) -> Result<Arc<dyn KnowledgeStore>, DomainError> {
    match &config.knowledge_store {
        KnowledgeStoreBackend::Remote { url } => Ok(Arc::new(RemoteKnowledgeStore::new(url.clone()))),
        KnowledgeStoreBackend::Sled { .. } => {
            let path = config
                .store_path(data_dir)
                .ok_or_else(|| DomainError::other("sled backend without a store path"))?;
            let embedder = init_embedder(&config.embedding, client)?;
            let store = SledKnowledgeStore::open(path, embedder, config.embedding.model_name())?;
            Ok(Arc::new(store))
        }
    }
}

fn init_embedder(
    backend: &EmbeddingBackend,
    client: &OllamaClient,
) -> Result<Arc<dyn EmbeddingEngine>, DomainError> {
    match backend {
        EmbeddingBackend::Ollama { .. } => Ok(Arc::new(OllamaEmbedEngine::new(client.clone()))),
        EmbeddingBackend::Simple { model, dimensions } => {
            Ok(Arc::new(SimpleEmbedEngine::try_new(model.clone(), *dimensions)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::application::services::testing::{FakeReasoning, FakeStore};

    fn context_with_counter(counter: Arc<AtomicUsize>, fail_first: bool) -> AppContext {
        let factory: StoreFactory = Box::new(move || -> Result<Arc<dyn KnowledgeStore>, DomainError> {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if fail_first && attempt == 0 {
                return Err(DomainError::retrieval("store not ready"));
            }
            Ok(Arc::new(FakeStore::with_texts(["Doc A text", "Doc B text"])))
        });
        AppContext::new(
            AppConfig::default(),
            PathBuf::from("/tmp/killchain-test"),
            factory,
            Arc::new(FakeReasoning::answering("Step 1: recon")),
        )
    }

    #[test]
    fn test_store_handle_is_a_singleton() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = context_with_counter(Arc::clone(&counter), false);

        let first = ctx.knowledge_store().unwrap();
        let second = ctx.knowledge_store().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_initialisation_is_retried() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = context_with_counter(Arc::clone(&counter), true);

        assert!(matches!(
            ctx.knowledge_store(),
            Err(DomainError::RetrievalUnavailable(_))
        ));
        assert!(ctx.knowledge_store().is_ok());
        assert!(ctx.knowledge_store().is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_analyze_reuses_store_and_graph() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = context_with_counter(Arc::clone(&counter), false);

        let first = ctx.analyze("Log4Shell analysis").unwrap();
        let second = ctx.analyze("Mimikatz credential dumping").unwrap();

        assert_eq!(first.context.as_str(), "Doc A text\nDoc B text");
        assert!(Arc::ptr_eq(&first.graph, &second.graph));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_query_does_not_open_store() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = context_with_counter(Arc::clone(&counter), false);

        assert!(matches!(ctx.analyze(""), Err(DomainError::Validation(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_sled_store_reports_retrieval_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.embedding = EmbeddingBackend::Simple {
            model: "killchain/simple-hash".into(),
            dimensions: 64,
        };
        let ctx = AppContext::from_config(config, dir.path().to_path_buf());

        let err = ctx.analyze("Log4Shell analysis").unwrap_err();
        assert!(matches!(err, DomainError::RetrievalUnavailable(_)));
        assert!(!ctx.health().ok);
    }
}
