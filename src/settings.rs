use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::infrastructure::embeddings::{
    ollama_engine::DEFAULT_OLLAMA_EMBED_MODEL, simple_engine::DEFAULT_SIMPLE_MODEL,
};
use crate::infrastructure::ollama::DEFAULT_BASE_URL;

/// Default filename used to read configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_STORE_DIR: &str = "cyber_db";
pub const DEFAULT_REASONING_MODEL: &str = "mychen76/Fin-R1:Q5";

pub const ENV_DATA_DIR: &str = "KILLCHAIN_DATA_DIR";
pub const ENV_OLLAMA_URL: &str = "KILLCHAIN_OLLAMA_URL";
pub const ENV_REASONING_MODEL: &str = "KILLCHAIN_REASONING_MODEL";
pub const ENV_EMBED_MODEL: &str = "KILLCHAIN_EMBED_MODEL";

/// Where the knowledge store lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum KnowledgeStoreBackend {
    /// Embedded sled database. Relative paths resolve against the data dir.
    Sled {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    /// Remote similarity-search service.
    Remote { url: String },
}

impl KnowledgeStoreBackend {
    pub fn id(&self) -> &'static str {
        match self {
            KnowledgeStoreBackend::Sled { .. } => "sled",
            KnowledgeStoreBackend::Remote { .. } => "remote",
        }
    }
}

impl Default for KnowledgeStoreBackend {
    fn default() -> Self {
        KnowledgeStoreBackend::Sled {
            path: default_store_path(),
        }
    }
}

/// Embedding backend used to embed queries for the sled store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Embeddings served by the Ollama runtime.
    Ollama {
        #[serde(default = "default_ollama_embed_model")]
        model: String,
    },
    /// Deterministic hash embedder (offline).
    Simple {
        #[serde(default = "default_simple_model")]
        model: String,
        #[serde(default = "default_simple_dim")]
        dimensions: usize,
    },
}

impl EmbeddingBackend {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Ollama { .. } => "ollama",
            EmbeddingBackend::Simple { .. } => "simple",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingBackend::Ollama { model } => model,
            EmbeddingBackend::Simple { model, .. } => model,
        }
    }

    fn set_model(&mut self, name: String) {
        match self {
            EmbeddingBackend::Ollama { model } => *model = name,
            EmbeddingBackend::Simple { model, .. } => *model = name,
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        EmbeddingBackend::Ollama {
            model: default_ollama_embed_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningConfig {
    #[serde(default = "default_reasoning_model")]
    pub model: String,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            model: default_reasoning_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl OllamaConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            timeout_secs: None,
        }
    }
}

/// Complete configuration payload. Read once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub knowledge_store: KnowledgeStoreBackend,
    #[serde(default)]
    pub embedding: EmbeddingBackend,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl AppConfig {
    /// Reads `<data_dir>/config.json`, falling back to defaults when the file
    /// is absent or unreadable, then applies environment overrides.
    pub fn load(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let config = if path.exists() {
            match fs::read(&path)
                .map_err(|err| err.to_string())
                .and_then(|bytes| {
                    serde_json::from_slice::<AppConfig>(&bytes).map_err(|err| err.to_string())
                }) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        target: "killchain::config",
                        path = %path.display(),
                        error = %err,
                        "ignoring unreadable config file"
                    );
                    AppConfig::default()
                }
            }
        } else {
            AppConfig::default()
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty(ENV_OLLAMA_URL) {
            self.ollama.base_url = url;
        }
        if let Some(model) = non_empty(ENV_REASONING_MODEL) {
            self.reasoning.model = model;
        }
        if let Some(model) = non_empty(ENV_EMBED_MODEL) {
            self.embedding.set_model(model);
        }
        self
    }

    /// Absolute location of the sled store, if that backend is selected.
    pub fn store_path(&self, data_dir: &Path) -> Option<PathBuf> {
        match &self.knowledge_store {
            KnowledgeStoreBackend::Sled { path } if path.is_absolute() => Some(path.clone()),
            KnowledgeStoreBackend::Sled { path } => Some(data_dir.join(path)),
            KnowledgeStoreBackend::Remote { .. } => None,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

const fn default_simple_dim() -> usize {
    256
}

fn default_simple_model() -> String {
    DEFAULT_SIMPLE_MODEL.to_string()
}

fn default_ollama_embed_model() -> String {
    DEFAULT_OLLAMA_EMBED_MODEL.to_string()
}

fn default_reasoning_model() -> String {
    DEFAULT_REASONING_MODEL.to_string()
}

fn default_ollama_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
