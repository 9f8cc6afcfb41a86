use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

pub use app::AppContext;
pub use application::{AnalysisReport, AnalysisService, Presenter};
pub use domain::DomainError;

use settings::{AppConfig, ENV_DATA_DIR};

/// Entry point invoked from `main.rs`.
pub fn run() {
    init_tracing();

    if let Err(err) = interfaces::cli::run() {
        eprintln!("[killchain] {err:?}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only analysis output.
pub fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var("KILLCHAIN_LOG").unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Reads configuration and wires the application context. The knowledge
/// store itself is opened lazily on the first query.
pub fn build_environment() -> Result<AppContext> {
    let data_dir = resolve_data_dir()?;
    let config = AppConfig::load(&data_dir);

    tracing::debug!(
        target: "killchain::config",
        data_dir = %data_dir.display(),
        store = config.knowledge_store.id(),
        embedding = config.embedding.id(),
        reasoning_model = %config.reasoning.model,
        "configuration loaded"
    );

    Ok(AppContext::from_config(config, data_dir))
}

fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let dirs = directories::ProjectDirs::from("dev", "killchain", "KillChain")
        .ok_or_else(|| anyhow!("unable to determine OS data dir"))?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir)
}
