use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContextBlock, GraphSpec, Query, ResponseText, StepBreakdown};

/// Payload accepted from the CLI or HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

/// Everything one query-response cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub query: Query,
    pub model: String,
    pub context: ContextBlock,
    pub documents_used: usize,
    pub response: ResponseText,
    pub graph: Arc<GraphSpec>,
    /// Advisory only. The response is never rejected on format grounds.
    pub breakdown: StepBreakdown,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub ok: bool,
    pub message: String,
    pub details: Option<String>,
}

/// Stage graph in both structured and Graphviz form.
#[derive(Debug, Clone, Serialize)]
pub struct GraphResponse {
    pub graph: Arc<GraphSpec>,
    pub dot: String,
}
