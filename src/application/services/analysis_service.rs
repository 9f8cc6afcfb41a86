use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, info_span, warn};

use crate::{
    application::dtos::AnalysisReport,
    domain::{DomainError, GraphSpec, Query, StepBreakdown},
};

use super::{
    ContextRetriever, KnowledgeStore, PromptBuilder, ReasoningInvoker, ReasoningService,
};

/// The retrieval-augmented pipeline: query, similarity search, prompt,
/// model call. Strictly linear; any failure ends the query.
pub struct AnalysisService {
    retriever: ContextRetriever,
    prompts: PromptBuilder,
    invoker: ReasoningInvoker,
    model: String,
    graph: Arc<GraphSpec>,
}

impl AnalysisService {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        reasoning: Arc<dyn ReasoningService>,
        model: impl Into<String>,
        graph: Arc<GraphSpec>,
    ) -> Self {
        Self {
            retriever: ContextRetriever::new(store),
            prompts: PromptBuilder::new(),
            invoker: ReasoningInvoker::new(reasoning),
            model: model.into(),
            graph,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn analyze(&self, raw_query: &str) -> Result<AnalysisReport, DomainError> {
        let query = Query::parse(raw_query)?;
        let span = info_span!(target: "killchain::pipeline", "analyze", model = %self.model);
        let _entered = span.enter();
        let started = Instant::now();

        let (context, documents) = self.retriever.retrieve_documents(&query)?;
        let prompt = self.prompts.build(&context, &query);
        let response = self.invoker.invoke(&prompt, &self.model)?;

        let breakdown = StepBreakdown::inspect(response.as_str());
        if !breakdown.is_well_formed() {
            warn!(
                target: "killchain::pipeline",
                found = breakdown.steps.len(),
                missing = ?breakdown.missing,
                unexpected = ?breakdown.unexpected,
                "model answer does not follow the 7-step format; showing it verbatim"
            );
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            target: "killchain::pipeline",
            documents = documents.len(),
            prompt_chars = prompt.as_str().len(),
            elapsed_ms,
            "analysis complete"
        );

        Ok(AnalysisReport {
            query,
            model: self.model.clone(),
            context,
            documents_used: documents.len(),
            response,
            graph: Arc::clone(&self.graph),
            breakdown,
            elapsed_ms,
            generated_at: Utc::now(),
        })
    }
}
