use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::domain::{ChatMessage, DomainError, Prompt, ResponseText};

/// Contract for the chat-style language model runtime.
pub trait ReasoningService: Send + Sync {
    /// Blocking single-shot chat call returning the full response content.
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, DomainError>;

    fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Sends a prompt as a one-turn conversation. No retry.
pub struct ReasoningInvoker {
    service: Arc<dyn ReasoningService>,
}

impl ReasoningInvoker {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self { service }
    }

    pub fn invoke(&self, prompt: &Prompt, model: &str) -> Result<ResponseText, DomainError> {
        let messages = [ChatMessage::user(prompt.as_str())];
        let started = Instant::now();

        let content = self
            .service
            .chat(model, &messages)
            .map_err(|err| match err {
                DomainError::ReasoningFailure(_) => err,
                other => DomainError::reasoning(other.to_string()),
            })?;

        debug!(
            target: "killchain::pipeline",
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = content.len(),
            "reasoning service answered"
        );

        Ok(ResponseText::new(content))
    }
}
