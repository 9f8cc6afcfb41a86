use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::ReasoningService,
    domain::{ChatMessage, DomainError},
};

use super::OllamaClient;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    eval_count: Option<usize>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<serde_json::Value>,
}

/// Reasoning service backed by Ollama's `/api/chat`, non-streaming.
pub struct OllamaReasoningService {
    client: OllamaClient,
}

impl OllamaReasoningService {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

impl ReasoningService for OllamaReasoningService {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, DomainError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };

        let response: ChatResponse = self
            .client
            .post_json("chat", &request)
            .map_err(|err| DomainError::reasoning(format!("chat with `{model}` failed: {err}")))?;

        debug!(
            target: "killchain::ollama",
            model,
            prompt_tokens = response.prompt_eval_count.unwrap_or(0),
            completion_tokens = response.eval_count.unwrap_or(0),
            "chat completed"
        );

        Ok(response.message.content)
    }

    fn ping(&self) -> Result<(), DomainError> {
        let tags: TagsResponse = self.client.get_json("tags").map_err(|err| {
            DomainError::reasoning(format!(
                "ollama at {} is not reachable: {err}",
                self.client.base_url()
            ))
        })?;
        debug!(target: "killchain::ollama", models = tags.models.len(), "ollama reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::serve_once;

    #[test]
    fn test_chat_request_shape() {
        let messages = [ChatMessage::user("Context: ...")];
        let request = ChatRequest {
            model: "mychen76/Fin-R1:Q5",
            messages: &messages,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mychen76/Fin-R1:Q5");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Context: ...");
    }

    #[test]
    fn test_chat_response_parsing() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"Step 1: x"},"done":true,"eval_count":12}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content, "Step 1: x");
        assert_eq!(parsed.eval_count, Some(12));
    }

    #[test]
    fn test_malformed_response_is_reasoning_failure() {
        let base_url = serve_once("200 OK", r#"{"done":true}"#);
        let service = OllamaReasoningService::new(OllamaClient::new(base_url, None));

        let err = service
            .chat("mychen76/Fin-R1:Q5", &[ChatMessage::user("hi")])
            .unwrap_err();
        assert!(matches!(err, DomainError::ReasoningFailure(ref msg) if msg.contains("malformed")));
    }

    #[test]
    fn test_unknown_model_is_reasoning_failure() {
        let base_url = serve_once(
            "404 Not Found",
            r#"{"error":"model \"nope\" not found, try pulling it first"}"#,
        );
        let service = OllamaReasoningService::new(OllamaClient::new(base_url, None));

        let err = service.chat("nope", &[ChatMessage::user("hi")]).unwrap_err();
        match err {
            DomainError::ReasoningFailure(msg) => {
                assert!(msg.contains("HTTP 404"));
                assert!(msg.contains("not found"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_service_is_reasoning_failure() {
        let service = OllamaReasoningService::new(OllamaClient::new(
            "http://127.0.0.1:9",
            Some(std::time::Duration::from_millis(500)),
        ));
        let err = service
            .chat("mychen76/Fin-R1:Q5", &[ChatMessage::user("hi")])
            .unwrap_err();
        assert!(matches!(err, DomainError::ReasoningFailure(_)));
    }
}
