//! Blocking HTTP client for a local Ollama runtime.
//!
//! Both the reasoning model and the embedding model are served by Ollama, so
//! the chat adapter and the embedding engine share this client.

mod chat;

pub use chat::OllamaReasoningService;

use std::time::Duration;

use anyhow::anyhow;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::trace;

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Error body returned by Ollama on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    agent: ureq::Agent,
}

impl OllamaClient {
    /// `timeout` of `None` means a hung runtime hangs the caller.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    pub fn post_json<B, R>(&self, path: &str, body: &B) -> anyhow::Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.api_url(path);
        trace!(target: "killchain::ollama", %url, "POST");

        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(handle_http_error)?;

        response
            .into_json::<R>()
            .map_err(|err| anyhow!("malformed response from {url}: {err}"))
    }

    pub fn get_json<R: DeserializeOwned>(&self, path: &str) -> anyhow::Result<R> {
        let url = self.api_url(path);
        trace!(target: "killchain::ollama", %url, "GET");

        let response = self.agent.get(&url).call().map_err(handle_http_error)?;

        response
            .into_json::<R>()
            .map_err(|err| anyhow!("malformed response from {url}: {err}"))
    }
}

/// Convert HTTP errors to anyhow errors
pub fn handle_http_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::Status(code, response) => {
            if let Ok(err_response) = response.into_json::<ErrorResponse>() {
                anyhow!("HTTP {}: {}", code, err_response.error)
            } else {
                anyhow!("HTTP error: {}", code)
            }
        }
        ureq::Error::Transport(transport) => anyhow!("Transport error: {}", transport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_normalises_base_url() {
        let client = OllamaClient::new("http://localhost:11434/", None);
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.api_url("chat"), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_unreachable_runtime_is_a_transport_error() {
        // port 9 (discard) is reserved and not expected to serve HTTP
        let client = OllamaClient::new("http://127.0.0.1:9", Some(Duration::from_millis(500)));
        let err = client
            .get_json::<serde_json::Value>("tags")
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Transport error") || err.starts_with("HTTP"));
    }
}
