//! The language model the analysis is delegated to.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("authentication with the model provider failed: {0}")]
    Auth(String),

    #[error("model provider quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("request rejected by the model provider as invalid or too large: {0}")]
    InvalidRequest(String),

    #[error("could not reach the model provider: {0}")]
    Transport(String),

    #[error("model provider returned an unexpected response: {0}")]
    Other(String),
}

impl UpstreamError {
    /// Short user-facing explanation, without provider detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            UpstreamError::Auth(_) => "Authentication error with the analysis service",
            UpstreamError::Quota(_) => "The analysis service is over capacity. Please try again later.",
            UpstreamError::InvalidRequest(_) => "The document could not be processed. It may be too large.",
            UpstreamError::Transport(_) => "Could not reach the analysis service",
            UpstreamError::Other(_) => "Error processing file",
        }
    }

    fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => UpstreamError::Quota(body),
            StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNPROCESSABLE_ENTITY => {
                UpstreamError::InvalidRequest(body)
            }
            // Anthropic reports overload as 529
            s if s.as_u16() == 529 => UpstreamError::Quota(body),
            s => UpstreamError::Other(format!("status {}: {}", s, body)),
        }
    }
}

/// A text-completion service that answers one prompt with one reply.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, UpstreamError>;

    fn model_id(&self) -> &str;
}

// Anthropic Messages API request format
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// Anthropic Messages API response format
#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl AnalysisModel for AnthropicClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, UpstreamError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let text: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(UpstreamError::from_status(status, text));
        }

        let parsed: MessagesResponse = res
            .json()
            .await
            .map_err(|e| UpstreamError::Other(format!("invalid response body: {}", e)))?;

        let reply: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        debug!(reply_chars = reply.len(), "model reply received");
        Ok(reply)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AnthropicClient {
        AnthropicClient::new(
            &server.uri(),
            "test-api-key".to_string(),
            "claude-test".to_string(),
            4000,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_deterministic_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 4000,
                "temperature": 0.0,
                "system": "sys",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "{\"a\":"},
                    {"type": "text", "text": "1}"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).complete("sys", "hello").await.unwrap();
        assert_eq!(reply, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_status_classification() {
        let cases = [
            (401, "auth"),
            (429, "quota"),
            (529, "quota"),
            (413, "invalid"),
            (400, "invalid"),
            (500, "other"),
        ];

        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let err = client_for(&server).complete("s", "p").await.unwrap_err();
            let kind = match err {
                UpstreamError::Auth(_) => "auth",
                UpstreamError::Quota(_) => "quota",
                UpstreamError::InvalidRequest(_) => "invalid",
                UpstreamError::Transport(_) => "transport",
                UpstreamError::Other(_) => "other",
            };
            assert_eq!(kind, expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let client = AnthropicClient::new(
            "http://127.0.0.1:9",
            "k".to_string(),
            "m".to_string(),
            10,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.complete("s", "p").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
