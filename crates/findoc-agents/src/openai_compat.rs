// OpenAI-compatible chat completions (Groq, Gemini's compatibility endpoint, local servers).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiCompatClient {
    client: Client,
    provider: String,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl OpenAiCompatClient {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            provider: provider.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
            temperature: None,
        }
    }

    pub fn groq(api_key: impl Into<String>, model: Option<String>, timeout: Duration) -> Self {
        Self::new(
            "groq",
            GROQ_BASE_URL,
            api_key,
            model.unwrap_or_else(|| GROQ_DEFAULT_MODEL.to_string()),
            timeout,
        )
    }

    pub fn gemini(api_key: impl Into<String>, model: Option<String>, timeout: Duration) -> Self {
        Self::new(
            "gemini",
            GEMINI_BASE_URL,
            api_key,
            model.unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            timeout,
        )
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, model: &str, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let body = ChatCompletionRequest {
            model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(provider = %self.provider, status = %status, "Chat completion failed");
            return Err(AgentError::Llm(format!(
                "{} API request failed with status {}: {}",
                self.provider, status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AgentError::Parse(format!("Failed to parse {} response: {e}", self.provider))
        })?;
        first_choice_text(completion, &self.provider)
    }
}

fn first_choice_text(
    completion: ChatCompletionResponse,
    provider: &str,
) -> Result<String, AgentError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Llm(format!("{provider} returned no choices")))?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(AgentError::Llm(format!(
            "{provider} withheld the response (content filter)"
        )));
    }

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AgentError::Llm(format!("{provider} returned empty response"))),
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        debug!(
            provider = %self.provider,
            model = %model,
            messages = request.messages.len(),
            "Requesting chat completion"
        );

        tokio::time::timeout(self.timeout, self.send(model, &request.messages))
            .await
            .map_err(|_| AgentError::Timeout(self.timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn local_client(base_url: String) -> OpenAiCompatClient {
        OpenAiCompatClient::new("local", base_url, "secret", "test-model", Duration::from_secs(5))
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![ChatMessage::system("You verify"), ChatMessage::user("Check it")],
        }
    }

    #[test]
    fn presets() {
        let groq = OpenAiCompatClient::groq("k", None, Duration::from_secs(5));
        assert_eq!(groq.model(), GROQ_DEFAULT_MODEL);
        assert_eq!(groq.endpoint(), "https://api.groq.com/openai/v1/chat/completions");

        let gemini =
            OpenAiCompatClient::gemini("k", Some("gemini-pro".into()), Duration::from_secs(5));
        assert_eq!(gemini.model(), "gemini-pro");
        assert_eq!(gemini.endpoint(), format!("{GEMINI_BASE_URL}/chat/completions"));
    }

    #[test]
    fn request_body_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
        );
    }

    #[test]
    fn empty_content_is_an_error() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "  "}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert!(first_choice_text(completion, "groq").is_err());
    }

    #[test]
    fn content_filter_is_an_error() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "partial"},
                "finish_reason": "content_filter"}]}"#,
        )
        .unwrap();
        let err = first_choice_text(completion, "groq").unwrap_err();
        assert!(err.to_string().contains("content filter"));
    }

    #[tokio::test]
    async fn completes_against_compatible_server() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices": [{"message": {"role": "assistant", "content": "Document is valid."},
                "finish_reason": "stop"}]}"#,
        )
        .await;

        let client = local_client(base_url);
        let reply = client.complete(&request()).await.unwrap();
        assert_eq!(reply, "Document is valid.");

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /chat/completions"));
        assert!(raw_request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(raw_request.contains("\"model\":\"test-model\""));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (base_url, server) =
            serve_once("429 Too Many Requests", r#"{"error": "rate limited"}"#).await;

        let client = local_client(base_url);
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
        assert!(err.to_string().contains("429"));
        server.await.unwrap();
    }
}
