use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Overrides the client's default model when set.
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

/// A chat-completion backend. Mockable for testing.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Default model identifier.
    fn model(&self) -> &str;

    /// Send the conversation and return the assistant's reply text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::assistant("done");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "done"}));
    }

    #[test]
    fn finds_system_prompt() {
        let request = ChatRequest {
            model: None,
            messages: vec![ChatMessage::system("You verify"), ChatMessage::user("go")],
        };
        assert_eq!(request.system_prompt(), Some("You verify"));
    }
}
