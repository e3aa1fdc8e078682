use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatRequest, LlmClient, Role};

/// Configuration for a Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    /// Executable to run, resolved through `PATH` when not a path.
    pub program: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Invoke the `claude` CLI with a system prompt and user prompt.
/// Returns the raw stdout text.
///
/// The user prompt goes through stdin: it carries extracted document text and
/// can exceed the per-argument size limit of `execve`.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    debug!(model = %config.model, prompt_chars = user_prompt.len(), "Invoking claude CLI");

    let mut child = Command::new(&config.program)
        .args([
            "-p",
            "--system-prompt",
            system_prompt,
            "--model",
            &config.model,
            "--output-format",
            "text",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AgentError::Llm(format!("Failed to spawn claude: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AgentError::Llm("claude stdin was not captured".to_string()))?;
    let prompt = user_prompt.as_bytes().to_vec();
    // Written concurrently with reading stdout so neither pipe can fill up and stall.
    let writer = tokio::spawn(async move {
        let written = stdin.write_all(&prompt).await;
        drop(stdin);
        written
    });

    let result = tokio::time::timeout(config.timeout, child.wait_with_output())
        .await
        .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| AgentError::Llm(format!("Failed to run claude: {e}")))?;

    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("claude exited before reading the whole prompt");
        }
        Ok(Err(e)) => {
            return Err(AgentError::Llm(format!(
                "Failed to write prompt to claude: {e}"
            )))
        }
        Err(e) => {
            return Err(AgentError::Llm(format!(
                "claude prompt writer failed: {e}"
            )))
        }
    }

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
        return Err(AgentError::Llm(format!(
            "claude exited {}: {}",
            result.status, stderr
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(AgentError::Llm("Claude returned empty response".to_string()));
    }

    Ok(stdout)
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Flatten the non-system turns into one prompt, since the CLI takes a single message.
pub fn render_transcript(request: &ChatRequest) -> String {
    let turns: Vec<&crate::llm::ChatMessage> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .collect();

    if let [only] = turns.as_slice() {
        return only.content.clone();
    }

    turns
        .iter()
        .map(|m| {
            let label = match m.role {
                Role::Assistant => "ASSISTANT",
                _ => "USER",
            };
            format!("{label}:\n{}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// [`LlmClient`] backed by the local `claude` CLI.
pub struct ClaudeCliClient {
    config: ClaudeCliConfig,
}

impl ClaudeCliClient {
    pub fn new(config: ClaudeCliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LlmClient for ClaudeCliClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        let config = match &request.model {
            Some(model) => ClaudeCliConfig {
                model: model.clone(),
                ..self.config.clone()
            },
            None => self.config.clone(),
        };
        let system_prompt = request.system_prompt().unwrap_or_default();
        invoke_claude(system_prompt, &render_transcript(request), &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[test]
    fn default_config() {
        let config = ClaudeCliConfig::default();
        assert_eq!(config.program, "claude");
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn single_turn_is_passed_verbatim() {
        let request = ChatRequest {
            model: None,
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("Verify it")],
        };
        assert_eq!(render_transcript(&request), "Verify it");
    }

    #[test]
    fn multi_turn_is_labelled() {
        let request = ChatRequest {
            model: None,
            messages: vec![
                ChatMessage::system("sys"),
                ChatMessage::user("Verify it"),
                ChatMessage::assistant("{\"action\": \"tool\"}"),
                ChatMessage::user("Observation"),
            ],
        };
        assert_eq!(
            render_transcript(&request),
            "USER:\nVerify it\n\nASSISTANT:\n{\"action\": \"tool\"}\n\nUSER:\nObservation"
        );
    }
}
