use crate::error::AgentError;

/// What the model asked for in one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentTurn {
    ToolCall {
        tool: String,
        input: serde_json::Value,
    },
    Final(String),
}

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Handles common model reply formats:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `I will read the document first:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_first_object(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Interpret a model reply under the tool protocol.
///
/// `{"action": "tool", "tool": ..., "input": {...}}` is a tool call and
/// `{"action": "final", "answer": ...}` a final answer. Anything else,
/// including prose that happens to embed JSON, is taken as the final answer verbatim.
pub fn parse_turn(raw: &str) -> AgentTurn {
    let verbatim = || AgentTurn::Final(raw.trim().to_string());

    let value: serde_json::Value = match extract_json(raw)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
    {
        Some(value) => value,
        None => return verbatim(),
    };

    match value.get("action").and_then(|a| a.as_str()) {
        Some("tool") => match value.get("tool").and_then(|t| t.as_str()) {
            Some(tool) => AgentTurn::ToolCall {
                tool: tool.to_string(),
                input: value
                    .get("input")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({})),
            },
            None => verbatim(),
        },
        Some("final") => match value.get("answer").and_then(|a| a.as_str()) {
            Some(answer) => AgentTurn::Final(answer.trim().to_string()),
            None => verbatim(),
        },
        _ => verbatim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_clean_json() {
        let input = r#"{"action": "final", "answer": "ok"}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn extract_from_markdown() {
        let input = "Reading first:\n```json\n{\"action\": \"tool\"}\n```\nDone.";
        assert_eq!(extract_json(input).unwrap(), r#"{"action": "tool"}"#);
    }

    #[test]
    fn extract_with_escaped_braces_in_strings() {
        let input = r#"{"answer": "margin went from {low} to {high}", "action": "final"}"#;
        let result = extract_json(input).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["action"], "final");
    }

    #[test]
    fn extract_no_json() {
        assert!(extract_json("Plain prose report").is_err());
    }

    #[test]
    fn stray_closing_brace_before_object() {
        let input = "} then {\"action\": \"final\", \"answer\": \"x\"}";
        assert_eq!(parse_turn(input), AgentTurn::Final("x".to_string()));
    }

    #[test]
    fn tool_call_in_code_block() {
        let raw = "I need the document.\n```json\n\
                   {\"action\": \"tool\", \"tool\": \"read_financial_document\", \
                   \"input\": {\"max_pages\": 20}}\n```";
        assert_eq!(
            parse_turn(raw),
            AgentTurn::ToolCall {
                tool: "read_financial_document".to_string(),
                input: serde_json::json!({"max_pages": 20}),
            }
        );
    }

    #[test]
    fn tool_call_without_input_gets_empty_object() {
        let raw = r#"{"action": "tool", "tool": "read_financial_document"}"#;
        match parse_turn(raw) {
            AgentTurn::ToolCall { input, .. } => assert_eq!(input, serde_json::json!({})),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn final_answer_object() {
        let raw = r#"{"action": "final", "answer": "  1. Document Validity: Yes  "}"#;
        assert_eq!(
            parse_turn(raw),
            AgentTurn::Final("1. Document Validity: Yes".to_string())
        );
    }

    #[test]
    fn prose_is_final_verbatim() {
        let raw = "## Risk Summary\nOverall risk: moderate\n";
        assert_eq!(parse_turn(raw), AgentTurn::Final(raw.trim().to_string()));
    }

    #[test]
    fn unrelated_json_is_final_verbatim() {
        let raw = "Ratios: {\"current_ratio\": 2.1}";
        assert_eq!(parse_turn(raw), AgentTurn::Final(raw.to_string()));
    }
}
