//! Server-Sent Events (SSE) line parser for OpenAI-compatible streaming responses.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Response structure for streaming chat completions.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// What a single line of the response stream means to the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Nothing to do (blank line, comment, empty delta).
    Skip,
    /// A content chunk.
    Token(String),
    /// The model stopped because the output hit its length limit.
    LengthExceeded,
    /// The `[DONE]` sentinel.
    Done,
}

/// Interprets one line of the stream.
///
/// The payload is whatever follows the first `": "`, so `data: {...}` lines
/// are the only ones expected to carry JSON.
///
/// # Errors
///
/// Returns an error when a data line has no payload or the payload is not a
/// valid chunk object.
pub fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return Ok(SseEvent::Skip);
    }
    if trimmed.contains("[DONE]") {
        return Ok(SseEvent::Done);
    }

    let (_, payload) = trimmed
        .split_once(": ")
        .with_context(|| format!("Malformed stream line: {trimmed}"))?;
    let response: StreamResponse = serde_json::from_str(payload)
        .with_context(|| format!("Invalid stream payload: {payload}"))?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Ok(SseEvent::Skip);
    };
    if choice.finish_reason.as_deref() == Some("length") {
        return Ok(SseEvent::LengthExceeded);
    }
    match choice.delta.content {
        Some(content) if !content.is_empty() => Ok(SseEvent::Token(content)),
        _ => Ok(SseEvent::Skip),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line_with_content() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            SseEvent::Token("Hello".to_string())
        );
    }

    #[test]
    fn test_parse_sse_line_with_empty_content() {
        let line = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_parse_sse_line_with_role_only() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_parse_sse_line_finish_reason_length() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"length"}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), SseEvent::LengthExceeded);
    }

    #[test]
    fn test_parse_sse_line_finish_reason_stop() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_parse_sse_line_done_marker() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), SseEvent::Done);
    }

    #[test]
    fn test_parse_sse_line_blank_and_comment() {
        assert_eq!(parse_sse_line("").unwrap(), SseEvent::Skip);
        assert_eq!(parse_sse_line("   ").unwrap(), SseEvent::Skip);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_parse_sse_line_invalid_json() {
        assert!(parse_sse_line("data: not json").is_err());
    }

    #[test]
    fn test_parse_sse_line_missing_separator() {
        assert!(parse_sse_line("garbage").is_err());
    }

    #[test]
    fn test_parse_sse_line_unicode_content() {
        let line = r#"data: {"choices":[{"delta":{"content":"こんにちは"}}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            SseEvent::Token("こんにちは".to_string())
        );
    }

    #[test]
    fn test_parse_sse_line_keeps_token_whitespace() {
        let line = r#"data: {"choices":[{"delta":{"content":"\n\n"}}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            SseEvent::Token("\n\n".to_string())
        );
    }
}
