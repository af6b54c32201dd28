use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a translator for Markdown documents.";

pub const ASSISTANT_ACK: &str = "Okay, input the Markdown.\nI will only return the translated text.";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Builds the fixed four-turn conversation sent for every fragment.
pub const fn build_messages<'a>(instruction: &'a str, text: &'a str) -> [Message<'a>; 4] {
    [
        Message {
            role: "system",
            content: SYSTEM_PROMPT,
        },
        Message {
            role: "user",
            content: instruction,
        },
        Message {
            role: "assistant",
            content: ASSISTANT_ACK,
        },
        Message {
            role: "user",
            content: text,
        },
    ]
}
