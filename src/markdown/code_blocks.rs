//! Elision and restoration of long fenced code blocks.
//!
//! Long code blocks rarely need translating and eat into the model's context,
//! so before translation their bodies are swapped for a short placeholder
//! line such as `(((((3f2a9c0d11e4b7a5)))))`. The opening and closing fences
//! stay in place so the model still sees a well-formed document.

use anyhow::{Result, anyhow};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Placeholder id to original code block body.
pub type CodeBlocks = HashMap<String, String>;

/// Number of random bytes in a placeholder id.
const ID_BYTES: usize = 8;

const FENCE: &str = "```";

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    // expect is safe: the pattern is a compile-time constant
    Regex::new(r"\(\(\(\(\(([a-z0-9]+)\)\)\)\)\)").expect("valid placeholder regex")
});

/// Markdown with long code blocks elided, plus the table needed to undo it.
#[derive(Debug, Clone, Default)]
pub struct Elided {
    pub output: String,
    pub code_blocks: CodeBlocks,
}

/// Replaces the body of every fenced code block spanning at least
/// `min_lines` lines (fences included) with a placeholder.
///
/// A block opens at a line whose trimmed start is three backticks and closes
/// at the next line consisting of the same indentation followed by three
/// backticks. Shorter blocks are left untouched.
pub fn replace_code_blocks(markdown: &str, min_lines: usize) -> Result<Elided> {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut code_blocks = CodeBlocks::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let Some(indent) = fence_indent(line) else {
            output.push(line.to_string());
            i += 1;
            continue;
        };
        let Some(close) = (i + 1..lines.len()).find(|&j| is_closing_fence(lines[j], indent))
        else {
            output.push(line.to_string());
            i += 1;
            continue;
        };

        let body = &lines[i + 1..close];
        let first_body_line = body.first().and_then(|l| l.strip_prefix(indent));

        match first_body_line {
            Some(first) if close - i + 1 >= min_lines => {
                let id = fresh_id(markdown, &code_blocks)?;
                let stored = std::iter::once(first)
                    .chain(body[1..].iter().copied())
                    .collect::<Vec<_>>()
                    .join("\n");
                code_blocks.insert(id.clone(), stored);

                output.push(line.to_string());
                output.push(format!("{indent}((((({id})))))"));
                output.push(lines[close].to_string());
            }
            _ => output.extend(lines[i..=close].iter().map(|l| (*l).to_string())),
        }
        i = close + 1;
    }

    Ok(Elided {
        output: output.join("\n"),
        code_blocks,
    })
}

/// Puts code block bodies back in place of their placeholders.
///
/// Placeholders whose id is not in `code_blocks` are left as they are.
pub fn restore_code_blocks(markdown: &str, code_blocks: &CodeBlocks) -> String {
    PLACEHOLDER
        .replace_all(markdown, |caps: &Captures<'_>| {
            code_blocks
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Returns the indentation of `line` if it opens a fence.
fn fence_indent(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .starts_with(FENCE)
        .then(|| &line[..line.len() - trimmed.len()])
}

fn is_closing_fence(line: &str, indent: &str) -> bool {
    line.strip_prefix(indent)
        .is_some_and(|rest| rest.trim_end() == FENCE)
}

fn fresh_id(markdown: &str, taken: &CodeBlocks) -> Result<String> {
    loop {
        let mut bytes = [0u8; ID_BYTES];
        getrandom::fill(&mut bytes)
            .map_err(|e| anyhow!("Failed to generate code block id: {e}"))?;
        let id = hex::encode(bytes);
        if !taken.contains_key(&id) && !markdown.contains(&id) {
            return Ok(id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const INDENTED: &str = "  ```txt\n  aaa\n  bbb\n  ccc\n  ddd\n  eee\n  fff\n  ```";
    const PLAIN: &str = "```txt\naaa\nbbb\nccc\nddd\neee\nfff\n```";
    const RAGGED: &str =
        "   ```txt filename=foo\n     aaa\n     bbb\n   ccc\n   ddd\n   e  ee\n   ff   f\n   ```";

    fn round_trip(input: &str) {
        let elided = replace_code_blocks(input, 5).unwrap();
        assert_eq!(elided.code_blocks.len(), 1, "block should be elided: {input}");
        let restored = restore_code_blocks(&elided.output, &elided.code_blocks);
        assert_eq!(restored, input);
    }

    #[test]
    fn test_round_trip_indented_block() {
        round_trip(INDENTED);
    }

    #[test]
    fn test_round_trip_plain_block() {
        round_trip(PLAIN);
    }

    #[test]
    fn test_round_trip_ragged_indentation() {
        round_trip(RAGGED);
    }

    #[test]
    fn test_elided_shape() {
        let elided = replace_code_blocks(INDENTED, 5).unwrap();
        let lines: Vec<&str> = elided.output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  ```txt");
        assert!(lines[1].starts_with("  ((((("));
        assert!(lines[1].ends_with(")))))"));
        assert_eq!(lines[2], "  ```");

        let id = elided.code_blocks.keys().next().unwrap();
        assert_eq!(id.len(), ID_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let input = "Intro\n\n```rust\nlet a = 1;\nlet b = 2;\nlet c = 3;\n```\n\nOutro";

        let elided = replace_code_blocks(input, 5).unwrap();
        assert_eq!(elided.code_blocks.len(), 1);
        assert!(!elided.output.contains("let a"));
        assert_eq!(
            restore_code_blocks(&elided.output, &elided.code_blocks),
            input
        );

        let kept = replace_code_blocks(input, 6).unwrap();
        assert!(kept.code_blocks.is_empty());
        assert_eq!(kept.output, input);
    }

    #[test]
    fn test_multiple_blocks_get_distinct_ids() {
        let input = format!("{PLAIN}\n\ntext\n\n{PLAIN}\n\n```\nshort\n```");
        let elided = replace_code_blocks(&input, 5).unwrap();
        assert_eq!(elided.code_blocks.len(), 2);
        assert!(elided.output.contains("```\nshort\n```"));
        assert_eq!(
            restore_code_blocks(&elided.output, &elided.code_blocks),
            input
        );
    }

    #[test]
    fn test_unclosed_fence_is_left_alone() {
        let input = "```\na\nb\nc\nd\ne";
        let elided = replace_code_blocks(input, 2).unwrap();
        assert!(elided.code_blocks.is_empty());
        assert_eq!(elided.output, input);
    }

    #[test]
    fn test_closing_fence_must_share_indentation() {
        let input = "  ```\n  a\n  b\n  c\n```\nd\n  ```";
        let elided = replace_code_blocks(input, 3).unwrap();
        assert_eq!(elided.code_blocks.len(), 1);
        let body = elided.code_blocks.values().next().unwrap();
        assert_eq!(body, "a\n  b\n  c\n```\nd");
        assert_eq!(
            restore_code_blocks(&elided.output, &elided.code_blocks),
            input
        );
    }

    #[test]
    fn test_restore_leaves_unknown_ids() {
        let text = "before\n(((((deadbeef)))))\nafter";
        assert_eq!(restore_code_blocks(text, &CodeBlocks::new()), text);
    }

    #[test]
    fn test_restore_does_not_expand_dollar_signs() {
        let mut blocks = CodeBlocks::new();
        blocks.insert("abc123".to_string(), "echo $1 $HOME".to_string());
        assert_eq!(
            restore_code_blocks("(((((abc123)))))", &blocks),
            "echo $1 $HOME"
        );
    }
}
