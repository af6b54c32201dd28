//! # chatgpt-md-translator - Markdown Translation CLI
//!
//! `chatgpt-md-translator` translates Markdown files with an OpenAI-compatible
//! chat completions endpoint. Documents are cut into fragments at blank lines,
//! the fragments are translated concurrently over streaming requests, and the
//! results are stitched back together in order.
//!
//! ## Features
//!
//! - **Code block preservation**: long fenced code blocks never reach the model
//! - **Concurrent fragments**: with an optional interval between API calls
//! - **Self-healing**: fragments the model rejects as too long are bisected
//! - **Live status**: a one-line view of every fragment's progress
//!
//! ## Quick Start
//!
//! ```bash
//! # Translate a file in place
//! chatgpt-md-translator docs/index.md
//!
//! # Use GPT-4 and write the result elsewhere
//! chatgpt-md-translator -m 4 -o index-ja.md docs/index.md
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `./.chatgpt-md-translator`, `./.env`,
//! `~/.config/chatgpt-md-translator/config` or `~/.chatgpt-md-translator`:
//!
//! ```text
//! OPENAI_API_KEY="sk-..."
//! MODEL_NAME="4"
//! FRAGMENT_TOKEN_SIZE=2048
//! OUTPUT_FILE_PATTERN="{main}-ja.{ext}"
//! ```
//!
//! The translation instruction comes from `prompt.md` in the same places.

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file discovery and resolution.
pub mod config;

/// File system utilities.
pub mod fs;

/// Code block elision and fragment splitting.
pub mod markdown;

/// Global output configuration (quiet mode, colors, diagnostics).
pub mod output;

/// Config directory lookup and output path templating.
pub mod paths;

/// Fragment translation pipeline and the chat completions client.
pub mod translation;

/// Terminal UI components (status line, colors).
pub mod ui;
