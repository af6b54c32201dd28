//! Markdown preprocessing for translation.
//!
//! Documents are prepared in two steps: long code blocks are elided behind
//! placeholders, then the elided text is cut into fragments at blank lines.
//! After translation the placeholders are restored.

mod code_blocks;
mod split;

pub use code_blocks::{CodeBlocks, Elided, replace_code_blocks, restore_code_blocks};
pub use split::split_at_blank_lines;
