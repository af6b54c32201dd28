use clap::Parser;
use std::path::PathBuf;

use crate::config::OverwritePolicy;

#[derive(Parser, Debug)]
#[command(name = "chatgpt-md-translator")]
#[command(about = "Translate Markdown files using ChatGPT")]
#[command(version)]
pub struct Args {
    /// Markdown files to translate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Model name (3, 4, 3large, 4large, or a full model identifier)
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Soft maximum fragment length in bytes
    #[arg(short = 'f', long)]
    pub fragment_size: Option<usize>,

    /// Sampling temperature
    #[arg(short = 't', long)]
    pub temperature: Option<f64>,

    /// Minimum interval between API calls in seconds
    #[arg(short = 'i', long)]
    pub interval: Option<f64>,

    /// Suppress status output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Output file path (only with a single input file)
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Deprecated: use OUTPUT_FILE_PATTERN instead
    #[arg(long, hide = true)]
    pub out_suffix: Option<String>,

    /// What to do when the output file already exists
    #[arg(short = 'w', long, value_enum)]
    pub overwrite_policy: Option<OverwritePolicy>,
}
