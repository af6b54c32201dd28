use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::collections::HashMap;
use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::fs::read_text_file;
use crate::paths;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "3";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_FRAGMENT_SIZE: usize = 2048;
pub const DEFAULT_CODE_BLOCK_PRESERVATION_LINES: usize = 5;

const CONFIG_FILE_NAME: &str = ".chatgpt-md-translator";
const PROMPT_FILE_NAME: &str = ".chatgpt-md-translator-prompt.md";

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OverwritePolicy {
    /// Leave the existing file alone and move on to the next input.
    Skip,
    /// Stop with an error.
    Abort,
    /// Replace the existing file.
    #[default]
    Overwrite,
}

impl FromStr for OverwritePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            "overwrite" => Ok(Self::Overwrite),
            other => bail!("Invalid overwrite policy: {other}"),
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
            Self::Overwrite => "overwrite",
        })
    }
}

/// Resolved configuration after merging CLI arguments and the config file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat completions endpoint URL.
    pub api_endpoint: String,
    pub api_key: String,
    /// Translation instruction sent as the first user message.
    pub prompt: String,
    /// Model identifier, shorthands already expanded.
    pub model: String,
    pub temperature: f64,
    /// Soft maximum fragment length in bytes.
    pub fragment_size: usize,
    /// Minimum number of seconds between API call starts.
    pub api_call_interval: f64,
    /// Code blocks with at least this many lines are elided.
    pub code_block_preservation_lines: usize,
    pub https_proxy: Option<String>,
    /// Directory that input paths are resolved against.
    pub base_dir: Option<PathBuf>,
    pub quiet: bool,
    /// Explicit output path (single input only).
    pub out: Option<PathBuf>,
    pub output_file_pattern: Option<String>,
    pub overwrite_policy: OverwritePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            prompt: String::new(),
            model: resolve_model_shorthand(DEFAULT_MODEL),
            temperature: DEFAULT_TEMPERATURE,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            api_call_interval: 0.0,
            code_block_preservation_lines: DEFAULT_CODE_BLOCK_PRESERVATION_LINES,
            https_proxy: None,
            base_dir: None,
            quiet: false,
            out: None,
            output_file_pattern: None,
            overwrite_policy: OverwritePolicy::default(),
        }
    }
}

/// Options for resolving configuration.
///
/// Contains CLI overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub model: Option<String>,
    pub fragment_size: Option<usize>,
    pub temperature: Option<f64>,
    pub interval: Option<f64>,
    pub quiet: Option<bool>,
    pub out: Option<PathBuf>,
    /// Deprecated; becomes the pattern `{main}<suffix>`.
    pub out_suffix: Option<String>,
    pub overwrite_policy: Option<OverwritePolicy>,
}

/// The parsed dotenv-style config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    values: HashMap<String, String>,
}

impl ConfigFile {
    /// Reads a dotenv file without touching the process environment.
    pub fn from_path(path: &Path) -> Result<Self> {
        let values = dotenv::from_path_iter(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?
            .collect::<Result<HashMap<_, _>, _>>()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(Self { values })
    }

    /// Returns the value of `key`, treating empty values as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn number<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigFile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Configuration together with non-fatal problems found while resolving it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Expands the short model names accepted on the command line.
pub fn resolve_model_shorthand(model: &str) -> String {
    match model {
        "3" => "gpt-3.5-turbo",
        "3large" => "gpt-3.5-turbo-16k",
        "4" => "gpt-4",
        "4large" => "gpt-4-32k",
        other => other,
    }
    .to_string()
}

/// Resolves configuration by merging CLI options with config file settings.
///
/// CLI options take precedence over config file values, which take
/// precedence over built-in defaults.
///
/// # Errors
///
/// Returns an error if `OPENAI_API_KEY` is missing or an overwrite policy is
/// not one of `skip`, `abort`, `overwrite`.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
    prompt: String,
) -> Result<Resolved> {
    let mut warnings = Vec::new();

    let Some(api_key) = config_file.get("OPENAI_API_KEY") else {
        bail!(
            "OPENAI_API_KEY is not set in config file.\n\n\
             Add a line like the following to your config file:\n  \
             OPENAI_API_KEY=\"sk-...\""
        );
    };

    let out_suffix = config_file
        .get("OUT_SUFFIX")
        .or_else(|| options.out_suffix.as_deref().filter(|s| !s.is_empty()));
    if out_suffix.is_some() {
        warnings.push("OUT_SUFFIX is deprecated. Use OUTPUT_FILE_PATTERN instead.".to_string());
    }

    let output_file_pattern = config_file
        .get("OUTPUT_FILE_PATTERN")
        .map(ToString::to_string)
        .or_else(|| out_suffix.map(|suffix| format!("{{main}}{suffix}")));
    if let Some(pattern) = &output_file_pattern
        && !paths::has_placeholder(pattern)
    {
        warnings.push("OUTPUT_FILE_PATTERN does not contain any placeholder.".to_string());
    }

    let overwrite_policy = match options.overwrite_policy {
        Some(policy) => policy,
        None => config_file
            .get("OVERWRITE_POLICY")
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
    };

    let model = options
        .model
        .as_deref()
        .or_else(|| config_file.get("MODEL_NAME"))
        .unwrap_or(DEFAULT_MODEL);

    let config = Config {
        api_endpoint: config_file
            .get("API_ENDPOINT")
            .unwrap_or(DEFAULT_API_ENDPOINT)
            .to_string(),
        api_key: api_key.to_string(),
        prompt,
        model: resolve_model_shorthand(model),
        temperature: options
            .temperature
            .or_else(|| config_file.number("TEMPERATURE"))
            .unwrap_or(DEFAULT_TEMPERATURE),
        fragment_size: options
            .fragment_size
            .or_else(|| config_file.number("FRAGMENT_TOKEN_SIZE"))
            .unwrap_or(DEFAULT_FRAGMENT_SIZE),
        api_call_interval: options
            .interval
            .or_else(|| config_file.number("API_CALL_INTERVAL"))
            .unwrap_or(0.0),
        code_block_preservation_lines: config_file
            .number("CODE_BLOCK_PRESERVATION_LINES")
            .unwrap_or(DEFAULT_CODE_BLOCK_PRESERVATION_LINES),
        https_proxy: config_file
            .get("HTTPS_PROXY")
            .map(ToString::to_string)
            .or_else(|| std::env::var("HTTPS_PROXY").ok().filter(|v| !v.is_empty())),
        base_dir: config_file.get("BASE_DIR").map(PathBuf::from),
        quiet: options
            .quiet
            .unwrap_or_else(|| !std::io::stderr().is_terminal()),
        out: options.out.clone(),
        output_file_pattern,
        overwrite_policy,
    };

    Ok(Resolved { config, warnings })
}

/// Locates and loads the config file and the prompt file.
pub struct ConfigManager {
    current_dir: PathBuf,
    home_dir: PathBuf,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager searching the working directory, the XDG config
    /// directory and the home directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            current_dir: std::env::current_dir().context("Failed to get current directory")?,
            home_dir: paths::home_dir()?,
            config_dir: paths::config_dir()?,
        })
    }

    /// Candidate config file locations, in priority order.
    pub fn config_candidates(&self) -> Vec<PathBuf> {
        vec![
            self.current_dir.join(CONFIG_FILE_NAME),
            self.current_dir.join(".env"),
            self.config_dir.join("config"),
            self.home_dir.join(CONFIG_FILE_NAME),
        ]
    }

    /// Candidate prompt file locations, in priority order.
    pub fn prompt_candidates(&self) -> Vec<PathBuf> {
        vec![
            self.current_dir.join("prompt.md"),
            self.current_dir.join(".prompt.md"),
            self.config_dir.join("prompt.md"),
            self.home_dir.join(PROMPT_FILE_NAME),
        ]
    }

    pub fn load(&self) -> Result<ConfigFile> {
        let path = find_file(&self.config_candidates()).ok_or_else(|| {
            anyhow::anyhow!(
                "Config file not found.\n\n\
                 Create one of the following:\n  \
                 - ./{CONFIG_FILE_NAME}\n  \
                 - ./.env\n  \
                 - {}",
                self.config_dir.join("config").display()
            )
        })?;
        tracing::debug!("using config file {}", path.display());
        ConfigFile::from_path(&path)
    }

    pub fn load_prompt(&self) -> Result<String> {
        let path = find_file(&self.prompt_candidates()).ok_or_else(|| {
            anyhow::anyhow!(
                "Prompt file not found.\n\n\
                 Create ./prompt.md or {}",
                self.config_dir.join("prompt.md").display()
            )
        })?;
        read_text_file(&path)
    }
}

fn find_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| Path::new(p).exists()).cloned()
}
