use anyhow::{Context, Result, bail};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cli::Args;
use crate::config::{
    Config, ConfigManager, OverwritePolicy, ResolveOptions, Resolved, resolve_config,
};
use crate::fs::{atomic_write, check_file_writable, read_text_file};
use crate::markdown::{Elided, replace_code_blocks, restore_code_blocks, split_at_blank_lines};
use crate::paths::resolve_out_file_path;
use crate::translation::{
    ApiCaller, Settled, Status, TranslationClient, limit_call_rate, translate_multiple,
};
use crate::ui::{StatusLine, Style, format_elapsed};
use crate::warn;

pub struct TranslateOptions {
    pub files: Vec<PathBuf>,
    pub resolve: ResolveOptions,
}

impl From<Args> for TranslateOptions {
    fn from(args: Args) -> Self {
        Self {
            files: args.files,
            resolve: ResolveOptions {
                model: args.model,
                fragment_size: args.fragment_size,
                temperature: args.temperature,
                interval: args.interval,
                quiet: args.quiet.then_some(true),
                out: args.out,
                out_suffix: args.out_suffix,
                overwrite_policy: args.overwrite_policy,
            },
        }
    }
}

/// What happened to one input file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Written(PathBuf),
    /// The output already existed and the overwrite policy is `skip`.
    Skipped(PathBuf),
}

pub async fn run_translate(options: TranslateOptions) -> Result<()> {
    if options.files.len() > 1 && options.resolve.out.is_some() {
        bail!("--out cannot be used with multiple input files");
    }

    let manager = ConfigManager::new()?;
    let config_file = manager.load()?;
    let prompt = manager.load_prompt()?;
    let Resolved { config, warnings } = resolve_config(&options.resolve, &config_file, prompt)?;

    for warning in &warnings {
        warn!("{} {warning}", Style::warning("Warning:"));
    }

    let client = TranslationClient::new(
        config.api_endpoint.clone(),
        config.api_key.clone(),
        config.https_proxy.as_deref(),
    )?;
    let caller = limit_call_rate(Arc::new(client), config.api_call_interval)?;

    let signal = CancellationToken::new();
    let interrupt = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    for file in &options.files {
        translate_file(caller.as_ref(), &config, file, &signal).await?;
    }

    Ok(())
}

/// Translates one Markdown file and writes the result.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, the output exists
/// under the `abort` policy, the translation fails, or `signal` is cancelled.
pub async fn translate_file(
    caller: &dyn ApiCaller,
    config: &Config,
    file: &Path,
    signal: &CancellationToken,
) -> Result<FileOutcome> {
    translate_file_with_log(caller, config, file, signal, &mut std::io::stderr()).await
}

/// Per-file progress lines, dropped when `quiet` is set.
struct Progress<'a> {
    quiet: bool,
    log: &'a mut (dyn Write + Send),
}

impl Progress<'_> {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        if !self.quiet {
            let _ = writeln!(self.log, "{args}");
        }
    }
}

async fn translate_file_with_log(
    caller: &dyn ApiCaller,
    config: &Config,
    file: &Path,
    signal: &CancellationToken,
    log: &mut (dyn Write + Send),
) -> Result<FileOutcome> {
    let mut progress = Progress {
        quiet: config.quiet,
        log,
    };
    let base_dir = config
        .base_dir
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("Failed to resolve BASE_DIR")?;
    let input_path = match &base_dir {
        Some(base_dir) => base_dir.join(file),
        None => std::path::absolute(file)
            .with_context(|| format!("Failed to resolve {}", file.display()))?,
    };
    let markdown = read_text_file(&input_path)?;

    let out_path = match &config.out {
        Some(out) => match &base_dir {
            Some(base_dir) => base_dir.join(out),
            None => std::path::absolute(out)
                .with_context(|| format!("Failed to resolve {}", out.display()))?,
        },
        None => resolve_out_file_path(
            &input_path,
            base_dir.as_deref(),
            config.output_file_pattern.as_deref(),
        ),
    };

    if out_path != input_path && out_path.exists() {
        match config.overwrite_policy {
            OverwritePolicy::Skip => {
                progress.line(format_args!(
                    "{} {} already exists.",
                    Style::warning("Skipped:"),
                    out_path.display()
                ));
                return Ok(FileOutcome::Skipped(out_path));
            }
            OverwritePolicy::Abort => {
                bail!("Output file already exists: {}", out_path.display())
            }
            OverwritePolicy::Overwrite => {}
        }
    }
    check_file_writable(&out_path)?;

    let Elided {
        output: elided,
        code_blocks,
    } = replace_code_blocks(&markdown, config.code_block_preservation_lines)?;
    let fragments = split_at_blank_lines(&elided, config.fragment_size)
        .unwrap_or_else(|| vec![elided.clone()]);

    progress.line(format_args!(
        "{} {}",
        Style::label("Translating:"),
        Style::value(input_path.display())
    ));
    progress.line(format_args!(
        "{} {}  {} {}  {} {}",
        Style::label("Model:"),
        Style::value(&config.model),
        Style::label("Temperature:"),
        Style::value(config.temperature),
        Style::label("Fragments:"),
        Style::value(fragments.len())
    ));
    tracing::debug!(
        fragments = fragments.len(),
        elided = code_blocks.len(),
        "prepared {}",
        input_path.display()
    );

    let started = Instant::now();
    let status_line = StatusLine::new(config.quiet);
    let on_status = |status: Status| status_line.update(&status);
    let result = translate_multiple(caller, &fragments, config, &on_status, signal).await;
    status_line.finish();

    if signal.is_cancelled() {
        bail!("Translation aborted.");
    }
    let translation = match result {
        Settled::Done { translation } => translation,
        Settled::Error { message } => bail!("{message}"),
        Settled::Aborted => bail!("Translation aborted."),
    };

    let restored = restore_code_blocks(&translation, &code_blocks);
    atomic_write(&out_path, &format!("{restored}\n"))?;

    progress.line(format_args!(
        "{}",
        Style::success(format!(
            "Translation completed in {}.",
            format_elapsed(started.elapsed())
        ))
    ));
    progress.line(format_args!(
        "{} {}",
        Style::label("File saved as"),
        Style::value(out_path.display())
    ));

    Ok(FileOutcome::Written(out_path))
}
