//! XDG-style config directory lookup and output file path templating.

use anyhow::{Result, anyhow};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

const APP_NAME: &str = "chatgpt-md-translator";

#[allow(clippy::expect_used)]
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+?)\}").expect("Invalid placeholder regex"));

/// Returns the configuration directory for chatgpt-md-translator.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/chatgpt-md-translator` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/chatgpt-md-translator` otherwise
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => Ok(PathBuf::from(xdg).join(APP_NAME)),
        _ => Ok(home_dir()?.join(".config").join(APP_NAME)),
    }
}

/// Returns the user's home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("Failed to determine home directory"))
}

/// Returns true if `pattern` contains at least one `{name}` placeholder.
pub fn has_placeholder(pattern: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(pattern)
}

/// Computes the values available to an output file pattern.
///
/// For `/prj/src/tutorial/index.md` these are `dir` (`/prj/src/tutorial`),
/// `main` (`/prj/src/tutorial/index`), `basename` (`index`), `filename`
/// (`index.md`) and `ext` (`md`). When `base_dir` is given, `basedir`,
/// `reldir` and `relmain` are added, relative to it.
pub fn extract_placeholders(input: &Path, base_dir: Option<&Path>) -> BTreeMap<&'static str, String> {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let basename = input.file_stem().unwrap_or_default();
    let ext = input.extension().unwrap_or_default();

    let mut placeholders = BTreeMap::from([
        ("dir", display(dir)),
        ("main", display(&dir.join(basename))),
        ("basename", basename.to_string_lossy().into_owned()),
        (
            "filename",
            input.file_name().unwrap_or_default().to_string_lossy().into_owned(),
        ),
        ("ext", ext.to_string_lossy().into_owned()),
    ]);

    if let Some(base_dir) = base_dir {
        let reldir = relative_path(base_dir, dir);
        placeholders.insert("basedir", display(base_dir));
        placeholders.insert("relmain", display(&reldir.join(basename)));
        placeholders.insert("reldir", display(&reldir));
    }

    placeholders
}

/// Resolves where the translation of `input` is written.
///
/// Without a pattern the input file itself is the output. Placeholders with
/// no known value are left as written.
pub fn resolve_out_file_path(input: &Path, base_dir: Option<&Path>, pattern: Option<&str>) -> PathBuf {
    let Some(pattern) = pattern else {
        return input.to_path_buf();
    };
    let placeholders = extract_placeholders(input, base_dir);
    let resolved = PLACEHOLDER_REGEX.replace_all(pattern, |caps: &Captures| {
        placeholders
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    PathBuf::from(resolved.into_owned())
}

/// Path of `to` relative to `from`, using `..` where they diverge.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = to.components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component);
    }
    relative
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
