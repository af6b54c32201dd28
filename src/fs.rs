//! File system utilities.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads a UTF-8 text file, reporting common failures in plain words.
///
/// # Errors
///
/// Returns an error if the path is a directory, does not exist, cannot be
/// read, or is not valid UTF-8.
pub fn read_text_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) => match e.kind() {
            ErrorKind::IsADirectory => {
                bail!("The specified path is a directory: {}", path.display())
            }
            ErrorKind::NotFound => bail!("File not found: {}", path.display()),
            ErrorKind::PermissionDenied => bail!("Permission denied: {}", path.display()),
            _ => Err(e).with_context(|| format!("Failed to read file: {}", path.display())),
        },
    }
}

/// Checks that `path` can be written, either by replacing an existing file
/// or by creating a new one in an existing directory.
///
/// # Errors
///
/// Returns an error naming the file or directory that blocks the write.
pub fn check_file_writable(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) => {
            if metadata.is_dir() || metadata.permissions().readonly() {
                bail!("File is not writable: {}", path.display());
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            match fs::metadata(dir) {
                Ok(metadata) if metadata.is_dir() && !metadata.permissions().readonly() => Ok(()),
                Ok(_) => bail!("Directory is not writable: {}", dir.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    bail!("Directory does not exist: {}", dir.display())
                }
                Err(_) => bail!("Directory is not writable: {}", dir.display()),
            }
        }
        Err(_) => bail!("File is not writable: {}", path.display()),
    }
}

/// Writes content to a file atomically using a temp file and rename.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem; an interrupted run never leaves a half-written translation.
///
/// # Errors
///
/// Returns an error if the temp file cannot be written or renamed.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
