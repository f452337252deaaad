use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Hidden sibling the content is staged in before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "loginprobe".to_string());
    path.with_file_name(format!(".{}.partial", name))
}

/// Writes `value` as pretty JSON. Readers see either the previous file or
/// the complete new one.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value).context("Failed to serialize JSON")?;
    json.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, &json).with_context(|| format!("Failed to write {}", staging.display()))?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

/// A comma-separated list, or the path of a file with one entry per line.
/// Entries are trimmed and blank ones dropped.
pub fn read_list(list_or_path: &str) -> Result<Vec<String>> {
    let path = Path::new(list_or_path);
    let raw = if path.is_file() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read list file: {}", path.display()))?
    } else {
        list_or_path.replace(',', "\n")
    };

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
