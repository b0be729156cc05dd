use super::write_atomic;
use anyhow::Context;
use std::path::Path;

/// Reads a single-value file (job id, model id). Missing or blank files yield `None`.
pub fn read_single_line(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = raw.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

pub fn write_single_line(path: &Path, value: &str) -> anyhow::Result<()> {
    write_atomic(path, |w| {
        w.write_all(value.trim().as_bytes())?;
        Ok(())
    })
}

/// Removes a single-value file; an absent file is fine.
pub fn clear_single_line(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}
