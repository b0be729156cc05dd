//! Flat-file persistence. Every writer replaces its file in full through a
//! sibling temp file, so readers never observe a half-written table.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod briefs;
pub mod jsonl;
pub mod tables;
pub mod text;

pub use briefs::load_briefs;
pub use tables::{
    load_baseline, load_blind_form, load_evaluation, load_rankings, load_results, save_baseline,
    save_blind_form, save_evaluation, save_rankings, save_results,
};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `path` in full via `fill`, replacing any previous content.
pub fn write_atomic<F>(path: &Path, fill: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut dyn Write) -> anyhow::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_path(path);
    let result = (|| {
        let file = std::fs::File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        let mut w = std::io::BufWriter::new(file);
        fill(&mut w)?;
        w.flush()?;
        Ok::<_, anyhow::Error>(())
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))
}

/// Writes a header row followed by one serialized record per item.
pub fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> anyhow::Result<()> {
    write_atomic(path, |w| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(w);
        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })
    .with_context(|| format!("failed to write table {}", path.display()))
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open table {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

    let mut rows = Vec::new();
    for (i, rec) in reader.deserialize().enumerate() {
        // header is line 1
        let row: T = rec.with_context(|| format!("{}: row {}", path.display(), i + 2))?;
        rows.push(row);
    }
    Ok(rows)
}
