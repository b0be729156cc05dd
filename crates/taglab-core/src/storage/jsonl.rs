use super::write_atomic;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;

pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    write_atomic(path, |w| {
        for item in items {
            serde_json::to_writer(&mut *w, item)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    })
    .with_context(|| format!("failed to write {}", path.display()))
}

/// Reads one JSON value per non-blank line.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = std::io::BufReader::new(file);

    let mut items = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{}: line {}: parse error", path.display(), i + 1))?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FineTuneExample, DEFAULT_SYSTEM_PROMPT};

    #[test]
    fn test_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fine_tune.jsonl");
        let examples = vec![
            FineTuneExample::new(DEFAULT_SYSTEM_PROMPT, "u1".into(), "Drive bold.".into()),
            FineTuneExample::new(DEFAULT_SYSTEM_PROMPT, "u2".into(), "Stay cold.".into()),
        ];
        write_jsonl(&path, &examples).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.lines().all(|l| l.starts_with(r#"{"messages":["#)));
        assert_eq!(read_jsonl::<FineTuneExample>(&path).unwrap(), examples);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"messages\":[]}\n\nnot json\n").unwrap();
        let err = read_jsonl::<FineTuneExample>(&path).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
