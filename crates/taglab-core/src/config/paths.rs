use super::FileNames;
use std::path::{Component, Path, PathBuf};

/// Resolved locations of every table the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub briefs: PathBuf,
    pub baseline: PathBuf,
    pub rankings: PathBuf,
    pub fine_tune: PathBuf,
    pub job_id: PathBuf,
    pub job_record: PathBuf,
    pub model_id: PathBuf,
    pub evaluation: PathBuf,
    pub blind_form: PathBuf,
    pub results: PathBuf,
}

impl DataPaths {
    pub fn resolve(config_path: &Path, data_dir: &str, files: &FileNames) -> Self {
        let base_dir = config_path.parent().unwrap_or(Path::new("."));
        let dir = PathBuf::from(data_dir);
        let data_dir = if dir.is_absolute() {
            dir
        } else {
            join_clean(base_dir, &dir)
        };
        Self::in_dir(data_dir, files)
    }

    pub fn in_dir(data_dir: PathBuf, files: &FileNames) -> Self {
        let at = |name: &str| data_dir.join(name);
        Self {
            briefs: at(&files.briefs),
            baseline: at(&files.baseline),
            rankings: at(&files.rankings),
            fine_tune: at(&files.fine_tune),
            job_id: at(&files.job_id),
            job_record: at(&files.job_record),
            model_id: at(&files.model_id),
            evaluation: at(&files.evaluation),
            blind_form: at(&files.blind_form),
            results: at(&files.results),
            data_dir,
        }
    }

    pub fn ensure_data_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            anyhow::anyhow!(
                "failed to create data dir {}: {}",
                self.data_dir.display(),
                e
            )
        })
    }
}

fn join_clean(base: &Path, rel: &Path) -> PathBuf {
    let joined = base.join(rel);

    let mut out = PathBuf::new();
    for c in joined.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                out.push(c.as_os_str())
            }
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to_config_dir() {
        let p = DataPaths::resolve(
            Path::new("project/taglab.yaml"),
            "./data",
            &FileNames::default(),
        );
        assert_eq!(p.data_dir, PathBuf::from("project/data"));
        assert_eq!(p.rankings, PathBuf::from("project/data/rankings.csv"));
    }

    #[test]
    fn test_bare_config_name() {
        let p = DataPaths::resolve(Path::new("taglab.yaml"), "data", &FileNames::default());
        assert_eq!(p.baseline, PathBuf::from("data/baseline.csv"));
    }

    #[test]
    fn test_parent_dir_is_kept_when_nothing_to_pop() {
        let p = DataPaths::resolve(Path::new("taglab.yaml"), "../shared", &FileNames::default());
        assert_eq!(p.data_dir, PathBuf::from("../shared"));
    }
}
