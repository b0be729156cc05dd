use super::exit_codes;
use crate::cli::args::InitArgs;
use std::path::Path;
use taglab_core::config::{load_config, write_sample_config};
use taglab_core::storage::briefs::SAMPLE_BRIEFS;

pub fn run(config_path: &Path, args: InitArgs) -> anyhow::Result<i32> {
    // 1. Config
    if config_path.exists() {
        eprintln!("note: {} already exists", config_path.display());
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_sample_config(config_path)?;
        eprintln!("created {}", config_path.display());
    }

    // 2. Sample briefs in the configured data dir
    let cfg = load_config(config_path, false)?;
    let paths = cfg.paths(config_path);
    paths.ensure_data_dir()?;
    write_file_if_missing(&paths.briefs, SAMPLE_BRIEFS)?;

    // 3. Gitignore
    if args.gitignore {
        let dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        write_file_if_missing(&dir.join(".gitignore"), crate::templates::GITIGNORE)?;
    }

    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}
