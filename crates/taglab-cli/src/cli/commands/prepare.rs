use super::{exit_codes, Workspace};
use taglab_core::prepare::prepare_finetune;

pub fn run(ws: Workspace) -> anyhow::Result<i32> {
    let prepared = prepare_finetune(&ws.paths, &ws.cfg.system_prompt)?;
    eprintln!(
        "wrote {} ({} examples)",
        ws.paths.fine_tune.display(),
        prepared.examples.len()
    );

    if prepared.skipped.is_empty() {
        return Ok(exit_codes::OK);
    }
    for s in &prepared.skipped {
        eprintln!("✖ brief {}: {}", s.brief_id, s.reason);
    }
    eprintln!("{} ranking row(s) skipped", prepared.skipped.len());
    Ok(exit_codes::FAILED)
}
