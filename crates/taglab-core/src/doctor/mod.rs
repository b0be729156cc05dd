//! Read-only inspection of the data directory.

pub mod model;

use chrono::Utc;
use std::path::Path;

use crate::config::{DataPaths, TaglabConfig};
use crate::finetune::load_job_record;

use model::*;

pub struct DoctorOptions<'a> {
    pub config_path: &'a Path,
    pub api_key_set: bool,
}

pub fn doctor(cfg: &TaglabConfig, paths: &DataPaths, opts: &DoctorOptions<'_>) -> DoctorReport {
    let mut notes = vec![];
    let mut stages = vec![];

    // 1) Inputs and tables, in pipeline order
    stages.push(check(
        "briefs",
        &paths.briefs,
        |p| crate::storage::load_briefs(p),
        |b| b.training_briefs.len() + b.evaluation_briefs.len(),
        |b| {
            Some(format!(
                "{} training, {} evaluation",
                b.training_briefs.len(),
                b.evaluation_briefs.len()
            ))
        },
    ));
    stages.push(check(
        "generate",
        &paths.baseline,
        |p| crate::storage::load_baseline(p),
        Vec::len,
        |rows| {
            let empty = rows
                .iter()
                .filter(|r| r.taglines.iter().all(String::is_empty))
                .count();
            (empty > 0).then(|| format!("{} brief(s) with no candidates", empty))
        },
    ));
    stages.push(check(
        "rank",
        &paths.rankings,
        |p| crate::storage::load_rankings(p),
        Vec::len,
        |rows| {
            let bad = rows.iter().filter(|r| !r.is_permutation()).count();
            (bad > 0).then(|| format!("{} row(s) are not a permutation of 1..=5", bad))
        },
    ));
    stages.push(check(
        "prepare",
        &paths.fine_tune,
        |p| crate::storage::jsonl::read_jsonl::<serde_json::Value>(p),
        Vec::len,
        |_| None,
    ));

    // 2) Fine-tuning state
    let job = match load_job_record(&paths.job_record) {
        Ok(j) => j,
        Err(e) => {
            notes.push(format!("job record unreadable: {:#}", e));
            None
        }
    };
    stages.push(single_line("submit", &paths.job_id, job.as_ref().map(|j| j.status.to_string())));
    stages.push(single_line("submit", &paths.model_id, None));

    // 3) Evaluation and judgments
    stages.push(check(
        "evaluate",
        &paths.evaluation,
        |p| crate::storage::load_evaluation(p),
        Vec::len,
        |_| None,
    ));
    stages.push(check(
        "evaluate",
        &paths.blind_form,
        |p| crate::storage::load_blind_form(p),
        Vec::len,
        |rows| {
            let filled = rows.iter().filter(|r| !r.preferred_tagline.trim().is_empty()).count();
            Some(format!("{} of {} filled", filled, rows.len()))
        },
    ));
    stages.push(check(
        "judge",
        &paths.results,
        |p| crate::storage::load_results(p),
        Vec::len,
        |_| None,
    ));

    if !opts.api_key_set {
        notes.push("OPENAI_API_KEY is not set; generate, submit and evaluate need it".into());
    }
    if let Some(j) = &job {
        if let Some(err) = &j.error {
            notes.push(format!("last fine-tuning job reported: {}", err));
        }
    }

    let next_action = suggest_next(paths, job.as_ref().map(|j| j.status.is_terminal()));

    DoctorReport {
        schema_version: 1,
        generated_at: Utc::now().to_rfc3339(),
        taglab_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        config: ConfigSummary {
            config_path: opts.config_path.display().to_string(),
            config_found: opts.config_path.exists(),
            data_dir: paths.data_dir.display().to_string(),
            baseline_model: cfg.baseline_model.clone(),
            finetune_base_model: cfg.finetune_base_model.clone(),
            api_key_set: opts.api_key_set,
        },
        stages,
        next_action,
        notes,
    }
}

fn check<T>(
    stage: &str,
    path: &Path,
    load: impl FnOnce(&Path) -> anyhow::Result<T>,
    count: impl FnOnce(&T) -> usize,
    detail: impl FnOnce(&T) -> Option<String>,
) -> StageCheck {
    let mut out = StageCheck {
        stage: stage.to_string(),
        path: path.display().to_string(),
        exists: path.exists(),
        rows: None,
        detail: None,
        error: None,
    };
    if !out.exists {
        return out;
    }
    match load(path) {
        Ok(v) => {
            out.rows = Some(count(&v));
            out.detail = detail(&v);
        }
        Err(e) => out.error = Some(format!("{:#}", e)),
    }
    out
}

fn single_line(stage: &str, path: &Path, detail: Option<String>) -> StageCheck {
    check(
        stage,
        path,
        crate::storage::text::read_single_line,
        |v| usize::from(v.is_some()),
        |v| match (v, &detail) {
            (Some(id), Some(status)) => Some(format!("{} ({})", id, status)),
            (Some(id), None) => Some(id.clone()),
            (None, _) => Some("empty".into()),
        },
    )
}

fn action(title: &str, command: &str) -> SuggestedAction {
    SuggestedAction {
        title: title.to_string(),
        command: command.to_string(),
    }
}

/// First unfinished stage wins. `job_terminal` is `None` when no job record exists.
fn suggest_next(paths: &DataPaths, job_terminal: Option<bool>) -> SuggestedAction {
    if !paths.briefs.exists() {
        return action("Create a config and sample briefs", "taglab init");
    }
    if !paths.baseline.exists() {
        return action("Generate baseline candidates", "taglab generate");
    }
    if !paths.rankings.exists() {
        return action("Rank the baseline candidates", "taglab rank");
    }
    if !paths.fine_tune.exists() {
        return action("Build the fine-tuning file", "taglab prepare");
    }
    if !paths.model_id.exists() {
        if paths.job_id.exists() && job_terminal != Some(true) {
            return action("Keep waiting for the running job", "taglab submit --resume");
        }
        return action("Submit the fine-tuning job", "taglab submit");
    }
    if !paths.evaluation.exists() {
        return action("Evaluate both models on held-out briefs", "taglab evaluate");
    }
    if !paths.results.exists() {
        return action("Record blind preferences", "taglab judge");
    }
    action("Show the significance report", "taglab report")
}
