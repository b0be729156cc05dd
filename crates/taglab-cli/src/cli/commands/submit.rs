use super::{exit_codes, require_api, Workspace};
use crate::cli::args::SubmitArgs;
use taglab_core::errors::{ConfigError, JobTerminalError, PollError};
use taglab_core::finetune::{resumable_job_id, FineTuneSubmitter, SubmitSettings};
use taglab_core::pacing::{CancelFlag, PollPolicy};
use taglab_core::providers::finetune::openai::OpenAIFineTuneClient;

pub async fn run(ws: Workspace, args: SubmitArgs) -> anyhow::Result<i32> {
    let (key, base_url) = require_api(&args.api)?;
    let ft = &ws.cfg.finetune;
    let epochs = args.epochs.unwrap_or(ft.epochs);
    if epochs == 0 {
        return Err(ConfigError("--epochs must be at least 1".into()).into());
    }

    let settings = SubmitSettings {
        base_model: args
            .base_model
            .clone()
            .unwrap_or_else(|| ws.cfg.finetune_base_model.clone()),
        suffix: ft.suffix.clone(),
        epochs,
        file_poll: PollPolicy::new(ft.file_poll(), ft.file_timeout()),
        job_poll: PollPolicy::new(ft.job_poll(), ft.job_timeout()),
    };

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current poll");
            on_signal.cancel();
        }
    });

    let client = OpenAIFineTuneClient::with_base_url(key, &base_url);
    let submitter = FineTuneSubmitter {
        api: &client,
        settings,
        cancel,
    };

    let outcome = if args.resume {
        submitter.resume(&ws.paths).await
    } else {
        submitter.submit(&ws.paths).await
    };

    match outcome {
        Ok(job) => {
            eprintln!(
                "fine-tuning succeeded: {}",
                job.fine_tuned_model.as_deref().unwrap_or_default()
            );
            eprintln!("wrote {}", ws.paths.model_id.display());
            Ok(exit_codes::OK)
        }
        Err(e) => {
            if let Some(term) = e.chain().find_map(|c| c.downcast_ref::<JobTerminalError>()) {
                eprintln!("✖ {}", term);
                eprintln!("no model id written; see {}", ws.paths.job_record.display());
                return Ok(exit_codes::FAILED);
            }
            if let Some(poll) = e.chain().find_map(|c| c.downcast_ref::<PollError>()) {
                eprintln!("✖ {}", poll);
                if resumable_job_id(&ws.paths)?.is_some() {
                    eprintln!("the job keeps running; continue with `taglab submit --resume`");
                }
                return Ok(exit_codes::FAILED);
            }
            Err(e)
        }
    }
}
