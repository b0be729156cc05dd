//! Upload, job creation and status polling for the fine-tuning run.

use crate::config::DataPaths;
use crate::errors::{JobTerminalError, PreconditionError};
use crate::model::{FineTuneJob, JobStatus};
use crate::pacing::{poll_until, CancelFlag, Poll, PollPolicy};
use crate::providers::finetune::{FineTuneApi, JobRequest, FILE_PROCESSED, FINE_TUNE_PURPOSE};
use anyhow::Context;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitSettings {
    pub base_model: String,
    pub suffix: String,
    pub epochs: u32,
    pub file_poll: PollPolicy,
    pub job_poll: PollPolicy,
}

pub struct FineTuneSubmitter<'a> {
    pub api: &'a dyn FineTuneApi,
    pub settings: SubmitSettings,
    pub cancel: CancelFlag,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn save_job_record(path: &Path, job: &FineTuneJob) -> anyhow::Result<()> {
    crate::storage::write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, job)?;
        w.write_all(b"\n")?;
        Ok(())
    })
}

pub fn load_job_record(path: &Path) -> anyhow::Result<Option<FineTuneJob>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job record {}", path.display()))?;
    let job = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse job record {}", path.display()))?;
    Ok(Some(job))
}

/// Job id that `--resume` can follow: `job_id.txt` agrees with the job record.
pub fn resumable_job_id(paths: &DataPaths) -> anyhow::Result<Option<String>> {
    let Some(job_id) = crate::storage::text::read_single_line(&paths.job_id)? else {
        return Ok(None);
    };
    let recorded = load_job_record(&paths.job_record)?.and_then(|j| j.job_id);
    Ok((recorded.as_deref() == Some(job_id.as_str())).then_some(job_id))
}

impl FineTuneSubmitter<'_> {
    /// Runs the whole submission: upload, wait for processing, create the job,
    /// wait for a terminal status. The job id is written as soon as the job
    /// exists; the model id only on success.
    pub async fn submit(&self, paths: &DataPaths) -> anyhow::Result<FineTuneJob> {
        if !paths.fine_tune.exists() {
            return Err(PreconditionError::MissingFineTuneFile(paths.fine_tune.clone()).into());
        }
        // ids from an earlier run must not outlive this submission
        crate::storage::text::clear_single_line(&paths.job_id)?;
        crate::storage::text::clear_single_line(&paths.model_id)?;

        let bytes = std::fs::read(&paths.fine_tune)
            .with_context(|| format!("failed to read {}", paths.fine_tune.display()))?;
        let examples = bytes.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();
        if examples == 0 {
            tracing::warn!(file = %paths.fine_tune.display(), "fine-tuning file has no examples");
        }

        let digest = sha256_hex(&bytes);
        let file_name = paths
            .fine_tune
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "fine_tune.jsonl".into());

        tracing::info!(
            event = "taglab.submit.upload",
            provider = self.api.provider_name(),
            examples,
            sha256 = %digest,
            "uploading fine-tuning data"
        );
        let file_id = self
            .api
            .upload_file(&file_name, bytes, FINE_TUNE_PURPOSE)
            .await
            .context("file upload failed")?;
        tracing::info!(file_id = %file_id, "file uploaded");

        let created = now();
        let mut job = FineTuneJob {
            file_id: file_id.clone(),
            job_id: None,
            status: JobStatus::Processing,
            fine_tuned_model: None,
            error: None,
            training_file_sha256: digest,
            base_model: self.settings.base_model.clone(),
            suffix: self.settings.suffix.clone(),
            epochs: self.settings.epochs,
            created_at: created.clone(),
            updated_at: created,
        };
        save_job_record(&paths.job_record, &job)?;

        self.wait_for_file(&file_id).await?;
        tracing::info!(file_id = %file_id, "file processed, creating fine-tuning job");

        let request = JobRequest {
            training_file_id: file_id,
            base_model: self.settings.base_model.clone(),
            suffix: self.settings.suffix.clone(),
            epochs: self.settings.epochs,
        };
        let job_id = self
            .api
            .create_job(&request)
            .await
            .context("creating fine-tuning job failed")?;

        crate::storage::text::write_single_line(&paths.job_id, &job_id)?;
        tracing::info!(
            event = "taglab.submit.job_created",
            job_id = %job_id,
            out = %paths.job_id.display(),
            "fine-tuning job created"
        );

        job.job_id = Some(job_id.clone());
        job.status = JobStatus::Queued;
        job.updated_at = now();
        save_job_record(&paths.job_record, &job)?;

        self.follow_job(paths, job).await
    }

    /// Picks up a job created by an earlier run (from `job_id.txt`) and waits
    /// for it to finish.
    pub async fn resume(&self, paths: &DataPaths) -> anyhow::Result<FineTuneJob> {
        let job_id = crate::storage::text::read_single_line(&paths.job_id)?.ok_or_else(|| {
            anyhow::anyhow!(
                "no job id at {} (run `taglab submit` without --resume)",
                paths.job_id.display()
            )
        })?;

        let job = match load_job_record(&paths.job_record)? {
            Some(j) if j.job_id.as_deref() == Some(job_id.as_str()) => j,
            _ => {
                let t = now();
                FineTuneJob {
                    file_id: String::new(),
                    job_id: Some(job_id.clone()),
                    status: JobStatus::Running,
                    fine_tuned_model: None,
                    error: None,
                    training_file_sha256: String::new(),
                    base_model: self.settings.base_model.clone(),
                    suffix: self.settings.suffix.clone(),
                    epochs: self.settings.epochs,
                    created_at: t.clone(),
                    updated_at: t,
                }
            }
        };
        tracing::info!(job_id = %job_id, "resuming fine-tuning job");
        self.follow_job(paths, job).await
    }

    async fn wait_for_file(&self, file_id: &str) -> anyhow::Result<()> {
        poll_until(
            "uploaded file to be processed",
            self.settings.file_poll,
            &self.cancel,
            || async move {
                let status = self.api.file_status(file_id).await?;
                match status.as_str() {
                    FILE_PROCESSED => Ok::<_, anyhow::Error>(Poll::Ready(())),
                    "error" => anyhow::bail!("provider could not process file {}", file_id),
                    other => {
                        tracing::debug!(file_id, status = other, "file not processed yet");
                        Ok(Poll::Pending)
                    }
                }
            },
        )
        .await
    }

    async fn follow_job(&self, paths: &DataPaths, job: FineTuneJob) -> anyhow::Result<FineTuneJob> {
        let job_id = job
            .job_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("job record has no job id"))?;
        let state = Mutex::new(job);

        let snapshot = poll_until(
            "fine-tuning job to finish",
            self.settings.job_poll,
            &self.cancel,
            || {
                let (job_id, state) = (job_id.as_str(), &state);
                async move {
                    let snap = self.api.job_status(job_id).await?;
                    let changed = {
                        let mut j = lock(state)?;
                        let changed = j.status != snap.status;
                        if changed {
                            j.status = snap.status;
                            j.updated_at = now();
                            save_job_record(&paths.job_record, &j)?;
                        }
                        changed
                    };
                    if changed {
                        tracing::info!(
                            event = "taglab.submit.status",
                            job_id,
                            status = %snap.status,
                            "fine-tuning job status changed"
                        );
                    }
                    Ok::<_, anyhow::Error>(if snap.status.is_terminal() {
                        Poll::Ready(snap)
                    } else {
                        Poll::Pending
                    })
                }
            },
        )
        .await
        .with_context(|| format!("while waiting for fine-tuning job {}", job_id))?;

        let mut job = state
            .into_inner()
            .map_err(|_| anyhow::anyhow!("job state poisoned"))?;
        job.error = snapshot.error.clone();
        job.updated_at = now();

        if snapshot.status != JobStatus::Succeeded {
            save_job_record(&paths.job_record, &job)?;
            return Err(JobTerminalError {
                job_id,
                status: snapshot.status,
                error: snapshot.error,
            }
            .into());
        }

        let model_id = snapshot.fine_tuned_model.ok_or_else(|| {
            anyhow::anyhow!("job {} succeeded but reported no fine-tuned model", job_id)
        })?;
        crate::storage::text::write_single_line(&paths.model_id, &model_id)?;
        job.fine_tuned_model = Some(model_id.clone());
        save_job_record(&paths.job_record, &job)?;

        tracing::info!(
            event = "taglab.submit.succeeded",
            job_id = %job_id,
            model_id = %model_id,
            out = %paths.model_id.display(),
            "fine-tuning completed"
        );
        Ok(job)
    }
}

fn lock(state: &Mutex<FineTuneJob>) -> anyhow::Result<MutexGuard<'_, FineTuneJob>> {
    state
        .lock()
        .map_err(|_| anyhow::anyhow!("job state poisoned"))
}
