use super::{FineTuneApi, JobRequest, JobSnapshot};
use crate::model::JobStatus;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Call made against [`FakeFineTuneApi`], recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Upload { file_name: String, bytes: usize, purpose: String },
    FileStatus(String),
    CreateJob(JobRequest),
    JobStatus(String),
}

/// Scripted provider: file statuses and job snapshots are returned in order;
/// the last entry repeats once the script runs out.
pub struct FakeFineTuneApi {
    file_statuses: Mutex<VecDeque<String>>,
    job_snapshots: Mutex<VecDeque<JobSnapshot>>,
    calls: Mutex<Vec<FakeCall>>,
    fail_create: bool,
}

impl FakeFineTuneApi {
    pub fn new<F, J>(file_statuses: F, job_snapshots: J) -> Self
    where
        F: IntoIterator<Item = &'static str>,
        J: IntoIterator<Item = JobSnapshot>,
    {
        Self {
            file_statuses: Mutex::new(file_statuses.into_iter().map(String::from).collect()),
            job_snapshots: Mutex::new(job_snapshots.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            fail_create: false,
        }
    }

    /// A job that goes through the usual states and succeeds with `model`.
    pub fn succeeding(model: &str) -> Self {
        Self::new(
            ["uploaded", "processed"],
            [
                snapshot(JobStatus::ValidatingFiles),
                snapshot(JobStatus::Running),
                JobSnapshot {
                    status: JobStatus::Succeeded,
                    fine_tuned_model: Some(model.to_string()),
                    error: None,
                },
            ],
        )
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: FakeCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

pub fn snapshot(status: JobStatus) -> JobSnapshot {
    JobSnapshot {
        status,
        fine_tuned_model: None,
        error: None,
    }
}

fn next_or_last<T: Clone>(queue: &Mutex<VecDeque<T>>) -> anyhow::Result<T> {
    let mut q = queue
        .lock()
        .map_err(|_| anyhow::anyhow!("fake provider poisoned"))?;
    match q.len() {
        0 => anyhow::bail!("fake provider script is empty"),
        1 => Ok(q[0].clone()),
        _ => q
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("fake provider script is empty")),
    }
}

#[async_trait]
impl FineTuneApi for FakeFineTuneApi {
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        purpose: &str,
    ) -> anyhow::Result<String> {
        self.record(FakeCall::Upload {
            file_name: file_name.to_string(),
            bytes: bytes.len(),
            purpose: purpose.to_string(),
        });
        Ok("file-fake-1".to_string())
    }

    async fn file_status(&self, file_id: &str) -> anyhow::Result<String> {
        self.record(FakeCall::FileStatus(file_id.to_string()));
        next_or_last(&self.file_statuses)
    }

    async fn create_job(&self, request: &JobRequest) -> anyhow::Result<String> {
        self.record(FakeCall::CreateJob(request.clone()));
        if self.fail_create {
            anyhow::bail!("OpenAI fine-tuning API error (400): model not available");
        }
        Ok("ftjob-fake-1".to_string())
    }

    async fn job_status(&self, job_id: &str) -> anyhow::Result<JobSnapshot> {
        self.record(FakeCall::JobStatus(job_id.to_string()));
        next_or_last(&self.job_snapshots)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
