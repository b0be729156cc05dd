use crate::model::JobStatus;
use async_trait::async_trait;

pub const FINE_TUNE_PURPOSE: &str = "fine-tune";
pub const FILE_PROCESSED: &str = "processed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub training_file_id: String,
    pub base_model: String,
    pub suffix: String,
    pub epochs: u32,
}

/// What a single job-status poll returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub fine_tuned_model: Option<String>,
    pub error: Option<String>,
}

#[async_trait]
pub trait FineTuneApi: Send + Sync {
    /// Uploads `bytes` and returns the provider's file id.
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        purpose: &str,
    ) -> anyhow::Result<String>;
    async fn file_status(&self, file_id: &str) -> anyhow::Result<String>;
    async fn create_job(&self, request: &JobRequest) -> anyhow::Result<String>;
    async fn job_status(&self, job_id: &str) -> anyhow::Result<JobSnapshot>;
    fn provider_name(&self) -> &'static str;
}

pub mod fake;
pub mod openai;
