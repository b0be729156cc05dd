use super::{FineTuneApi, JobRequest, JobSnapshot};
use crate::model::JobStatus;
use crate::providers::{ensure_success, trim_base_url, DEFAULT_OPENAI_BASE_URL};
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAIFineTuneClient {
    pub api_key: String,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl OpenAIFineTuneClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: trim_base_url(base_url),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json(&self, path: &str, what: &str) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let resp = ensure_success(resp, what).await?;
        Ok(resp.json().await?)
    }
}

fn required_str(json: &serde_json::Value, pointer: &str, what: &str) -> anyhow::Result<String> {
    json.pointer(pointer)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("OpenAI {} response missing {}", what, pointer))
}

/// `error` is either null, an object with `message`/`code`, or absent.
fn error_detail(json: &serde_json::Value) -> Option<String> {
    let err = json.get("error").filter(|e| !e.is_null())?;
    let message = err.get("message").and_then(|m| m.as_str());
    let code = err.get("code").and_then(|c| c.as_str());
    match (code, message) {
        (Some(c), Some(m)) => Some(format!("{} ({})", m, c)),
        (None, Some(m)) => Some(m.to_string()),
        (Some(c), None) => Some(c.to_string()),
        (None, None) if err.as_object().is_some_and(|o| o.is_empty()) => None,
        (None, None) => Some(err.to_string()),
    }
}

pub(crate) fn parse_job_snapshot(json: &serde_json::Value) -> anyhow::Result<JobSnapshot> {
    let status = JobStatus::from_provider(&required_str(json, "/status", "job")?);
    let fine_tuned_model = json
        .get("fine_tuned_model")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok(JobSnapshot {
        status,
        fine_tuned_model,
        error: error_detail(json),
    })
}

#[async_trait]
impl FineTuneApi for OpenAIFineTuneClient {
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        purpose: &str,
    ) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/jsonl")?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = ensure_success(resp, "files").await?;
        let json: serde_json::Value = resp.json().await?;
        required_str(&json, "/id", "files")
    }

    async fn file_status(&self, file_id: &str) -> anyhow::Result<String> {
        let json = self.get_json(&format!("/files/{}", file_id), "files").await?;
        required_str(&json, "/status", "files")
    }

    async fn create_job(&self, request: &JobRequest) -> anyhow::Result<String> {
        let body = json!({
            "training_file": request.training_file_id,
            "model": request.base_model,
            "suffix": request.suffix,
            "hyperparameters": { "n_epochs": request.epochs },
        });

        let resp = self
            .client
            .post(format!("{}/fine_tuning/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = ensure_success(resp, "fine-tuning").await?;
        let json: serde_json::Value = resp.json().await?;
        required_str(&json, "/id", "fine-tuning")
    }

    async fn job_status(&self, job_id: &str) -> anyhow::Result<JobSnapshot> {
        let json = self
            .get_json(&format!("/fine_tuning/jobs/{}", job_id), "fine-tuning")
            .await?;
        parse_job_snapshot(&json)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_succeeded_job() {
        let json = json!({
            "id": "ftjob-abc",
            "status": "succeeded",
            "fine_tuned_model": "ft:gpt-3.5-turbo-0125:acme:ecd-eye:xyz",
            "error": null
        });
        let snap = parse_job_snapshot(&json).unwrap();
        assert_eq!(snap.status, JobStatus::Succeeded);
        assert_eq!(
            snap.fine_tuned_model.as_deref(),
            Some("ft:gpt-3.5-turbo-0125:acme:ecd-eye:xyz")
        );
        assert_eq!(snap.error, None);
    }

    #[test]
    fn test_parse_failed_job_error_detail() {
        let json = json!({
            "status": "failed",
            "fine_tuned_model": null,
            "error": { "code": "invalid_training_file", "message": "Too few examples", "param": null }
        });
        let snap = parse_job_snapshot(&json).unwrap();
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.fine_tuned_model, None);
        assert_eq!(
            snap.error.as_deref(),
            Some("Too few examples (invalid_training_file)")
        );
    }

    #[test]
    fn test_empty_error_object_is_none() {
        let snap = parse_job_snapshot(&json!({ "status": "running", "error": {} })).unwrap();
        assert_eq!(snap.error, None);
    }

    #[test]
    fn test_missing_status_is_error() {
        assert!(parse_job_snapshot(&json!({ "id": "x" })).is_err());
    }
}
