use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// A ranking that is not a permutation of `1..=5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRanking {
    pub brief_id: i64,
    pub ranks: Vec<u8>,
}

impl fmt::Display for InvalidRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "brief {}: ranks {:?} (each tagline needs a unique rank from 1 to 5)",
            self.brief_id, self.ranks
        )
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct RankingValidationError {
    pub invalid: Vec<InvalidRanking>,
}

impl RankingValidationError {
    pub fn brief_ids(&self) -> Vec<i64> {
        self.invalid.iter().map(|i| i.brief_id).collect()
    }
}

impl fmt::Display for RankingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ranking for {} brief(s):", self.invalid.len())?;
        for i in &self.invalid {
            write!(f, "\n  - {}", i)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("fine-tuning data not found at {0} (run `taglab prepare` first)")]
    MissingFineTuneFile(PathBuf),
    #[error("fine-tuned model id not found at {0} (run `taglab submit` first)")]
    MissingModelId(PathBuf),
    #[error("missing API key: set OPENAI_API_KEY or pass --api-key")]
    MissingApiKey,
}

#[derive(Debug, thiserror::Error)]
#[error("fine-tuning job {job_id} ended with status {status}{}", detail_suffix(.error))]
pub struct JobTerminalError {
    pub job_id: String,
    pub status: crate::model::JobStatus,
    pub error: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("timed out after {waited:?} waiting for {what}")]
    TimedOut { what: String, waited: Duration },
    #[error("cancelled while waiting for {what}")]
    Cancelled { what: String },
}

/// True when `e` (or anything it wraps) should be reported as a config or
/// precondition problem rather than a runtime failure.
pub fn is_config_error(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause.is::<ConfigError>() || cause.is::<PreconditionError>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobStatus;

    #[test]
    fn test_ranking_error_lists_all_briefs() {
        let err = RankingValidationError {
            invalid: vec![
                InvalidRanking {
                    brief_id: 2,
                    ranks: vec![1, 2, 2, 4, 5],
                },
                InvalidRanking {
                    brief_id: 9,
                    ranks: vec![5, 5, 5, 5, 5],
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("brief 2"));
        assert!(msg.contains("brief 9"));
        assert_eq!(err.brief_ids(), vec![2, 9]);
    }

    #[test]
    fn test_job_error_detail() {
        let err = JobTerminalError {
            job_id: "ftjob-1".into(),
            status: JobStatus::Failed,
            error: Some("invalid training file".into()),
        };
        assert_eq!(
            err.to_string(),
            "fine-tuning job ftjob-1 ended with status failed: invalid training file"
        );
    }

    #[test]
    fn test_config_error_detection_through_context() {
        let e = anyhow::Error::new(PreconditionError::MissingApiKey).context("submit");
        assert!(is_config_error(&e));
        assert!(!is_config_error(&anyhow::anyhow!("network down")));
    }
}
