use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of candidate taglines generated per training brief.
pub const CANDIDATES_PER_BRIEF: usize = 5;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a punchy award-winning copywriter.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub id: i64,
    #[serde(rename = "brief")]
    pub text: String,
}

/// The two partitions of `briefs.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefSet {
    #[serde(default)]
    pub training_briefs: Vec<Brief>,
    #[serde(default)]
    pub evaluation_briefs: Vec<Brief>,
}

/// One row of the baseline table: a training brief and its five candidates in
/// generation order (slot 1 first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub brief_id: i64,
    pub brief: String,
    pub taglines: [String; CANDIDATES_PER_BRIEF],
}

impl CandidateRow {
    /// Text for a 1-based slot.
    pub fn slot(&self, slot: usize) -> Option<&str> {
        slot.checked_sub(1)
            .and_then(|i| self.taglines.get(i))
            .map(String::as_str)
    }
}

/// `ranks[i]` is the rank given to candidate slot `i + 1`; rank 1 is best.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRow {
    pub brief_id: i64,
    pub brief: String,
    pub ranks: [u8; CANDIDATES_PER_BRIEF],
}

impl RankingRow {
    pub fn is_permutation(&self) -> bool {
        is_full_permutation(&self.ranks)
    }

    /// 1-based slot holding rank 1, when the ranks form a permutation.
    pub fn best_slot(&self) -> Option<usize> {
        if !self.is_permutation() {
            return None;
        }
        let mut slots: Vec<usize> = (0..CANDIDATES_PER_BRIEF).collect();
        slots.sort_by_key(|&i| self.ranks[i]);
        slots.first().map(|i| i + 1)
    }
}

/// True when `ranks` uses every value in `1..=5` exactly once.
pub fn is_full_permutation(ranks: &[u8]) -> bool {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted == (1..=CANDIDATES_PER_BRIEF as u8).collect::<Vec<_>>()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One line of the fine-tune JSONL file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuneExample {
    pub messages: Vec<ChatMessage>,
}

impl FineTuneExample {
    pub fn new(system_prompt: &str, user_prompt: String, target_completion: String) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt,
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: target_completion,
                },
            ],
        }
    }

    fn content_of(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.content_of(Role::System)
    }

    pub fn user_prompt(&self) -> Option<&str> {
        self.content_of(Role::User)
    }

    pub fn target_completion(&self) -> Option<&str> {
        self.content_of(Role::Assistant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "OPTION A" => Some(Side::A),
            "B" | "OPTION B" => Some(Side::B),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredModel {
    Baseline,
    Finetuned,
}

impl PreferredModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredModel::Baseline => "baseline",
            PreferredModel::Finetuned => "finetuned",
        }
    }
}

impl fmt::Display for PreferredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a blind choice against the stored side assignment.
pub fn resolve_preference(chosen: Side, is_a_baseline: bool) -> PreferredModel {
    match (chosen, is_a_baseline) {
        (Side::A, true) | (Side::B, false) => PreferredModel::Baseline,
        (Side::A, false) | (Side::B, true) => PreferredModel::Finetuned,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRecord {
    pub brief_id: i64,
    pub brief: String,
    pub baseline_tagline: String,
    pub finetuned_tagline: String,
    pub side_a: String,
    pub side_b: String,
    pub is_a_baseline: bool,
}

impl EvaluationRecord {
    pub fn assign(
        brief: &Brief,
        baseline_tagline: String,
        finetuned_tagline: String,
        is_a_baseline: bool,
    ) -> Self {
        let (side_a, side_b) = if is_a_baseline {
            (baseline_tagline.clone(), finetuned_tagline.clone())
        } else {
            (finetuned_tagline.clone(), baseline_tagline.clone())
        };
        Self {
            brief_id: brief.id,
            brief: brief.text.clone(),
            baseline_tagline,
            finetuned_tagline,
            side_a,
            side_b,
            is_a_baseline,
        }
    }

    pub fn text_for(&self, side: Side) -> &str {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    /// Recovers `(baseline, finetuned)` from the blind sides.
    pub fn unblind(&self) -> (&str, &str) {
        if self.is_a_baseline {
            (&self.side_a, &self.side_b)
        } else {
            (&self.side_b, &self.side_a)
        }
    }

    pub fn blind(&self) -> BlindFormRow {
        BlindFormRow {
            brief_id: self.brief_id,
            brief: self.brief.clone(),
            tagline_a: self.side_a.clone(),
            tagline_b: self.side_b.clone(),
            preferred_tagline: String::new(),
        }
    }
}

/// Rater-facing view of an evaluation record with model identity removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindFormRow {
    pub brief_id: i64,
    pub brief: String,
    pub tagline_a: String,
    pub tagline_b: String,
    #[serde(default)]
    pub preferred_tagline: String,
}

/// A resolved preference, persisted with the original texts for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRow {
    pub brief_id: i64,
    pub brief: String,
    pub baseline_tagline: String,
    pub finetuned_tagline: String,
    pub preferred_tagline: String,
    pub preferred_model: PreferredModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploading,
    ValidatingFiles,
    Queued,
    Processing,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Maps a provider status string; unknown in-flight values count as running.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "uploading" => JobStatus::Uploading,
            "validating_files" => JobStatus::ValidatingFiles,
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Uploading => "uploading",
            JobStatus::ValidatingFiles => "validating_files",
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a fine-tune job, rewritten to `finetune_job.json` on every
/// observed status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuneJob {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_tuned_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub training_file_sha256: String,
    pub base_model: String,
    pub suffix: String,
    pub epochs: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(is_a_baseline: bool) -> EvaluationRecord {
        let brief = Brief {
            id: 7,
            text: "Electric bike for commuters".into(),
        };
        EvaluationRecord::assign(&brief, "Base line".into(), "Tuned line".into(), is_a_baseline)
    }

    #[test]
    fn test_permutation_check() {
        assert!(is_full_permutation(&[3, 1, 4, 2, 5]));
        assert!(!is_full_permutation(&[1, 2, 2, 4, 5]));
        assert!(!is_full_permutation(&[0, 1, 2, 3, 4]));
        assert!(!is_full_permutation(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_best_slot() {
        let row = RankingRow {
            brief_id: 1,
            brief: "b".into(),
            ranks: [3, 1, 4, 2, 5],
        };
        assert_eq!(row.best_slot(), Some(2));

        let tied = RankingRow {
            ranks: [1, 1, 3, 4, 5],
            ..row
        };
        assert_eq!(tied.best_slot(), None);
    }

    #[test]
    fn test_sides_reconstruct_pair() {
        for flag in [true, false] {
            let r = record(flag);
            assert_eq!(r.unblind(), ("Base line", "Tuned line"));
            let mut sides = vec![r.side_a.clone(), r.side_b.clone()];
            sides.sort();
            assert_eq!(sides, vec!["Base line".to_string(), "Tuned line".to_string()]);
        }
    }

    #[test]
    fn test_resolution_table() {
        let choices = [Side::A, Side::B, Side::A, Side::A, Side::B];
        let flags = [true, false, true, false, true];
        let resolved: Vec<_> = choices
            .iter()
            .zip(flags)
            .map(|(c, f)| resolve_preference(*c, f))
            .collect();
        assert_eq!(
            resolved,
            vec![
                PreferredModel::Baseline,
                PreferredModel::Baseline,
                PreferredModel::Baseline,
                PreferredModel::Finetuned,
                PreferredModel::Finetuned,
            ]
        );
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::from_provider("succeeded").is_terminal());
        assert!(JobStatus::from_provider("cancelled").is_terminal());
        assert!(!JobStatus::from_provider("validating_files").is_terminal());
        assert_eq!(JobStatus::from_provider("something_new"), JobStatus::Running);
    }

    #[test]
    fn test_example_accessors() {
        let ex = FineTuneExample::new(DEFAULT_SYSTEM_PROMPT, "u".into(), "t".into());
        assert_eq!(ex.system_prompt(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(ex.user_prompt(), Some("u"));
        assert_eq!(ex.target_completion(), Some("t"));
        let line = serde_json::to_string(&ex).unwrap();
        assert!(line.contains(r#""role":"assistant""#));
    }
}
