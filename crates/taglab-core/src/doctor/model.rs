use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub schema_version: u32,   // 1
    pub generated_at: String,  // rfc3339
    pub taglab_version: String,
    pub platform: PlatformInfo,

    pub config: ConfigSummary,
    pub stages: Vec<StageCheck>,
    pub next_action: SuggestedAction,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub config_path: String,
    pub config_found: bool,
    pub data_dir: String,
    pub baseline_model: String,
    pub finetune_base_model: String,
    pub api_key_set: bool,
}

/// One pipeline file and what could be read from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCheck {
    pub stage: String,
    pub path: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub command: String,
}
