use crate::errors::ConfigError;
use crate::model::DEFAULT_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub mod paths;

pub use paths::DataPaths;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaglabConfig {
    #[serde(default = "default_version", rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_model")]
    pub baseline_model: String,
    #[serde(default = "default_model")]
    pub finetune_base_model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Pause after each provider call, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Seed for blind side assignment; unseeded runs use OS entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub finetune: FineTuneSettings,
    #[serde(default)]
    pub files: FileNames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuneSettings {
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_file_poll_ms")]
    pub file_poll_ms: u64,
    #[serde(default = "default_job_poll_ms")]
    pub job_poll_ms: u64,
    #[serde(default = "default_file_timeout_secs")]
    pub file_timeout_secs: u64,
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl FineTuneSettings {
    pub fn file_poll(&self) -> Duration {
        Duration::from_millis(self.file_poll_ms)
    }

    pub fn job_poll(&self) -> Duration {
        Duration::from_millis(self.job_poll_ms)
    }

    /// Zero disables the timeout.
    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_secs > 0).then(|| Duration::from_secs(self.file_timeout_secs))
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs))
    }
}

impl Default for FineTuneSettings {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            suffix: default_suffix(),
            file_poll_ms: default_file_poll_ms(),
            job_poll_ms: default_job_poll_ms(),
            file_timeout_secs: default_file_timeout_secs(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

/// File names of each table, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub briefs: String,
    pub baseline: String,
    pub rankings: String,
    pub fine_tune: String,
    pub job_id: String,
    pub job_record: String,
    pub model_id: String,
    pub evaluation: String,
    pub blind_form: String,
    pub results: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            briefs: "briefs.json".into(),
            baseline: "baseline.csv".into(),
            rankings: "rankings.csv".into(),
            fine_tune: "fine_tune.jsonl".into(),
            job_id: "job_id.txt".into(),
            job_record: "finetune_job.json".into(),
            model_id: "model_id.txt".into(),
            evaluation: "evaluation.csv".into(),
            blind_form: "blind_evaluation_form.csv".into(),
            results: "evaluation_results.csv".into(),
        }
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}
fn default_data_dir() -> String {
    "data".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo-0125".into()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_temperature() -> f32 {
    0.9
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_epochs() -> u32 {
    3
}
fn default_suffix() -> String {
    "ecd-eye".into()
}
fn default_file_poll_ms() -> u64 {
    1000
}
fn default_job_poll_ms() -> u64 {
    10_000
}
fn default_file_timeout_secs() -> u64 {
    600
}
fn default_job_timeout_secs() -> u64 {
    7200
}

impl Default for TaglabConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            baseline_model: default_model(),
            finetune_base_model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            request_delay_ms: default_request_delay_ms(),
            seed: None,
            finetune: FineTuneSettings::default(),
            files: FileNames::default(),
        }
    }
}

impl TaglabConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Resolves table paths. A relative `data_dir` is taken relative to the
    /// directory holding the config file.
    pub fn paths(&self, config_path: &Path) -> DataPaths {
        DataPaths::resolve(config_path, &self.data_dir, &self.files)
    }
}

/// Loads `path`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path, strict: bool) -> Result<TaglabConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(config = %path.display(), "config file not found, using defaults");
        return Ok(TaglabConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict).map_err(|ConfigError(msg)| {
        ConfigError(format!("{} (file: {})", msg, path.display()))
    })
}

pub fn parse_config(raw: &str, strict: bool) -> Result<TaglabConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(TaglabConfig::default());
    }

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    // serde_ignored wrapper to capture unknown fields
    let cfg: TaglabConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "unknown fields detected in strict mode: {:?}",
                meaningful_unknowns
            )));
        }
        tracing::warn!(
            event = "taglab.config.unknown_fields",
            fields = ?meaningful_unknowns,
            "ignored unknown config fields"
        );
    }

    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if !(0.0..=2.0).contains(&cfg.temperature) {
        return Err(ConfigError(format!(
            "temperature must be within 0.0..=2.0, got {}",
            cfg.temperature
        )));
    }
    if cfg.finetune.epochs == 0 {
        return Err(ConfigError("finetune.epochs must be at least 1".into()));
    }

    Ok(cfg)
}

pub const SAMPLE_CONFIG: &str = r#"version: 1
data_dir: data
baseline_model: gpt-3.5-turbo-0125
finetune_base_model: gpt-3.5-turbo-0125
system_prompt: "You are a punchy award-winning copywriter."
temperature: 0.9
request_delay_ms: 1000
finetune:
  epochs: 3
  suffix: ecd-eye
  file_poll_ms: 1000
  job_poll_ms: 10000
  file_timeout_secs: 600
  job_timeout_secs: 7200
"#;

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write config {}: {}", path.display(), e)))
}
