use super::args::*;
use std::path::Path;
use std::time::Duration;
use taglab_core::config::{load_config, DataPaths, TaglabConfig};
use taglab_core::errors::PreconditionError;
use taglab_core::generate::PromptSettings;
use taglab_core::pacing::Pacer;
use taglab_core::providers::DEFAULT_OPENAI_BASE_URL;

pub mod doctor;
pub mod evaluate;
pub mod generate;
pub mod init;
pub mod judge;
pub mod prepare;
pub mod rank;
pub mod report;
pub mod submit;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let ctx = || Workspace::load(&cli.config, cli.strict);
    match cli.cmd {
        Command::Init(args) => init::run(&cli.config, args),
        Command::Generate(args) => generate::run(ctx()?, args).await,
        Command::Rank(args) => rank::run(ctx()?, args).await,
        Command::Prepare => prepare::run(ctx()?),
        Command::Submit(args) => submit::run(ctx()?, args).await,
        Command::Evaluate(args) => evaluate::run(ctx()?, args).await,
        Command::Judge(args) => judge::run(ctx()?, args).await,
        Command::Report(args) => report::run(ctx()?, args),
        Command::Doctor(args) => doctor::run(ctx()?, &cli.config, args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Loaded config plus the resolved table paths.
pub struct Workspace {
    pub cfg: TaglabConfig,
    pub paths: DataPaths,
}

impl Workspace {
    pub fn load(config_path: &Path, strict: bool) -> anyhow::Result<Self> {
        let cfg = load_config(config_path, strict)?;
        let paths = cfg.paths(config_path);
        tracing::debug!(
            config = %config_path.display(),
            data_dir = %paths.data_dir.display(),
            "workspace loaded"
        );
        Ok(Self { cfg, paths })
    }

    pub fn prompt(&self, model_override: Option<&str>) -> PromptSettings {
        PromptSettings {
            model: model_override
                .unwrap_or(self.cfg.baseline_model.as_str())
                .to_string(),
            system_prompt: self.cfg.system_prompt.clone(),
            temperature: self.cfg.temperature,
        }
    }

    pub fn pacer(&self, delay_ms: Option<u64>) -> Pacer {
        Pacer::new(delay_ms.map_or_else(|| self.cfg.request_delay(), Duration::from_millis))
    }
}

/// Returns the API key and base URL, failing before any file is touched.
pub fn require_api(api: &ApiArgs) -> anyhow::Result<(String, String)> {
    let key = api
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(PreconditionError::MissingApiKey)?;
    let base = api
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
    Ok((key.to_string(), base))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
