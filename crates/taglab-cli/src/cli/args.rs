use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taglab",
    version,
    about = "Baseline vs fine-tuned tagline experiment: generate, rank, fine-tune, judge"
)]
pub struct Cli {
    /// Path to taglab.yaml; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "taglab.yaml", env = "TAGLAB_CONFIG")]
    pub config: PathBuf,

    /// Treat unknown config keys as errors
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample taglab.yaml and briefs file
    Init(InitArgs),
    /// Generate five baseline candidates per training brief
    Generate(GenerateArgs),
    /// Rank the baseline candidates (terminal or --from CSV)
    Rank(RankArgs),
    /// Build the fine-tuning JSONL from rankings
    Prepare,
    /// Upload the training file and run the fine-tuning job
    Submit(SubmitArgs),
    /// Generate one tagline per model for each evaluation brief
    Evaluate(EvaluateArgs),
    /// Record blind preferences (terminal or --form CSV)
    Judge(JudgeArgs),
    /// Preference tallies and binomial significance test
    Report(ReportArgs),
    /// Inspect the data directory and suggest the next step
    Doctor(DoctorArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ApiArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    /// Also write a .gitignore for generated tables
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(long, env = "TAGLAB_BASELINE_MODEL")]
    pub model: Option<String>,

    /// Pause after each API call, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RankArgs {
    /// Import a ranking table (brief_id, brief, rank_1..rank_5) instead of prompting
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Save an imported table that leaves some briefs out; those keep slot order
    #[arg(long, requires = "from")]
    pub allow_partial: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Keep polling the job recorded in job_id.txt instead of starting a new one
    #[arg(long)]
    pub resume: bool,

    #[arg(long, env = "TAGLAB_FINETUNE_MODEL")]
    pub base_model: Option<String>,

    #[arg(long, env = "TAGLAB_FINETUNE_EPOCHS")]
    pub epochs: Option<u32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(long, env = "TAGLAB_BASELINE_MODEL")]
    pub model: Option<String>,

    /// Seed for the side assignment (overrides `seed` in the config)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub delay_ms: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct JudgeArgs {
    /// Import a filled blind form (preferred_tagline = A, B or the tagline text)
    #[arg(long)]
    pub form: Option<PathBuf>,

    /// Output format for the summary: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DoctorArgs {
    /// text | json
    #[arg(long, default_value = "text")]
    pub format: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}
