use super::{exit_codes, require_api, Workspace};
use crate::cli::args::GenerateArgs;
use taglab_core::generate::{generate_baseline, BaselineGenerator};
use taglab_core::providers::llm::openai::OpenAIClient;

pub async fn run(ws: Workspace, args: GenerateArgs) -> anyhow::Result<i32> {
    let (key, base_url) = require_api(&args.api)?;
    ws.paths.ensure_data_dir()?;

    let client = OpenAIClient::with_base_url(key, &base_url);
    let generator = BaselineGenerator {
        client: &client,
        prompt: ws.prompt(args.model.as_deref()),
        pacer: ws.pacer(args.delay_ms),
    };

    let summary = generate_baseline(&generator, &ws.paths).await?;
    eprintln!(
        "wrote {} ({} briefs, {} failed, {} padded, {} truncated)",
        ws.paths.baseline.display(),
        summary.briefs,
        summary.failed.len(),
        summary.padded.len(),
        summary.truncated.len()
    );
    if !summary.failed.is_empty() {
        eprintln!(
            "note: brief(s) {:?} got empty candidates; rerun `taglab generate` to retry",
            summary.failed
        );
    }
    Ok(exit_codes::OK)
}
