use super::{exit_codes, require_api, Workspace};
use crate::cli::args::EvaluateArgs;
use taglab_core::evaluate::{evaluate_models, load_finetuned_model, Evaluator, RngCoin};
use taglab_core::providers::llm::openai::OpenAIClient;

pub async fn run(ws: Workspace, args: EvaluateArgs) -> anyhow::Result<i32> {
    // both preconditions are checked before the first API call
    let (key, base_url) = require_api(&args.api)?;
    let finetuned_model = load_finetuned_model(&ws.paths)?;

    let client = OpenAIClient::with_base_url(key, &base_url);
    let evaluator = Evaluator {
        client: &client,
        prompt: ws.prompt(args.model.as_deref()),
        finetuned_model,
        pacer: ws.pacer(args.delay_ms),
    };
    let mut coin = RngCoin::new(args.seed.or(ws.cfg.seed));

    let records = evaluate_models(&evaluator, &ws.paths, &mut coin).await?;
    if records.is_empty() {
        eprintln!("no evaluation briefs in {}", ws.paths.briefs.display());
        return Ok(exit_codes::FAILED);
    }

    let empty = records
        .iter()
        .filter(|r| r.baseline_tagline.is_empty() || r.finetuned_tagline.is_empty())
        .count();
    eprintln!("wrote {} ({} briefs)", ws.paths.evaluation.display(), records.len());
    eprintln!("wrote {}", ws.paths.blind_form.display());
    if empty > 0 {
        eprintln!("note: {} brief(s) have an empty tagline after a failed call", empty);
    }
    eprintln!("next: `taglab judge` (or fill the blind form and run `taglab judge --form <file>`)");
    Ok(exit_codes::OK)
}
