//! Held-out evaluation: one tagline per model per brief, randomized sides.

use crate::config::DataPaths;
use crate::errors::PreconditionError;
use crate::generate::{single_tagline_prompt, PromptSettings};
use crate::model::{BlindFormRow, Brief, EvaluationRecord};
use crate::pacing::Pacer;
use crate::providers::llm::LlmClient;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the per-brief side assignment. `true` puts the baseline on side A.
pub trait CoinFlip {
    fn flip(&mut self) -> bool;
}

/// Fair coin backed by a seedable RNG.
pub struct RngCoin {
    rng: StdRng,
}

impl RngCoin {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_os_rng)
    }
}

impl CoinFlip for RngCoin {
    fn flip(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }
}

/// Replays a fixed sequence, cycling when it runs out. An empty sequence
/// always answers `true`.
#[derive(Debug, Clone)]
pub struct ScriptedCoin {
    flips: Vec<bool>,
    next: usize,
}

impl ScriptedCoin {
    pub fn new(flips: impl IntoIterator<Item = bool>) -> Self {
        Self {
            flips: flips.into_iter().collect(),
            next: 0,
        }
    }
}

impl CoinFlip for ScriptedCoin {
    fn flip(&mut self) -> bool {
        if self.flips.is_empty() {
            return true;
        }
        let v = self.flips[self.next % self.flips.len()];
        self.next += 1;
        v
    }
}

/// Reads the fine-tuned model id, failing before any provider call when the
/// submitter has not produced one.
pub fn load_finetuned_model(paths: &DataPaths) -> anyhow::Result<String> {
    crate::storage::text::read_single_line(&paths.model_id)?
        .ok_or_else(|| PreconditionError::MissingModelId(paths.model_id.clone()).into())
}

pub struct Evaluator<'a> {
    pub client: &'a dyn LlmClient,
    /// Baseline model settings; the fine-tuned call swaps only the model.
    pub prompt: PromptSettings,
    pub finetuned_model: String,
    pub pacer: Pacer,
}

impl Evaluator<'_> {
    pub async fn run(&self, briefs: &[Brief], coin: &mut dyn CoinFlip) -> Vec<EvaluationRecord> {
        let tuned = self.prompt.with_model(&self.finetuned_model);
        let mut records = Vec::with_capacity(briefs.len());

        for (i, brief) in briefs.iter().enumerate() {
            tracing::info!(
                brief_id = brief.id,
                progress = %format!("{}/{}", i + 1, briefs.len()),
                "evaluating brief"
            );
            let baseline = self.one(&self.prompt, brief, "baseline").await;
            self.pacer.pause().await;
            let finetuned = self.one(&tuned, brief, "finetuned").await;
            self.pacer.pause().await;

            records.push(EvaluationRecord::assign(brief, baseline, finetuned, coin.flip()));
        }
        records
    }

    async fn one(&self, settings: &PromptSettings, brief: &Brief, label: &str) -> String {
        let request = settings.request(single_tagline_prompt(&brief.text));
        match self.client.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    event = "taglab.evaluate.fallback",
                    brief_id = brief.id,
                    model = label,
                    error = %e,
                    "generation failed, using empty tagline"
                );
                String::new()
            }
        }
    }
}

pub fn derive_blind_form(records: &[EvaluationRecord]) -> Vec<BlindFormRow> {
    records.iter().map(EvaluationRecord::blind).collect()
}

/// Runs the evaluator over the evaluation briefs and rewrites both the
/// evaluation table and the blind form.
pub async fn evaluate_models(
    evaluator: &Evaluator<'_>,
    paths: &DataPaths,
    coin: &mut dyn CoinFlip,
) -> anyhow::Result<Vec<EvaluationRecord>> {
    let briefs = crate::storage::load_briefs(&paths.briefs)?;
    if briefs.evaluation_briefs.is_empty() {
        tracing::warn!(briefs = %paths.briefs.display(), "no evaluation briefs found");
    }

    let records = evaluator.run(&briefs.evaluation_briefs, coin).await;
    crate::storage::save_evaluation(&paths.evaluation, &records)?;
    crate::storage::save_blind_form(&paths.blind_form, &derive_blind_form(&records))?;
    tracing::info!(
        event = "taglab.evaluate.done",
        rows = records.len(),
        out = %paths.evaluation.display(),
        form = %paths.blind_form.display(),
        "evaluation tables written"
    );
    Ok(records)
}
