//! Baseline candidate generation: five taglines per training brief.

use crate::config::DataPaths;
use crate::model::{Brief, CandidateRow, CANDIDATES_PER_BRIEF};
use crate::pacing::Pacer;
use crate::providers::llm::{ChatRequest, LlmClient};

/// Prompt settings shared by generation, fine-tune data and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
}

impl PromptSettings {
    pub fn request(&self, user_prompt: String) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            user_prompt,
            temperature: self.temperature,
        }
    }

    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

pub fn candidates_prompt(brief: &str) -> String {
    format!("Write five punchy taglines (≤7 words) for: {}", brief)
}

pub fn single_tagline_prompt(brief: &str) -> String {
    format!("Write a punchy tagline (≤7 words) for: {}", brief)
}

/// How the raw line count compared to the required five.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFit {
    Exact,
    Padded { found: usize },
    Truncated { found: usize },
}

/// Splits a completion into exactly five candidates. Each line loses leading
/// and trailing `•` bullets and whitespace; empty lines are dropped. Short
/// lists are padded with empty strings, long ones cut to the first five.
pub fn parse_candidates(content: &str) -> ([String; CANDIDATES_PER_BRIEF], LineFit) {
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            line.trim_matches(|c: char| c == '•' || c == ' ')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect();

    let found = lines.len();
    let fit = match found.cmp(&CANDIDATES_PER_BRIEF) {
        std::cmp::Ordering::Equal => LineFit::Exact,
        std::cmp::Ordering::Less => LineFit::Padded { found },
        std::cmp::Ordering::Greater => LineFit::Truncated { found },
    };
    lines.resize(CANDIDATES_PER_BRIEF, String::new());

    let taglines: [String; CANDIDATES_PER_BRIEF] = std::array::from_fn(|i| lines[i].clone());
    (taglines, fit)
}

/// Counts from one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub briefs: usize,
    pub failed: Vec<i64>,
    pub padded: Vec<i64>,
    pub truncated: Vec<i64>,
}

pub struct BaselineGenerator<'a> {
    pub client: &'a dyn LlmClient,
    pub prompt: PromptSettings,
    pub pacer: Pacer,
}

impl BaselineGenerator<'_> {
    /// One request per brief, in order. A failed request yields five empty
    /// candidates and the run carries on.
    pub async fn run(&self, briefs: &[Brief]) -> (Vec<CandidateRow>, GenerateSummary) {
        let mut rows = Vec::with_capacity(briefs.len());
        let mut summary = GenerateSummary {
            briefs: briefs.len(),
            ..GenerateSummary::default()
        };

        for (i, brief) in briefs.iter().enumerate() {
            tracing::info!(
                brief_id = brief.id,
                progress = %format!("{}/{}", i + 1, briefs.len()),
                "generating candidates"
            );
            let taglines = self.generate_one(brief, &mut summary).await;
            rows.push(CandidateRow {
                brief_id: brief.id,
                brief: brief.text.clone(),
                taglines,
            });
            self.pacer.pause().await;
        }

        (rows, summary)
    }

    async fn generate_one(
        &self,
        brief: &Brief,
        summary: &mut GenerateSummary,
    ) -> [String; CANDIDATES_PER_BRIEF] {
        let request = self.prompt.request(candidates_prompt(&brief.text));
        let content = match self.client.complete(&request).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    event = "taglab.generate.fallback",
                    brief_id = brief.id,
                    error = %e,
                    "generation failed, using empty candidates"
                );
                summary.failed.push(brief.id);
                return Default::default();
            }
        };

        let (taglines, fit) = parse_candidates(&content);
        match fit {
            LineFit::Exact => {}
            LineFit::Padded { found } => {
                tracing::warn!(
                    brief_id = brief.id,
                    found,
                    "only {} taglines generated, padding to {}",
                    found,
                    CANDIDATES_PER_BRIEF
                );
                summary.padded.push(brief.id);
            }
            LineFit::Truncated { found } => {
                tracing::warn!(
                    brief_id = brief.id,
                    found,
                    "{} taglines generated, truncating to {}",
                    found,
                    CANDIDATES_PER_BRIEF
                );
                summary.truncated.push(brief.id);
            }
        }
        taglines
    }
}

/// Reads the training briefs, generates candidates and rewrites the baseline table.
pub async fn generate_baseline(
    generator: &BaselineGenerator<'_>,
    paths: &DataPaths,
) -> anyhow::Result<GenerateSummary> {
    let briefs = crate::storage::load_briefs(&paths.briefs)?;
    if briefs.training_briefs.is_empty() {
        tracing::warn!(briefs = %paths.briefs.display(), "no training briefs found");
    }

    let (rows, summary) = generator.run(&briefs.training_briefs).await;
    crate::storage::save_baseline(&paths.baseline, &rows)?;
    tracing::info!(
        event = "taglab.generate.done",
        rows = rows.len(),
        failed = summary.failed.len(),
        out = %paths.baseline.display(),
        "baseline table written"
    );
    Ok(summary)
}
