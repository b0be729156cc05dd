//! Builds the fine-tune training file from rankings and baseline candidates.

use crate::config::DataPaths;
use crate::generate::single_tagline_prompt;
use crate::model::{CandidateRow, FineTuneExample, RankingRow};
use std::collections::HashMap;

fn strip_wrapping_quotes(s: &str) -> &str {
    if !(s.starts_with('"') && s.ends_with('"')) {
        return s;
    }
    // a lone quote both starts and ends the string
    s.get(1..s.len() - 1).unwrap_or("")
}

/// Trims, strips one layer of wrapping double quotes, a leading `"1. "`, then
/// one more layer of wrapping quotes.
pub fn clean_tagline(raw: &str) -> String {
    let s = strip_wrapping_quotes(raw.trim());
    let s = s.strip_prefix("1. ").unwrap_or(s);
    strip_wrapping_quotes(s).to_string()
}

/// A ranking row that could not become a training example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub brief_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prepared {
    pub examples: Vec<FineTuneExample>,
    pub skipped: Vec<SkippedRow>,
}

/// Inner-joins rankings to candidates on brief id and emits one example per
/// ranking row, targeting the rank-1 candidate.
pub fn build_examples(
    rankings: &[RankingRow],
    baseline: &[CandidateRow],
    system_prompt: &str,
) -> Prepared {
    let by_id: HashMap<i64, &CandidateRow> = baseline.iter().map(|r| (r.brief_id, r)).collect();
    let mut out = Prepared::default();

    for ranking in rankings {
        let Some(candidates) = by_id.get(&ranking.brief_id) else {
            tracing::error!(brief_id = ranking.brief_id, "ranking has no baseline row, skipped");
            out.skipped.push(SkippedRow {
                brief_id: ranking.brief_id,
                reason: "no baseline row".into(),
            });
            continue;
        };

        let Some(best) = ranking.best_slot().and_then(|slot| candidates.slot(slot)) else {
            tracing::error!(
                brief_id = ranking.brief_id,
                ranks = ?ranking.ranks,
                "ranking is not a permutation of 1..=5, skipped"
            );
            out.skipped.push(SkippedRow {
                brief_id: ranking.brief_id,
                reason: format!("ranks {:?} are not a permutation of 1..=5", ranking.ranks),
            });
            continue;
        };

        out.examples.push(FineTuneExample::new(
            system_prompt,
            single_tagline_prompt(&ranking.brief),
            clean_tagline(best),
        ));
    }

    out
}

/// Reads rankings and baseline tables and rewrites the fine-tune JSONL file.
pub fn prepare_finetune(paths: &DataPaths, system_prompt: &str) -> anyhow::Result<Prepared> {
    if !paths.rankings.exists() {
        anyhow::bail!("rankings file not found at {}", paths.rankings.display());
    }
    if !paths.baseline.exists() {
        anyhow::bail!("baseline file not found at {}", paths.baseline.display());
    }
    let rankings = crate::storage::load_rankings(&paths.rankings)?;
    let baseline = crate::storage::load_baseline(&paths.baseline)?;

    let prepared = build_examples(&rankings, &baseline, system_prompt);
    crate::storage::jsonl::write_jsonl(&paths.fine_tune, &prepared.examples)?;
    tracing::info!(
        event = "taglab.prepare.done",
        examples = prepared.examples.len(),
        skipped = prepared.skipped.len(),
        out = %paths.fine_tune.display(),
        "fine-tuning data written"
    );
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_SYSTEM_PROMPT;

    #[test]
    fn test_clean_tagline_cases() {
        assert_eq!(clean_tagline("1. \"Drive bold.\""), "Drive bold.");
        assert_eq!(clean_tagline("\"1. Drive bold.\""), "Drive bold.");
        assert_eq!(clean_tagline("  \"Drive bold.\"  "), "Drive bold.");
        assert_eq!(clean_tagline("\"\"text\"\""), "text");
        assert_eq!(clean_tagline("2. Drive bold."), "2. Drive bold.");
        assert_eq!(clean_tagline("\""), "");
        assert_eq!(clean_tagline(""), "");
    }

    fn row(id: i64, texts: [&str; 5]) -> CandidateRow {
        CandidateRow {
            brief_id: id,
            brief: format!("brief {}", id),
            taglines: texts.map(String::from),
        }
    }

    #[test]
    fn test_targets_rank_one_slot() {
        let baseline = vec![
            row(1, ["a1", "a2", "a3", "a4", "a5"]),
            row(2, ["b1", "b2", "b3", "b4", "b5"]),
        ];
        let rankings = vec![
            RankingRow {
                brief_id: 1,
                brief: "brief 1".into(),
                ranks: [3, 1, 4, 2, 5],
            },
            RankingRow {
                brief_id: 2,
                brief: "brief 2".into(),
                ranks: [1, 2, 3, 4, 5],
            },
        ];
        let p = build_examples(&rankings, &baseline, DEFAULT_SYSTEM_PROMPT);
        assert!(p.skipped.is_empty());
        let targets: Vec<_> = p.examples.iter().map(|e| e.target_completion().unwrap()).collect();
        assert_eq!(targets, vec!["a2", "b1"]);
        assert_eq!(
            p.examples[0].user_prompt(),
            Some("Write a punchy tagline (≤7 words) for: brief 1")
        );
    }

    #[test]
    fn test_orphan_and_tied_rows_are_skipped() {
        let baseline = vec![row(1, ["a1", "a2", "a3", "a4", "a5"])];
        let rankings = vec![
            RankingRow {
                brief_id: 1,
                brief: "brief 1".into(),
                ranks: [2, 2, 3, 4, 5],
            },
            RankingRow {
                brief_id: 9,
                brief: "brief 9".into(),
                ranks: [1, 2, 3, 4, 5],
            },
        ];
        let p = build_examples(&rankings, &baseline, DEFAULT_SYSTEM_PROMPT);
        assert!(p.examples.is_empty());
        let ids: Vec<_> = p.skipped.iter().map(|s| s.brief_id).collect();
        assert_eq!(ids, vec![1, 9]);
    }
}
