use super::{read_csv, write_csv};
use crate::model::{BlindFormRow, CandidateRow, EvaluationRecord, JudgmentRow, RankingRow};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const BASELINE_HEADERS: [&str; 7] = [
    "brief_id",
    "brief",
    "tagline_1",
    "tagline_2",
    "tagline_3",
    "tagline_4",
    "tagline_5",
];

pub const RANKING_HEADERS: [&str; 7] = [
    "brief_id", "brief", "rank_1", "rank_2", "rank_3", "rank_4", "rank_5",
];

pub const EVALUATION_HEADERS: [&str; 7] = [
    "brief_id",
    "brief",
    "baseline_tagline",
    "finetuned_tagline",
    "side_a",
    "side_b",
    "is_a_baseline",
];

pub const BLIND_FORM_HEADERS: [&str; 5] = [
    "brief_id",
    "brief",
    "tagline_a",
    "tagline_b",
    "preferred_tagline",
];

pub const RESULTS_HEADERS: [&str; 6] = [
    "brief_id",
    "brief",
    "baseline_tagline",
    "finetuned_tagline",
    "preferred_tagline",
    "preferred_model",
];

#[derive(Serialize, Deserialize)]
struct BaselineRecord {
    brief_id: i64,
    brief: String,
    #[serde(default)]
    tagline_1: String,
    #[serde(default)]
    tagline_2: String,
    #[serde(default)]
    tagline_3: String,
    #[serde(default)]
    tagline_4: String,
    #[serde(default)]
    tagline_5: String,
}

impl From<&CandidateRow> for BaselineRecord {
    fn from(r: &CandidateRow) -> Self {
        let [t1, t2, t3, t4, t5] = r.taglines.clone();
        Self {
            brief_id: r.brief_id,
            brief: r.brief.clone(),
            tagline_1: t1,
            tagline_2: t2,
            tagline_3: t3,
            tagline_4: t4,
            tagline_5: t5,
        }
    }
}

impl From<BaselineRecord> for CandidateRow {
    fn from(r: BaselineRecord) -> Self {
        Self {
            brief_id: r.brief_id,
            brief: r.brief,
            taglines: [r.tagline_1, r.tagline_2, r.tagline_3, r.tagline_4, r.tagline_5],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RankingRecord {
    brief_id: i64,
    brief: String,
    rank_1: u8,
    rank_2: u8,
    rank_3: u8,
    rank_4: u8,
    rank_5: u8,
}

impl From<&RankingRow> for RankingRecord {
    fn from(r: &RankingRow) -> Self {
        let [r1, r2, r3, r4, r5] = r.ranks;
        Self {
            brief_id: r.brief_id,
            brief: r.brief.clone(),
            rank_1: r1,
            rank_2: r2,
            rank_3: r3,
            rank_4: r4,
            rank_5: r5,
        }
    }
}

impl From<RankingRecord> for RankingRow {
    fn from(r: RankingRecord) -> Self {
        Self {
            brief_id: r.brief_id,
            brief: r.brief,
            ranks: [r.rank_1, r.rank_2, r.rank_3, r.rank_4, r.rank_5],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct EvaluationCsv {
    brief_id: i64,
    brief: String,
    baseline_tagline: String,
    finetuned_tagline: String,
    #[serde(alias = "randomized_a")]
    side_a: String,
    #[serde(alias = "randomized_b")]
    side_b: String,
    #[serde(deserialize_with = "lenient_bool")]
    is_a_baseline: bool,
}

/// Accepts `true`/`false` in any case, plus `1`/`0`.
fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let s = String::deserialize(d)?;
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got '{}'",
            other
        ))),
    }
}

impl From<&EvaluationRecord> for EvaluationCsv {
    fn from(r: &EvaluationRecord) -> Self {
        Self {
            brief_id: r.brief_id,
            brief: r.brief.clone(),
            baseline_tagline: r.baseline_tagline.clone(),
            finetuned_tagline: r.finetuned_tagline.clone(),
            side_a: r.side_a.clone(),
            side_b: r.side_b.clone(),
            is_a_baseline: r.is_a_baseline,
        }
    }
}

impl From<EvaluationCsv> for EvaluationRecord {
    fn from(r: EvaluationCsv) -> Self {
        Self {
            brief_id: r.brief_id,
            brief: r.brief,
            baseline_tagline: r.baseline_tagline,
            finetuned_tagline: r.finetuned_tagline,
            side_a: r.side_a,
            side_b: r.side_b,
            is_a_baseline: r.is_a_baseline,
        }
    }
}

pub fn save_baseline(path: &Path, rows: &[CandidateRow]) -> anyhow::Result<()> {
    let records: Vec<BaselineRecord> = rows.iter().map(BaselineRecord::from).collect();
    write_csv(path, &BASELINE_HEADERS, &records)
}

pub fn load_baseline(path: &Path) -> anyhow::Result<Vec<CandidateRow>> {
    Ok(read_csv::<BaselineRecord>(path)?
        .into_iter()
        .map(CandidateRow::from)
        .collect())
}

pub fn save_rankings(path: &Path, rows: &[RankingRow]) -> anyhow::Result<()> {
    let records: Vec<RankingRecord> = rows.iter().map(RankingRecord::from).collect();
    write_csv(path, &RANKING_HEADERS, &records)
}

pub fn load_rankings(path: &Path) -> anyhow::Result<Vec<RankingRow>> {
    Ok(read_csv::<RankingRecord>(path)?
        .into_iter()
        .map(RankingRow::from)
        .collect())
}

pub fn save_evaluation(path: &Path, rows: &[EvaluationRecord]) -> anyhow::Result<()> {
    let records: Vec<EvaluationCsv> = rows.iter().map(EvaluationCsv::from).collect();
    write_csv(path, &EVALUATION_HEADERS, &records)
}

pub fn load_evaluation(path: &Path) -> anyhow::Result<Vec<EvaluationRecord>> {
    Ok(read_csv::<EvaluationCsv>(path)?
        .into_iter()
        .map(EvaluationRecord::from)
        .collect())
}

pub fn save_blind_form(path: &Path, rows: &[BlindFormRow]) -> anyhow::Result<()> {
    write_csv(path, &BLIND_FORM_HEADERS, rows)
}

pub fn load_blind_form(path: &Path) -> anyhow::Result<Vec<BlindFormRow>> {
    read_csv(path)
}

pub fn save_results(path: &Path, rows: &[JudgmentRow]) -> anyhow::Result<()> {
    write_csv(path, &RESULTS_HEADERS, rows)
}

pub fn load_results(path: &Path) -> anyhow::Result<Vec<JudgmentRow>> {
    read_csv(path)
}
