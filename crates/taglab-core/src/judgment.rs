//! Blind preference session over the evaluation table.

use crate::model::{resolve_preference, BlindFormRow, EvaluationRecord, JudgmentRow, Side};
use std::collections::HashMap;
use std::path::Path;

/// One rater's choices, keyed by brief id. The evaluation records stay
/// inside the session; callers only see the blind rows.
#[derive(Debug, Clone)]
pub struct JudgmentSession {
    records: Vec<EvaluationRecord>,
    index: HashMap<i64, usize>,
    choices: HashMap<i64, Side>,
}

impl JudgmentSession {
    pub fn new(records: Vec<EvaluationRecord>) -> anyhow::Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            if index.insert(r.brief_id, i).is_some() {
                anyhow::bail!("evaluation table lists brief {} more than once", r.brief_id);
            }
        }
        Ok(Self {
            records,
            index,
            choices: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn blind_rows(&self) -> Vec<BlindFormRow> {
        self.records
            .iter()
            .map(|r| {
                let mut row = r.blind();
                if let Some(side) = self.choices.get(&r.brief_id) {
                    row.preferred_tagline = r.text_for(*side).to_string();
                }
                row
            })
            .collect()
    }

    fn record(&self, brief_id: i64) -> anyhow::Result<&EvaluationRecord> {
        self.index
            .get(&brief_id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| anyhow::anyhow!("brief {} is not part of this evaluation", brief_id))
    }

    pub fn choose(&mut self, brief_id: i64, side: Side) -> anyhow::Result<()> {
        self.record(brief_id)?;
        self.choices.insert(brief_id, side);
        Ok(())
    }

    pub fn choice(&self, brief_id: i64) -> Option<Side> {
        self.choices.get(&brief_id).copied()
    }

    /// Brief ids still waiting for a choice, in table order.
    pub fn pending(&self) -> Vec<i64> {
        self.records
            .iter()
            .map(|r| r.brief_id)
            .filter(|id| !self.choices.contains_key(id))
            .collect()
    }

    /// Applies a filled blind form. `preferred_tagline` may hold `A`, `B`, or
    /// the exact text of one side; blank rows stay pending. Returns how many
    /// rows carried a choice.
    pub fn apply_form(&mut self, rows: &[BlindFormRow]) -> anyhow::Result<usize> {
        let mut applied = 0;
        for row in rows {
            let record = self.record(row.brief_id)?;
            if row.tagline_a != record.side_a || row.tagline_b != record.side_b {
                anyhow::bail!(
                    "form row for brief {} does not match the evaluation table (stale form?)",
                    row.brief_id
                );
            }
            let Some(side) = read_choice(&row.preferred_tagline, record)? else {
                continue;
            };
            self.choices.insert(row.brief_id, side);
            applied += 1;
        }
        Ok(applied)
    }

    /// Unblinds every choice. Fails while any brief is still pending.
    pub fn resolve(&self) -> anyhow::Result<Vec<JudgmentRow>> {
        let pending = self.pending();
        if !pending.is_empty() {
            anyhow::bail!("no preference recorded for brief(s) {:?}", pending);
        }

        Ok(self
            .records
            .iter()
            .filter_map(|r| {
                let side = *self.choices.get(&r.brief_id)?;
                Some(JudgmentRow {
                    brief_id: r.brief_id,
                    brief: r.brief.clone(),
                    baseline_tagline: r.baseline_tagline.clone(),
                    finetuned_tagline: r.finetuned_tagline.clone(),
                    preferred_tagline: r.text_for(side).to_string(),
                    preferred_model: resolve_preference(side, r.is_a_baseline),
                })
            })
            .collect())
    }

    pub fn submit(&self, path: &Path) -> anyhow::Result<Vec<JudgmentRow>> {
        let rows = self.resolve()?;
        crate::storage::save_results(path, &rows)?;
        tracing::info!(
            event = "taglab.judge.saved",
            rows = rows.len(),
            out = %path.display(),
            "judgments saved"
        );
        Ok(rows)
    }
}

fn read_choice(raw: &str, record: &EvaluationRecord) -> anyhow::Result<Option<Side>> {
    let v = raw.trim();
    if v.is_empty() {
        return Ok(None);
    }
    if let Some(side) = Side::parse(v) {
        return Ok(Some(side));
    }
    if v == record.side_a.trim() {
        return Ok(Some(Side::A));
    }
    if v == record.side_b.trim() {
        return Ok(Some(Side::B));
    }
    anyhow::bail!(
        "brief {}: preferred_tagline {:?} is neither A, B nor one of the two taglines",
        record.brief_id,
        v
    )
}
