//! Rating session for ranking the five baseline candidates of each brief.

use crate::errors::{InvalidRanking, RankingValidationError};
use crate::model::{Brief, CandidateRow, RankingRow, CANDIDATES_PER_BRIEF};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    pub brief_id: i64,
    pub brief: String,
    pub taglines: [String; CANDIDATES_PER_BRIEF],
    /// `ranks[i]` is the rank of slot `i + 1`.
    pub ranks: [u8; CANDIDATES_PER_BRIEF],
}

/// Session state for one rater, keyed by brief id. Nothing is persisted until
/// [`RankingSession::submit`] succeeds.
#[derive(Debug, Clone)]
pub struct RankingSession {
    entries: Vec<RankingEntry>,
    index: HashMap<i64, usize>,
}

fn identity_ranks() -> [u8; CANDIDATES_PER_BRIEF] {
    std::array::from_fn(|i| (i + 1) as u8)
}

impl RankingSession {
    /// One entry per training brief, in brief order, with ranks defaulting to
    /// slot order. Every brief must have a baseline row.
    pub fn new(briefs: &[Brief], baseline: &[CandidateRow]) -> anyhow::Result<Self> {
        let by_id: HashMap<i64, &CandidateRow> =
            baseline.iter().map(|r| (r.brief_id, r)).collect();

        let missing: Vec<i64> = briefs
            .iter()
            .filter(|b| !by_id.contains_key(&b.id))
            .map(|b| b.id)
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "baseline table has no candidates for brief(s) {:?} (run `taglab generate` first)",
                missing
            );
        }

        let mut entries = Vec::with_capacity(briefs.len());
        let mut index = HashMap::with_capacity(briefs.len());
        for b in briefs {
            let row = by_id[&b.id];
            index.insert(b.id, entries.len());
            entries.push(RankingEntry {
                brief_id: b.id,
                brief: b.text.clone(),
                taglines: row.taglines.clone(),
                ranks: identity_ranks(),
            });
        }

        Ok(Self { entries, index })
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn get(&self, brief_id: i64) -> Option<&RankingEntry> {
        self.index.get(&brief_id).map(|&i| &self.entries[i])
    }

    pub fn ranks(&self, brief_id: i64) -> Option<[u8; CANDIDATES_PER_BRIEF]> {
        self.get(brief_id).map(|e| e.ranks)
    }

    fn entry_mut(&mut self, brief_id: i64) -> anyhow::Result<&mut RankingEntry> {
        let i = *self
            .index
            .get(&brief_id)
            .ok_or_else(|| anyhow::anyhow!("brief {} is not part of this session", brief_id))?;
        Ok(&mut self.entries[i])
    }

    /// Sets the rank of a 1-based slot. Duplicates are allowed here and
    /// rejected at submit time.
    pub fn set_rank(&mut self, brief_id: i64, slot: usize, rank: u8) -> anyhow::Result<()> {
        if !(1..=CANDIDATES_PER_BRIEF).contains(&slot) {
            anyhow::bail!("slot {} out of range 1..={}", slot, CANDIDATES_PER_BRIEF);
        }
        if !(1..=CANDIDATES_PER_BRIEF as u8).contains(&rank) {
            anyhow::bail!("rank {} out of range 1..={}", rank, CANDIDATES_PER_BRIEF);
        }
        self.entry_mut(brief_id)?.ranks[slot - 1] = rank;
        Ok(())
    }

    pub fn set_ranks(
        &mut self,
        brief_id: i64,
        ranks: [u8; CANDIDATES_PER_BRIEF],
    ) -> anyhow::Result<()> {
        for (i, r) in ranks.into_iter().enumerate() {
            self.set_rank(brief_id, i + 1, r)?;
        }
        Ok(())
    }

    /// Copies ranks from a table prepared elsewhere. Rows must belong to this
    /// session; values are checked only at submit time.
    pub fn import(&mut self, rows: &[RankingRow]) -> anyhow::Result<usize> {
        let unknown: Vec<i64> = rows
            .iter()
            .filter(|r| !self.index.contains_key(&r.brief_id))
            .map(|r| r.brief_id)
            .collect();
        if !unknown.is_empty() {
            anyhow::bail!("imported rankings reference unknown brief(s) {:?}", unknown);
        }
        for r in rows {
            self.entry_mut(r.brief_id)?.ranks = r.ranks;
        }
        Ok(rows.len())
    }

    /// All-or-nothing check that every brief holds a permutation of `1..=5`.
    pub fn validate(&self) -> Result<Vec<RankingRow>, RankingValidationError> {
        let rows: Vec<RankingRow> = self
            .entries
            .iter()
            .map(|e| RankingRow {
                brief_id: e.brief_id,
                brief: e.brief.clone(),
                ranks: e.ranks,
            })
            .collect();

        let invalid: Vec<InvalidRanking> = rows
            .iter()
            .filter(|r| !r.is_permutation())
            .map(|r| InvalidRanking {
                brief_id: r.brief_id,
                ranks: r.ranks.to_vec(),
            })
            .collect();

        if invalid.is_empty() {
            Ok(rows)
        } else {
            Err(RankingValidationError { invalid })
        }
    }

    /// Validates, then overwrites the rankings table. An invalid session
    /// leaves the file untouched.
    pub fn submit(&self, path: &Path) -> anyhow::Result<Vec<RankingRow>> {
        let rows = self.validate()?;
        crate::storage::save_rankings(path, &rows)?;
        tracing::info!(
            event = "taglab.rank.saved",
            rows = rows.len(),
            out = %path.display(),
            "rankings saved"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<Brief>, Vec<CandidateRow>) {
        let briefs = vec![
            Brief {
                id: 1,
                text: "Bottle".into(),
            },
            Brief {
                id: 2,
                text: "Bakery".into(),
            },
        ];
        let baseline = briefs
            .iter()
            .map(|b| CandidateRow {
                brief_id: b.id,
                brief: b.text.clone(),
                taglines: std::array::from_fn(|i| format!("{} #{}", b.text, i + 1)),
            })
            .collect();
        (briefs, baseline)
    }

    #[test]
    fn test_defaults_to_identity() {
        let (briefs, baseline) = fixture();
        let s = RankingSession::new(&briefs, &baseline).unwrap();
        assert_eq!(s.ranks(2), Some([1, 2, 3, 4, 5]));
        assert_eq!(s.ranks(7), None);
        assert_eq!(s.validate().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_baseline_row() {
        let (briefs, mut baseline) = fixture();
        baseline.pop();
        let err = RankingSession::new(&briefs, &baseline).unwrap_err();
        assert!(err.to_string().contains("[2]"));
    }

    #[test]
    fn test_rejects_out_of_range_input() {
        let (briefs, baseline) = fixture();
        let mut s = RankingSession::new(&briefs, &baseline).unwrap();
        assert!(s.set_rank(1, 0, 1).is_err());
        assert!(s.set_rank(1, 1, 6).is_err());
        assert!(s.set_rank(99, 1, 1).is_err());
    }

    #[test]
    fn test_tie_blocks_submit_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rankings.csv");
        let (briefs, baseline) = fixture();

        let mut s = RankingSession::new(&briefs, &baseline).unwrap();
        s.set_ranks(1, [3, 1, 4, 2, 5]).unwrap();
        s.submit(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        s.set_ranks(2, [1, 2, 2, 4, 5]).unwrap();
        let err = s.submit(&path).unwrap_err();
        let verr = err.downcast_ref::<RankingValidationError>().unwrap();
        assert_eq!(verr.brief_ids(), vec![2]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_import_unknown_brief() {
        let (briefs, baseline) = fixture();
        let mut s = RankingSession::new(&briefs, &baseline).unwrap();
        let rows = vec![RankingRow {
            brief_id: 42,
            brief: "x".into(),
            ranks: [1, 2, 3, 4, 5],
        }];
        assert!(s.import(&rows).is_err());
    }
}
