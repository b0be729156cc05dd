use crate::model::BriefSet;
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

/// Loads `briefs.json` and checks that ids are unique across both partitions.
pub fn load_briefs(path: &Path) -> anyhow::Result<BriefSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read briefs file {}", path.display()))?;
    let set: BriefSet = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse briefs JSON {}", path.display()))?;
    check_unique_ids(&set).with_context(|| format!("invalid briefs file {}", path.display()))?;
    Ok(set)
}

pub fn check_unique_ids(set: &BriefSet) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for b in set.training_briefs.iter().chain(&set.evaluation_briefs) {
        if !seen.insert(b.id) {
            dupes.push(b.id);
        }
    }
    if !dupes.is_empty() {
        dupes.sort_unstable();
        dupes.dedup();
        anyhow::bail!("duplicate brief ids: {:?}", dupes);
    }
    Ok(())
}

pub const SAMPLE_BRIEFS: &str = r#"{
  "training_briefs": [
    { "id": 1, "brief": "A reusable water bottle that keeps drinks cold for 24 hours." },
    { "id": 2, "brief": "A neighbourhood bakery launching a sourdough subscription." },
    { "id": 3, "brief": "An electric bike built for hilly city commutes." }
  ],
  "evaluation_briefs": [
    { "id": 101, "brief": "A budgeting app for freelancers with irregular income." },
    { "id": 102, "brief": "A dog-walking service that sends GPS walk reports." }
  ]
}
"#;
