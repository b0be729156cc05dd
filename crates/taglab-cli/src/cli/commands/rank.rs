use super::{exit_codes, Workspace};
use crate::cli::args::RankArgs;
use crate::cli::prompt::Prompter;
use std::io::Write;
use taglab_core::errors::RankingValidationError;
use taglab_core::model::{is_full_permutation, CANDIDATES_PER_BRIEF};
use taglab_core::ranking::RankingSession;
use tokio::io::AsyncBufRead;

pub async fn run(ws: Workspace, args: RankArgs) -> anyhow::Result<i32> {
    let briefs = taglab_core::storage::load_briefs(&ws.paths.briefs)?;
    if !ws.paths.baseline.exists() {
        anyhow::bail!(
            "baseline file not found at {} (run `taglab generate` first)",
            ws.paths.baseline.display()
        );
    }
    let baseline = taglab_core::storage::load_baseline(&ws.paths.baseline)?;
    let mut session = RankingSession::new(&briefs.training_briefs, &baseline)?;

    match &args.from {
        Some(path) => {
            let rows = taglab_core::storage::load_rankings(path)?;
            session.import(&rows)?;
            let uncovered: Vec<i64> = session
                .entries()
                .iter()
                .map(|e| e.brief_id)
                .filter(|id| !rows.iter().any(|r| r.brief_id == *id))
                .collect();
            if !uncovered.is_empty() {
                if !args.allow_partial {
                    eprintln!(
                        "✖ {} brief(s) {:?} not ranked in {}",
                        uncovered.len(),
                        uncovered,
                        path.display()
                    );
                    eprintln!("nothing saved; pass --allow-partial to keep slot order for them");
                    return Ok(exit_codes::FAILED);
                }
                tracing::warn!(
                    missing = ?uncovered,
                    "imported table does not cover every brief; the rest keep slot order"
                );
                eprintln!("brief(s) {:?} keep slot order", uncovered);
            }
        }
        None => {
            let mut prompter = Prompter::stdio();
            if !rank_interactively(&mut session, &mut prompter).await? {
                eprintln!("input ended before every brief was ranked; nothing saved");
                return Ok(exit_codes::FAILED);
            }
        }
    }

    match session.submit(&ws.paths.rankings) {
        Ok(rows) => {
            eprintln!("wrote {} ({} briefs)", ws.paths.rankings.display(), rows.len());
            Ok(exit_codes::OK)
        }
        Err(e) => match e.downcast_ref::<RankingValidationError>() {
            Some(invalid) => {
                eprintln!("✖ {}", invalid);
                eprintln!("nothing saved; {} unchanged", ws.paths.rankings.display());
                Ok(exit_codes::FAILED)
            }
            None => Err(e),
        },
    }
}

/// Accepts five ranks separated by spaces or commas.
pub fn parse_ranks(raw: &str) -> Result<[u8; CANDIDATES_PER_BRIEF], String> {
    let parts: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != CANDIDATES_PER_BRIEF {
        return Err(format!(
            "enter {} ranks, one per tagline (e.g. 3 1 4 2 5)",
            CANDIDATES_PER_BRIEF
        ));
    }
    let mut ranks = [0u8; CANDIDATES_PER_BRIEF];
    for (slot, part) in parts.iter().enumerate() {
        ranks[slot] = part
            .parse::<u8>()
            .ok()
            .filter(|r| (1..=CANDIDATES_PER_BRIEF as u8).contains(r))
            .ok_or_else(|| format!("{:?} is not a rank from 1 to {}", part, CANDIDATES_PER_BRIEF))?;
    }
    Ok(ranks)
}

fn format_ranks(ranks: &[u8]) -> String {
    ranks
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Walks every brief, then re-asks only the briefs that fail validation.
/// Returns `false` when input ends first.
pub async fn rank_interactively<R, W>(
    session: &mut RankingSession,
    p: &mut Prompter<R, W>,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut todo: Vec<i64> = session.entries().iter().map(|e| e.brief_id).collect();
    p.say("Rank the five taglines of each brief: 1 = best, 5 = worst. Enter keeps the shown ranks.")?;

    loop {
        let total = todo.len();
        for (i, brief_id) in todo.iter().enumerate() {
            let Some(entry) = session.get(*brief_id) else {
                continue;
            };
            let current = entry.ranks;
            p.say(&format!("\n[{}/{}] Brief {}: {}", i + 1, total, entry.brief_id, entry.brief))?;
            for (slot, text) in entry.taglines.iter().enumerate() {
                p.say(&format!("  {}. {}", slot + 1, text))?;
            }

            let question = format!("ranks [{}]: ", format_ranks(&current));
            let Some(ranks) = p.ask_until(&question, Some(current), parse_ranks).await? else {
                return Ok(false);
            };
            if !is_full_permutation(&ranks) {
                p.say("  ranks repeat; this brief must be fixed before saving")?;
            }
            session.set_ranks(*brief_id, ranks)?;
        }

        match session.validate() {
            Ok(_) => return Ok(true),
            Err(invalid) => {
                p.say(&format!("\n{}", invalid))?;
                todo = invalid.brief_ids();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taglab_core::model::{Brief, CandidateRow};

    fn session() -> RankingSession {
        let briefs: Vec<Brief> = (1..=2)
            .map(|id| Brief {
                id,
                text: format!("brief {}", id),
            })
            .collect();
        let baseline: Vec<CandidateRow> = briefs
            .iter()
            .map(|b| CandidateRow {
                brief_id: b.id,
                brief: b.text.clone(),
                taglines: std::array::from_fn(|i| format!("line {}", i + 1)),
            })
            .collect();
        RankingSession::new(&briefs, &baseline).unwrap()
    }

    #[test]
    fn test_parse_ranks() {
        assert_eq!(parse_ranks("3 1 4 2 5"), Ok([3, 1, 4, 2, 5]));
        assert_eq!(parse_ranks("3,1, 4,2,5"), Ok([3, 1, 4, 2, 5]));
        assert!(parse_ranks("1 2 3 4").is_err());
        assert!(parse_ranks("1 2 3 4 6").is_err());
        // ties are caught at validation, not here
        assert_eq!(parse_ranks("1 2 2 4 5"), Ok([1, 2, 2, 4, 5]));
    }

    #[tokio::test]
    async fn test_default_and_explicit_answers() {
        let mut s = session();
        let mut p = Prompter::new(&b"3 1 4 2 5\n\n"[..], Vec::new());
        assert!(rank_interactively(&mut s, &mut p).await.unwrap());
        assert_eq!(s.get(1).unwrap().ranks, [3, 1, 4, 2, 5]);
        assert_eq!(s.get(2).unwrap().ranks, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_tie_is_asked_again() {
        let mut s = session();
        let mut p = Prompter::new(&b"1 1 3 4 5\n\n5 4 3 2 1\n"[..], Vec::new());
        assert!(rank_interactively(&mut s, &mut p).await.unwrap());
        assert_eq!(s.get(1).unwrap().ranks, [5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_eof_reports_incomplete() {
        let mut s = session();
        let mut p = Prompter::new(&b"3 1 4 2 5\n"[..], Vec::new());
        assert!(!rank_interactively(&mut s, &mut p).await.unwrap());
    }
}
