use super::{exit_codes, report, Workspace};
use crate::cli::args::JudgeArgs;
use crate::cli::prompt::Prompter;
use std::io::Write;
use taglab_core::judgment::JudgmentSession;
use taglab_core::model::Side;
use taglab_metrics::{SignificanceReport, DEFAULT_ALPHA};
use tokio::io::AsyncBufRead;

pub async fn run(ws: Workspace, args: JudgeArgs) -> anyhow::Result<i32> {
    report::check_format(&args.format)?;
    if !ws.paths.evaluation.exists() {
        anyhow::bail!(
            "evaluation file not found at {} (run `taglab evaluate` first)",
            ws.paths.evaluation.display()
        );
    }
    let records = taglab_core::storage::load_evaluation(&ws.paths.evaluation)?;
    if records.is_empty() {
        eprintln!("nothing to judge: {} has no rows", ws.paths.evaluation.display());
        return Ok(exit_codes::FAILED);
    }
    let mut session = JudgmentSession::new(records)?;

    match &args.form {
        Some(path) => {
            let rows = taglab_core::storage::load_blind_form(path)?;
            let n = session.apply_form(&rows)?;
            tracing::info!(form = %path.display(), choices = n, "blind form imported");
        }
        None => {
            let mut prompter = Prompter::stdio();
            if !judge_interactively(&mut session, &mut prompter).await? {
                eprintln!("input ended before every brief was judged; nothing saved");
                return Ok(exit_codes::FAILED);
            }
        }
    }

    let pending = session.pending();
    if !pending.is_empty() {
        eprintln!("✖ no preference recorded for brief(s) {:?}; nothing saved", pending);
        return Ok(exit_codes::FAILED);
    }

    let rows = session.submit(&ws.paths.results)?;
    eprintln!("wrote {} ({} judgments)", ws.paths.results.display(), rows.len());
    report::render(
        &SignificanceReport::from_judgments(&rows, DEFAULT_ALPHA),
        &args.format,
    )?;
    Ok(exit_codes::OK)
}

fn parse_side(raw: &str) -> Result<Side, String> {
    Side::parse(raw).ok_or_else(|| "answer A or B".to_string())
}

/// Asks for every pending brief, showing only the two anonymous taglines.
/// Returns `false` when input ends first.
pub async fn judge_interactively<R, W>(
    session: &mut JudgmentSession,
    p: &mut Prompter<R, W>,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let rows = session.blind_rows();
    let total = rows.len();
    p.say("For each brief, pick the tagline you prefer.")?;

    for (i, row) in rows.iter().enumerate() {
        if session.choice(row.brief_id).is_some() {
            continue;
        }
        p.say(&format!("\n[{}/{}] Brief {}: {}", i + 1, total, row.brief_id, row.brief))?;
        p.say(&format!("  A: {}", row.tagline_a))?;
        p.say(&format!("  B: {}", row.tagline_b))?;
        let Some(side) = p.ask_until("preferred (A/B): ", None, parse_side).await? else {
            return Ok(false);
        };
        session.choose(row.brief_id, side)?;
    }
    Ok(true)
}
