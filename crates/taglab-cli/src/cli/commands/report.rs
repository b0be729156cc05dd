use super::{exit_codes, print_json, Workspace};
use crate::cli::args::ReportArgs;
use taglab_metrics::{SignificanceReport, DEFAULT_ALPHA};

pub fn run(ws: Workspace, args: ReportArgs) -> anyhow::Result<i32> {
    check_format(&args.format)?;
    if !ws.paths.results.exists() {
        anyhow::bail!(
            "results file not found at {} (run `taglab judge` first)",
            ws.paths.results.display()
        );
    }
    let rows = taglab_core::storage::load_results(&ws.paths.results)?;
    let report = SignificanceReport::from_judgments(&rows, DEFAULT_ALPHA);
    render(&report, &args.format)?;
    Ok(exit_codes::OK)
}

pub fn check_format(format: &str) -> anyhow::Result<()> {
    match format {
        "text" | "json" => Ok(()),
        other => anyhow::bail!("unknown format: {} (expected text or json)", other),
    }
}

/// JSON goes to stdout, text to stderr.
pub fn render(report: &SignificanceReport, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => print_json(report),
        _ => {
            eprint!("{}", report.format_text());
            Ok(())
        }
    }
}
