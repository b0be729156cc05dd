use super::{exit_codes, print_json, Workspace};
use crate::cli::args::DoctorArgs;
use std::path::Path;
use taglab_core::doctor::{doctor, DoctorOptions};

pub fn run(ws: Workspace, config_path: &Path, args: DoctorArgs) -> anyhow::Result<i32> {
    super::report::check_format(&args.format)?;
    let opts = DoctorOptions {
        config_path,
        api_key_set: args.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()),
    };
    let report = doctor(&ws.cfg, &ws.paths, &opts);

    if args.format == "json" {
        print_json(&report)?;
        return Ok(exit_codes::OK);
    }

    let mut s = String::new();
    s.push_str(&format!("taglab doctor (v{})\n", report.taglab_version));
    s.push_str(&format!(
        "Config: {}{}\n",
        report.config.config_path,
        if report.config.config_found { "" } else { " (not found, using defaults)" }
    ));
    s.push_str(&format!("Data dir: {}\n\n", report.config.data_dir));
    for st in &report.stages {
        let state = match (&st.error, st.rows, st.exists) {
            (Some(e), _, _) => format!("error: {}", e),
            (None, Some(n), _) => format!("{} row(s)", n),
            (None, None, true) => "present".to_string(),
            (None, None, false) => "missing".to_string(),
        };
        s.push_str(&format!("{:<9} {:<40} {}", st.stage, st.path, state));
        if let Some(d) = &st.detail {
            s.push_str(&format!(" [{}]", d));
        }
        s.push('\n');
    }
    for n in &report.notes {
        s.push_str(&format!("note: {}\n", n));
    }
    s.push_str(&format!(
        "\nNext: {} -> {}\n",
        report.next_action.title, report.next_action.command
    ));
    eprint!("{}", s);

    Ok(exit_codes::OK)
}
