use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod templates;

use cli::args::Cli;
use cli::commands::{dispatch, exit_codes};

fn init_logging() {
    let filter = EnvFilter::try_from_env("TAGLAB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr);

    if std::env::var("TAGLAB_LOG_FORMAT").ok().as_deref() == Some("json") {
        builder
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_span_list(false)
            .init();
    } else {
        builder.compact().with_target(false).init();
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) if taglab_core::errors::is_config_error(&e) => {
            eprintln!("config error: {e:#}");
            exit_codes::CONFIG_ERROR
        }
        Err(e) => {
            eprintln!("fatal: {e:#}");
            exit_codes::FAILED
        }
    };
    std::process::exit(code);
}
