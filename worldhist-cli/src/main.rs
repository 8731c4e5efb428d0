use anyhow::Result;
use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;
use worldhist_cli::cli::Cli;
use worldhist_cli::run::run;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.trace);

    let valid = run(&cli.config, &cli.output).await?;
    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

/// Tracing output goes to stderr so stdout stays free for any piped
/// consumer; `RUST_LOG` takes priority over `--trace` when set.
fn setup_tracing(trace: worldhist_cli::cli::TraceLevel) {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::level_filters::LevelFilter::from(trace))
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }
}
