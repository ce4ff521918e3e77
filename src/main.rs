use std::process;

use clap::Parser;
use gommit::cli::error_hint;
use gommit::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise "warn", or "debug" with --verbose.
    // Logs go to stderr so they never mix with the preview on stdout.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e}");

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        if let Some(hint) = error_hint(&e) {
            eprintln!("\n{hint}");
        }

        process::exit(1);
    }
}
