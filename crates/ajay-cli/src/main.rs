//! PM-AJAY broadcast CLI
//!
//! Publish, inspect and follow portal-wide broadcast notifications, and run
//! the broadcast web server.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{Cli, Commands};

/// Initialize tracing with optional file logging.
fn init_tracing(log_file: Option<&std::path::Path>, verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "ajay=debug,ajay_web=debug,ajay_core=debug,ajay_store=debug"
    } else {
        "ajay=info,ajay_web=debug,ajay_core=info,ajay_store=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        // Log to both stdout and file when --log is used
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve(args) if args.log => Some(
            args.log_file
                .clone()
                .unwrap_or_else(|| std::path::PathBuf::from(".ajay/serve.log")),
        ),
        _ => None,
    };

    init_tracing(log_file.as_deref(), cli.verbose)?;

    cli.execute().await
}
