//! Web server command.

use ajay_core::BroadcastConfig;
use ajay_store::{MemoryOrigin, StorageOrigin};
use ajay_web::state::AppState;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3040")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Keep broadcasts in process memory instead of Redis
    #[arg(long)]
    pub memory: bool,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to .ajay/serve.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config: &BroadcastConfig) -> Result<()> {
    let origin: Arc<dyn StorageOrigin> = if args.memory {
        Arc::new(MemoryOrigin::new())
    } else {
        Arc::new(super::connect(config).await?)
    };
    let state = AppState::new(origin, config);

    println!();
    println!("  {} {}", "PM-AJAY".cyan().bold(), "Broadcast Server".bold());
    println!();
    println!(
        "  {}       http://{}:{}/api/broadcasts",
        "API".green(),
        args.host,
        args.port
    );
    println!(
        "  {}  ws://{}:{}/ws?role=<role>",
        "WebSocket".green(),
        args.host,
        args.port
    );
    let storage = if args.memory {
        "in-memory".to_string()
    } else {
        format!("{} ({})", config.redis_url, config.namespace)
    };
    println!("  {}    {}", "Storage".green(), storage);
    if let Some(url) = &config.api_url {
        println!("  {}    {}/broadcasts", "Forward".green(), url.trim_end_matches('/'));
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    ajay_web::run_server(state, &args.host, args.port).await?;

    Ok(())
}
