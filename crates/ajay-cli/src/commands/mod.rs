//! CLI command definitions and handlers.

use ajay_core::BroadcastConfig;
use ajay_store::RedisOrigin;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub mod broadcast;
pub mod serve;

/// PM-AJAY portal broadcast notifications
#[derive(Parser)]
#[command(name = "ajay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Redis URL of the shared storage origin
    #[arg(long, global = true, env = "AJAY_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Key namespace of the storage origin
    #[arg(long, global = true, env = "AJAY_NAMESPACE")]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the broadcast web server
    Serve(serve::ServeArgs),

    /// Publish and inspect broadcasts
    #[command(subcommand)]
    Broadcast(broadcast::BroadcastCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let mut config = BroadcastConfig::from_env()?;
        if let Some(url) = self.redis_url {
            config.redis_url = url;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }

        match self.command {
            Commands::Serve(args) => serve::execute(args, &config).await,
            Commands::Broadcast(cmd) => broadcast::execute(cmd, &config).await,
        }
    }
}

/// Connect to the configured Redis origin.
pub async fn connect(config: &BroadcastConfig) -> Result<RedisOrigin> {
    RedisOrigin::connect(&config.redis_url, &config.namespace)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.redis_url))
}
