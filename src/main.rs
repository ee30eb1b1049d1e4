use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use doiici::config::{log_json_enabled, Config};
use doiici::plugins::build_registry;
use doiici::transport::{SlackRtm, SlackWebClient};
use doiici::Bot;

#[derive(Parser)]
#[command(name = "doiici")]
#[command(about = "Slack bot that routes messages to installed plugins", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and serve messages (default)
    Run,
    /// List installed plugins
    Plugins,
    /// Show version information
    Version,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_json = log_json_enabled(|key| std::env::var(key).ok())
        .context("Failed to load configuration")?;
    init_logging(cli.log_json || log_json);

    match cli.command {
        Some(Commands::Run) | None => run().await,
        Some(Commands::Plugins) => {
            let registry = build_registry().context("Failed to load plugins")?;
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Version) => {
            println!("doiici {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run() -> Result<()> {
    info!("Loading plugins");
    let registry = build_registry().context("Failed to load plugins")?;

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Connecting to Slack");
    let (tx, rx) = mpsc::channel(config.event_buffer);
    let transport = SlackRtm::new(&config).spawn(tx);
    let sender = Arc::new(SlackWebClient::new(&config));
    let bot = Bot::new(registry, sender)?;

    let result = tokio::select! {
        result = bot.run(rx) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    transport.abort();
    result.context("Bot stopped")
}
