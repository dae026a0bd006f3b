//! amz-price-watch - Amazon price tracker with email alerts

use amz_price_watch::commands::{CheckCommand, TrackCommand};
use amz_price_watch::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-price-watch",
    version,
    about = "Amazon price tracker with email alerts",
    long_about = "Resolves a product query to its Amazon page, watches the listed price \
                  on a recurring schedule, and emails an alert when it drops to the target."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Amazon storefront base URL
    #[arg(long, global = true, env = "AMZ_BASE_URL")]
    base_url: Option<String>,

    /// Emit machine-readable JSON lines instead of status text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a product and alert when the price drops to the target
    #[command(alias = "t")]
    Track {
        /// Product search query
        query: String,

        /// Target price; at or below triggers an alert
        #[arg(short, long)]
        target: f64,

        /// Alert recipient (defaults to the sender address)
        #[arg(short, long, env = "MY_EMAIL")]
        recipient: String,

        /// Hours between periodic checks
        #[arg(long, default_value = "12")]
        interval_hours: u64,

        /// Print alerts to the console instead of sending email
        #[arg(long)]
        no_email: bool,
    },

    /// Resolve a product and run a single price check
    #[command(alias = "c")]
    Check {
        /// Product search query
        query: String,

        /// Target price; at or below triggers an alert
        #[arg(short, long)]
        target: f64,

        /// Alert recipient (defaults to the sender address)
        #[arg(short, long, env = "MY_EMAIL")]
        recipient: String,

        /// Print alerts to the console instead of sending email
        #[arg(long)]
        no_email: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Track { query, target, recipient, interval_hours, no_email } => {
            config.interval_hours = interval_hours;

            let cmd = TrackCommand::new(config, cli.json);
            cmd.execute(&query, target, &recipient, no_email).await?;
        }

        Commands::Check { query, target, recipient, no_email } => {
            let cmd = CheckCommand::new(config, cli.json);
            cmd.execute(&query, target, &recipient, no_email).await?;
        }
    }

    Ok(())
}
