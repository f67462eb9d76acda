use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daily_dose::config::{parse_schedule_time, Config};
use daily_dose::delivery::EmailCredentials;
use daily_dose::digest::{DigestBot, RunOutcome};

#[derive(Parser)]
#[command(name = "daily-dose", about = "Daily Dose of Tech - AI News Bot")]
struct Cli {
    /// Path to the digest configuration file
    #[arg(short, long, default_value = "digest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the digest once now
    Run,
    /// Preview the digest without sending
    Preview,
    /// Schedule daily runs at a local time (HH:MM)
    Schedule {
        #[arg(default_value = "08:00")]
        time: String,
    },
    /// Run as a daemon using the configured schedule time
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_dose=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!("\nMake sure to configure your digest.toml and .env files first!");
        return Ok(());
    };

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    config.apply_env_overrides();
    info!("Loaded {} sources from configuration", config.sources.len());

    let bot = DigestBot::from_config(
        &config,
        std::env::var("ANTHROPIC_API_KEY").ok(),
        EmailCredentials::from_env(),
    )?;

    match command {
        Command::Run => report(bot.run_once().await)?,
        Command::Preview => report(bot.preview().await)?,
        Command::Schedule { time } => {
            let at = parse_schedule_time(&time)?;
            bot.run_daily(at).await;
        }
        Command::Daemon => {
            let at = parse_schedule_time(&config.schedule_time)?;
            bot.run_daily(at).await;
        }
    }

    Ok(())
}

/// Delivery failures become a non-zero exit; empty runs do not.
fn report(outcome: RunOutcome) -> anyhow::Result<()> {
    match outcome {
        RunOutcome::Delivered { articles } => info!("Done: {} articles", articles),
        RunOutcome::NoArticles => info!("Nothing to send today"),
        RunOutcome::AllSourcesFailed { sources } => {
            info!("All {} sources failed, check the feed URLs", sources)
        }
        RunOutcome::DeliveryFailed { reason, .. } => anyhow::bail!("delivery failed: {}", reason),
    }
    Ok(())
}
