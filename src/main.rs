use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{Config, LoggingConfig, load_config};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod rank;
mod show;
mod update;

/// The main entry point for the Sentquant NAV tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Wallets and config overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config: Config = load_config(&cli.config)?;

    // Must be held until exit or buffered file logs are lost.
    let _guard = init_tracing(&config.logging);

    // Execute the appropriate command
    match cli.command {
        Commands::Update(args) => update::handle_update(args, &config).await,
        Commands::Rank(args) => rank::handle_rank(args, &config).await,
        Commands::Show(args) => show::handle_show(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks the NAV of trading agents and ranks them by risk-adjusted performance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the current valuation of each agent and append it to its NAV history.
    Update(UpdateArgs),
    /// Rank every tracked agent by Sentquant Risk Score.
    Rank(RankArgs),
    /// Print an agent's recorded NAV history.
    Show(ShowArgs),
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Only update these agents (repeatable). Defaults to every configured agent.
    #[arg(long = "agent")]
    agents: Vec<String>,

    /// Use this valuation instead of querying the venue. Requires exactly one --agent.
    #[arg(long)]
    valuation: Option<f64>,

    /// Book the observation under this date instead of today (format: YYYY-MM-DD).
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Parser)]
pub struct RankArgs {
    /// Also write the ranked display list consumed by the dashboard.
    #[arg(long)]
    write_display_config: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// The agent whose history to print.
    #[arg(long)]
    agent: String,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Console logs go through the progress-bar layer so they do not tear the bars.
/// `RUST_LOG` overrides the default `info` filter.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let indicatif_layer = IndicatifLayer::new();
    let env_filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(env_filter());

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "sentquant.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(indicatif_layer)
        .init();

    guard
}
