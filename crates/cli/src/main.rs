use clap::{Parser, Subcommand};
use sector_alloc_cli::commands::{
    run_baselines, run_history, run_run_daily, BaselinesArgs, HistoryArgs, RunDailyArgs,
};

#[derive(Parser)]
#[command(name = "sector-alloc")]
#[command(about = "Daily sector ETF allocation diagnostic", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay history through the target date, persist it, and report the day
    RunDaily(RunDailyArgs),
    /// Show rows of the persisted history table
    History(HistoryArgs),
    /// Rebuild rolling baselines from persisted raw values and show them
    Baselines(BaselinesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::RunDaily(args) => run_run_daily(args).await,
        Commands::History(args) => run_history(args).await,
        Commands::Baselines(args) => run_baselines(args).await,
    }
}
