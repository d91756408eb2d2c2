//! Main entry point for the Elo Sim rating simulator
//!
//! Loads configuration, registers the competitor population, runs the
//! concurrent match simulation and prints the final report.

use anyhow::{Context, Result};
use clap::Parser;
use elo_sim::config::{validate_config, AppConfig};
use elo_sim::service::EloSim;
use elo_sim::simulation::StopHandle;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Elo Sim - Concurrent Elo rating engine and match simulator
#[derive(Parser)]
#[command(
    name = "elo-sim",
    version,
    about = "Simulate randomized head-to-head matches over an Elo-rated population",
    long_about = "Elo Sim registers a population of competitors, simulates matches between them \
                 on many concurrent workers against a single-owner rating store, and reports the \
                 resulting rating distribution."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Population size override
    #[arg(long, value_name = "N", help = "Number of competitors to register")]
    competitors: Option<usize>,

    /// Match count override
    #[arg(long, value_name = "N", help = "Number of matches to simulate")]
    matches: Option<usize>,

    /// Worker count override
    #[arg(long, value_name = "N", help = "Number of concurrent simulation workers")]
    workers: Option<usize>,

    /// Random seed override
    #[arg(long, value_name = "SEED", help = "Fixed seed for a reproducible run")]
    seed: Option<u64>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Print the report as JSON
    #[arg(long, help = "Print the final report as JSON")]
    json: bool,

    /// Dump metrics after the run
    #[arg(long, help = "Print Prometheus metrics after the report")]
    metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without simulating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Stop claiming new matches on SIGINT or SIGTERM
async fn stop_on_signal(stop: StopHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    warn!("Stopping simulation; in-flight matches will finish");
    stop.stop();
}

/// Display startup banner with simulation information
fn display_startup_banner(config: &AppConfig) {
    info!("🎲 Elo Sim v{}", elo_sim::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Competitors: {}", config.simulation.competitors);
    info!("   Matches: {}", config.simulation.matches);
    info!("   Workers: {}", config.simulation.workers);
    match config.simulation.seed {
        Some(seed) => info!("   Seed: {}", seed),
        None => info!("   Seed: random"),
    }
    info!(
        "   Ratings: base {} in [{}, {}]",
        config.rating.base_rating, config.rating.min_rating, config.rating.max_rating
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load configuration from file or environment and apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(competitors) = args.competitors {
        config.simulation.competitors = competitors;
    }
    if let Some(matches) = args.matches {
        config.simulation.matches = matches;
    }
    if let Some(workers) = args.workers {
        config.simulation.workers = workers;
    }
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without simulating");
        return Ok(());
    }

    let mut sim = EloSim::new(config).context("Failed to initialize simulation")?;

    let signal_task = tokio::spawn(stop_on_signal(sim.stop_handle()));
    let run_result = sim.run_configured().await;
    signal_task.abort();

    let summary = match run_result {
        Ok(summary) => summary,
        Err(e) => {
            error!("Simulation failed: {}", e);
            if let Err(e) = sim.shutdown().await {
                warn!("Shutdown after failure did not complete: {}", e);
            }
            return Err(e.into());
        }
    };
    info!(
        "✅ {} matches recorded, {} failed",
        summary.recorded, summary.failed
    );

    let report = sim
        .final_report()
        .await
        .context("Failed to build final report")?;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    if let Err(e) = sim.shutdown().await {
        warn!("⚠️  Shutdown did not complete cleanly: {}", e);
    }

    if args.metrics {
        println!("{}", sim.metrics().gather_text()?);
    }

    info!("🛑 Elo Sim stopped");
    Ok(())
}
