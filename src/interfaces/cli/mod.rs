/// CLI Interface Module
///
/// Command-line entry point. Runs a seeded order-flow simulation of the limit
/// order hook against the in-memory pool manager and streams every committed
/// event to stdout as one JSON object per line.
///
/// ## Responsibilities
/// - Parse command-line arguments and the optional JSON config file
/// - Initialize logging
/// - Run the simulation on a blocking thread while events are printed
/// - Print the final report (and optionally the Prometheus metrics)

use crate::application::config::{ConfigError, HookConfig};
use crate::interfaces::tools::{run_simulation, SimulationConfig, SimulationError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::HookEvent;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Limit order hook simulation
#[derive(Parser, Debug, Clone)]
#[command(name = "limit-order-engine")]
#[command(version = "0.1.0")]
#[command(about = "Resting limit orders executed by an AMM pool hook", long_about = None)]
pub struct CliConfig {
    /// JSON file with the hook configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum order size (overrides the config file)
    #[arg(short = 'm', long)]
    pub min_order_size: Option<u128>,

    /// Executions allowed per trigger (overrides the config file)
    #[arg(short = 'c', long)]
    pub max_crossings: Option<usize>,

    /// Pool tick spacing, the interval width of order boundaries
    #[arg(short = 'w', long, default_value_t = 60)]
    pub tick_spacing: i32,

    /// Pool fee in hundredths of a basis point
    #[arg(short = 'f', long, default_value_t = 3000)]
    pub fee: u32,

    /// Random seed
    #[arg(short = 's', long, default_value_t = 42)]
    pub seed: u64,

    /// Number of makers resting orders
    #[arg(long, default_value_t = 4)]
    pub makers: usize,

    /// Orders placed by each maker
    #[arg(long, default_value_t = 5)]
    pub orders_per_maker: usize,

    /// Number of external swaps
    #[arg(short = 'n', long, default_value_t = 100)]
    pub swaps: usize,

    /// Log level
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// Print Prometheus metrics after the run
    #[arg(long, default_value_t = false)]
    pub metrics: bool,

    /// Only print the resolved configuration
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("simulation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CliConfig {
    /// Hook configuration: config file first, then flag overrides
    pub fn hook_config(&self) -> Result<HookConfig, ConfigError> {
        let mut hook = match &self.config {
            Some(path) => HookConfig::from_json_file(path)?,
            None => HookConfig::default(),
        };
        if let Some(min_order_size) = self.min_order_size {
            hook.min_order_size = min_order_size;
        }
        if let Some(max_crossings) = self.max_crossings {
            hook.max_crossings_per_trigger = max_crossings;
        }
        Ok(hook)
    }

    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig {
            hook: self.hook_config()?,
            tick_spacing: self.tick_spacing,
            fee: self.fee,
            seed: self.seed,
            makers: self.makers,
            orders_per_maker: self.orders_per_maker,
            swaps: self.swaps,
            ..SimulationConfig::default()
        })
    }
}

/// Runs the CLI application
pub async fn run() {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(e) = execute(config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn execute(config: CliConfig) -> Result<(), CliError> {
    let simulation = config.simulation_config()?;
    simulation.ladder_span()?;
    tracing::info!("configuration: {:?}", simulation);

    if config.dry_run {
        println!("{:#?}", simulation);
        return Ok(());
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<HookEvent>();
    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("event encoding failed: {}", e),
            }
            printed += 1;
        }
        printed
    });

    let report =
        tokio::task::spawn_blocking(move || run_simulation(&simulation, Some(event_tx))).await??;
    let printed = printer.await?;

    tracing::info!(events = printed, "event stream closed");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("report encoding failed: {}", e),
    }
    if config.metrics {
        println!("{}", METRICS.export());
    }
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` takes precedence over `level`
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // logs go to stderr so stdout stays a clean event stream
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
