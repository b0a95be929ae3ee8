//! Capture filter command line (v1)
//!
//! Runs the capture module outside a proxy: validates configuration and
//! replays recorded exchanges into the collector.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    CAPTURE MODULE                      │
//!                    │                                                        │
//!   header/body      │  ┌─────────────┐      ┌──────────────┐                 │
//!   callbacks ───────┼─▶│ accumulator │─────▶│  assembler   │                 │
//!                    │  │ (per dir)   │      │ headers/props│                 │
//!                    │  └─────────────┘      └──────┬───────┘                 │
//!   stream done ─────┼─────────────────────────────▶│                         │
//!                    │                              ▼                         │
//!                    │                       ┌──────────────┐  ┌───────────┐  │
//!                    │                       │   emitter    │─▶│ batching  │──┼──▶ Collector
//!                    │                       │ (detached)   │  │  writer   │  │
//!                    │                       └──────────────┘  └───────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::runtime::Handle;

use capture_filter::config::{load_config, FilterConfig};
use capture_filter::host::RootContext;
use capture_filter::observability::{logging, metrics};
use capture_filter::replay::{load_exchanges, replay_exchange};
use capture_filter::CaptureModule;

#[derive(Parser)]
#[command(name = "capture-filter")]
#[command(about = "Inline HTTP traffic capture filter", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the effective values
    Check,
    /// Replay recorded exchanges (JSON lines) through the capture pipeline
    Replay {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FilterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("capture-filter v0.1.0 starting");

    match cli.command {
        Commands::Check => {
            println!("{}", toml::to_string_pretty(&config)?);
            tracing::info!("Configuration valid");
        }
        Commands::Replay { input } => replay(config, input).await?,
    }

    Ok(())
}

async fn replay(config: FilterConfig, input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let exchanges = load_exchanges(BufReader::new(File::open(&input)?))?;
    tracing::info!(input = %input.display(), exchanges = exchanges.len(), "Replaying exchanges");

    let mut module = CaptureModule::new(config, Handle::current());
    if !module.on_start(0) {
        return Err("capture module failed to start".into());
    }

    let mut captured = 0usize;
    let max_in_flight = module.config().publisher.max_in_flight;
    for exchange in &exchanges {
        // Replay is not latency bound, so wait out the in-flight cap instead of dropping.
        if let Some(emitter) = module.emitter() {
            if emitter.in_flight() >= max_in_flight {
                emitter.quiesce().await;
            }
        }
        if replay_exchange(&module, exchange) {
            captured += 1;
        }
    }

    module.quiesce().await;
    module.on_done();
    module.drained().await;

    tracing::info!(captured, "Replay complete");
    Ok(())
}
