//! Autobalance
//!
//! Invoked on a schedule. For every configured input it:
//! - checks maintenance mode and the search factor
//! - reconciles the cluster's rebalance threshold
//! - triggers excess bucket removal, a usage-based or a uniform rebalance
//!
//! # Commands
//! - `run` - process every input in a configuration file
//! - `trigger` - process one input given as flags
//! - `scheme` - print the input scheme as JSON

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use autobalance_core::{InputScheme, RawInput};
use autobalance_rebalancer::config::{ManagerSettings, RebalancerConfig};
use autobalance_rebalancer::logging::{self, LoggingConfig};
use autobalance_rebalancer::{HttpClusterManager, Orchestrator};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "autobalance")]
#[command(about = "Trigger indexer cluster data rebalancing when the search factor is met")]
#[command(version)]
struct Cli {
    /// Session token for the cluster manager
    #[arg(long, global = true, env = "AUTOBALANCE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every input in a configuration file
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long, env = "AUTOBALANCE_CONFIG")]
        config: PathBuf,
    },

    /// Process a single input given on the command line
    Trigger {
        /// Cluster manager base URL
        #[arg(long, env = "AUTOBALANCE_MANAGER_URL")]
        manager_url: Option<String>,

        /// Extra CA certificate for the cluster manager (PEM format)
        #[arg(long)]
        ca_cert: Option<PathBuf>,

        /// Skip server certificate verification (DANGEROUS)
        #[arg(long, default_value = "false")]
        insecure: bool,

        /// Directory for the rotating log file
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// rebalance_threshold value, defaults to 0.9
        #[arg(long)]
        threshold: Option<String>,

        /// Maximum rebalance runtime in minutes, defaults to unlimited
        #[arg(long)]
        max_runtime: Option<String>,

        /// Index to act on, defaults to all indexes
        #[arg(long)]
        target_index: Option<String>,

        /// Use searchable rebalance
        #[arg(long)]
        searchable: bool,

        /// Use usage based rebalance
        #[arg(long)]
        usage_based: bool,

        /// Remove excess buckets instead of rebalancing
        #[arg(long)]
        excess_buckets: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Print the input scheme as JSON
    Scheme,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = RebalancerConfig::load(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;
            let inputs = config.raw_inputs()?;
            run(config.manager, config.logging, cli.token, inputs).await
        }

        Commands::Trigger {
            manager_url,
            ca_cert,
            insecure,
            log_dir,
            threshold,
            max_runtime,
            target_index,
            searchable,
            usage_based,
            excess_buckets,
            debug,
        } => {
            let mut manager = ManagerSettings::default();
            if let Some(url) = manager_url {
                manager.base_url = url;
            }
            manager.ca_cert = ca_cert;
            manager.insecure = insecure;

            let mut input = RawInput::new("cli");
            for (key, value) in [
                ("threshold", threshold),
                ("max_runtime", max_runtime),
                ("target_index", target_index),
            ] {
                if let Some(value) = value {
                    input.values.insert(key.to_string(), value);
                }
            }
            for (key, set) in [
                ("searchable", searchable),
                ("usage_based", usage_based),
                ("excess_buckets", excess_buckets),
                ("debug", debug),
            ] {
                if set {
                    input.values.insert(key.to_string(), "true".to_string());
                }
            }

            let logging = LoggingConfig {
                dir: log_dir,
                json: false,
            };
            run(manager, logging, cli.token, vec![input]).await
        }

        Commands::Scheme => {
            let scheme = serde_json::to_string_pretty(&InputScheme::rebalance())?;
            println!("{}", scheme);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(
    settings: ManagerSettings,
    logging: LoggingConfig,
    token: Option<String>,
    inputs: Vec<RawInput>,
) -> Result<ExitCode> {
    let log_handle = logging::init(&logging)?;
    info!("auto_data_rebalance start");

    if inputs.is_empty() {
        warn!("No inputs configured, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    info!(base_url = %settings.base_url, "Auto Data Rebalance attempting to retrieve session key");
    let token = settings.resolve_token(token)?;
    let manager = HttpClusterManager::new(&settings.client_config(token))
        .context("Failed to create cluster manager client")?;

    let orchestrator = Orchestrator::new(Arc::new(manager))
        .with_verbosity(log_handle.verbosity.clone());

    let report = orchestrator.run_all(&inputs).await;
    info!(summary = %report.summary(), "Auto data rebalance finished");

    if report.error().is_some() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
