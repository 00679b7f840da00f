//! ctdb-exporter - Prometheus exporter for CTDB
//!
//! Serves node membership and daemon statistics over HTTP, or prints a
//! single collection with `--once`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ctdb_exporter::client::CommandRunner;
use ctdb_exporter::config::{CliArgs, ExporterConfig, OutputFormat};
use ctdb_exporter::metrics::{render, CtdbCollector};
use ctdb_exporter::server;

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // stdout carries --once output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn run_once<R: CommandRunner>(collector: &CtdbCollector<R>, format: OutputFormat) -> Result<()> {
    let outcome = collector.collect();

    match format {
        OutputFormat::Prometheus => {
            print!("{}", render(&outcome)?);
            outcome.map(|_| ()).context("collection failed")
        }
        OutputFormat::Json => {
            let snapshot = outcome.context("collection failed")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet)?;

    // Build configuration
    let config = ExporterConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let collector = CtdbCollector::new(config.command_runner());
    info!(
        ctdb = %config.ctdb_bin.display(),
        sudo = config.sudo_bin.is_some(),
        timeout_ms = config.command_timeout.as_millis() as u64,
        "ctdb-exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    if config.once {
        return run_once(&collector, config.output_format);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(server::serve(config.listen_addr, &config.endpoint, Arc::new(collector)))
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
