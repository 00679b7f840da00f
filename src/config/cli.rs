//! Command-line argument parsing
//!
//! Flag names follow the dotted convention used by Prometheus exporters.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Prometheus exporter for CTDB cluster status and statistics
#[derive(Parser, Debug, Clone)]
#[command(name = "ctdb-exporter")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Web Options =====
    /// Address to listen on for HTTP requests (":port" binds all interfaces)
    #[arg(long = "web.listen-address", default_value = ":9725")]
    pub listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.endpoint", default_value = "/metrics")]
    pub endpoint: String,

    // ===== CTDB Options =====
    /// Full path to the ctdb binary
    #[arg(long = "ctdb.bin-path", default_value = "/usr/bin/ctdb")]
    pub ctdb_bin: PathBuf,

    /// Run ctdb commands through sudo
    #[arg(long = "ctdb.sudo", default_value_t = true, action = clap::ArgAction::Set)]
    pub sudo: bool,

    /// Full path to the sudo binary
    #[arg(long = "ctdb.sudo-path", default_value = "/usr/bin/sudo")]
    pub sudo_bin: PathBuf,

    /// Timeout for a single ctdb invocation in milliseconds
    #[arg(long = "ctdb.timeout-ms", default_value_t = 5000)]
    pub timeout_ms: u64,

    // ===== One-shot Mode =====
    /// Collect once, print the result and exit
    #[arg(long = "once")]
    pub once: bool,

    /// Output format for --once
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Prometheus)]
    pub format: OutputFormat,

    // ===== Logging =====
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Output format for one-shot mode
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Prometheus text exposition
    #[default]
    Prometheus,
    /// Collected snapshot as JSON
    Json,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
