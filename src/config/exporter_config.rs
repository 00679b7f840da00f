//! Exporter configuration derived from CLI arguments

use super::cli::{CliArgs, OutputFormat};
use crate::client::CtdbCommand;
use crate::utils::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Complete exporter configuration
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    // Web
    pub listen_addr: SocketAddr,
    pub endpoint: String,

    // ctdb
    pub ctdb_bin: PathBuf,
    pub sudo_bin: Option<PathBuf>,
    pub command_timeout: Duration,

    // Output
    pub once: bool,
    pub output_format: OutputFormat,
}

impl ExporterConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let listen_addr = parse_listen_address(&args.listen_address)?;

        if !args.endpoint.starts_with('/') || args.endpoint == "/" {
            return Err(ConfigError::Endpoint(args.endpoint.clone()));
        }

        if args.timeout_ms == 0 {
            return Err(ConfigError::Timeout);
        }

        Ok(Self {
            listen_addr,
            endpoint: args.endpoint.clone(),
            ctdb_bin: args.ctdb_bin.clone(),
            sudo_bin: args.sudo.then(|| args.sudo_bin.clone()),
            command_timeout: Duration::from_millis(args.timeout_ms),
            once: args.once,
            output_format: args.format,
        })
    }

    /// Build the process runner described by this configuration
    pub fn command_runner(&self) -> CtdbCommand {
        let command = CtdbCommand::new(&self.ctdb_bin, self.command_timeout);
        match self.sudo_bin {
            Some(ref sudo) => command.with_sudo(sudo),
            None => command,
        }
    }
}

/// Parse `host:port`, `[v6]:port` or `:port` (all interfaces)
fn parse_listen_address(address: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::ListenAddress {
        address: address.to_string(),
        reason,
    };

    if let Some(port) = address.strip_prefix(':') {
        let port: u16 = port.parse().map_err(|e| invalid(format!("bad port: {}", e)))?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    address.parse().map_err(|e| invalid(format!("{}", e)))
}
