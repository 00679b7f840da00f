//! Error types for ctdb-exporter

use std::io;
use thiserror::Error;

/// Failure to run a ctdb invocation
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("command '{invocation}' could not be started: {source}")]
    Spawn {
        invocation: String,
        source: io::Error,
    },

    #[error("command '{invocation}' failed with {status} ({output})")]
    Failed {
        invocation: String,
        status: String,
        output: String,
    },

    #[error("command '{invocation}' timed out after {timeout_ms}ms ({output})")]
    Timeout {
        invocation: String,
        timeout_ms: u64,
        output: String,
    },
}

impl ExecutionError {
    /// The command line that failed, for log context
    pub fn invocation(&self) -> &str {
        match self {
            ExecutionError::Spawn { invocation, .. }
            | ExecutionError::Failed { invocation, .. }
            | ExecutionError::Timeout { invocation, .. } => invocation,
        }
    }
}

/// Errors surfaced by a collection cycle
#[derive(Error, Debug)]
pub enum CtdbError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("'{command}' returned no output")]
    EmptyOutput { command: String },

    #[error("'{command}' returned {actual} line(s), expected at least {expected}")]
    MalformedOutput {
        command: String,
        expected: usize,
        actual: usize,
    },
}

/// Metrics registry errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Invalid command-line configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid listen address '{address}': {reason}")]
    ListenAddress { address: String, reason: String },

    #[error("invalid metrics endpoint '{0}': must start with '/' and not be '/'")]
    Endpoint(String),

    #[error("command timeout must be greater than zero")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, CtdbError>;
pub type MetricsResult<T> = std::result::Result<T, MetricsError>;
