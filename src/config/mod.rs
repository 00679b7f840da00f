//! Configuration module

pub mod cli;
pub mod exporter_config;

pub use cli::{CliArgs, OutputFormat};
pub use exporter_config::ExporterConfig;
