//! ctdb-exporter library
//!
//! Prometheus exporter for CTDB clusters. Every scrape runs the ctdb CLI,
//! parses its machine-readable `-Y` tables and renders the result.

pub mod client;
pub mod cluster;
pub mod config;
pub mod metrics;
pub mod server;
pub mod utils;
