//! Metrics collection and exposition
//!
//! This module provides:
//! - Declarative column mapping over ctdb's `-Y` tables
//! - Statistics record parsing
//! - The per-scrape collection cycle
//! - Prometheus text rendering from a fresh registry per scrape

pub mod collector;
pub mod exporter;
pub mod statistics;
pub mod table;

pub use collector::{CtdbCollector, Snapshot};
pub use exporter::{render, ScrapeRegistry, CONTENT_TYPE, NAMESPACE};
pub use statistics::{parse_statistics_record, scrape_statistics, ClusterStatistics};
pub use table::{ColumnField, ParseStrategy, PipeTable};
