//! Utility modules

pub mod error;

pub use error::{ConfigError, CtdbError, ExecutionError, MetricsError, MetricsResult, Result};
