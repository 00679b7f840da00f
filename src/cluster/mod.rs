//! Cluster topology and membership
//!
//! This module provides:
//! - Recovery master detection via `ctdb pnn` / `ctdb recmaster`
//! - Membership table parsing from `ctdb status -Y`

pub mod node;
pub mod topology;

pub use node::{parse_status_table, scrape_status, NodeStatus};
pub use topology::{is_master_node, Topology};
