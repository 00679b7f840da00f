//! Cluster membership as reported by `ctdb status -Y`

use serde::Serialize;
use tracing::debug;

use crate::client::CtdbCommands;
use crate::metrics::table::{ColumnField, ParseStrategy, PipeTable};
use crate::utils::Result;

/// One row of the membership table
///
/// Flags are stored as 0.0/1.0 so they can be published as gauges directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeStatus {
    /// Node number (pnn)
    pub id: String,
    /// Node address
    pub ip: String,
    pub disconnected: f64,
    pub banned: f64,
    pub disabled: f64,
    pub unhealthy: f64,
    pub stopped: f64,
    pub inactive: f64,
    pub partially_online: f64,
    /// 1.0 on the row describing the node the command ran on
    pub this_node: f64,
}

type StatusField = ColumnField<NodeStatus>;

/// Column mapping for `status -Y`
pub const STATUS_FIELDS: &[StatusField] = &[
    StatusField::text("Node", |s, v| s.id = v.to_string()),
    StatusField::text("IP", |s, v| s.ip = v.to_string()),
    StatusField::number("Disconnected", ParseStrategy::Flag, |s, v| s.disconnected = v),
    StatusField::number("Banned", ParseStrategy::Flag, |s, v| s.banned = v),
    StatusField::number("Disabled", ParseStrategy::Flag, |s, v| s.disabled = v),
    StatusField::number("Unhealthy", ParseStrategy::Flag, |s, v| s.unhealthy = v),
    StatusField::number("Stopped", ParseStrategy::Flag, |s, v| s.stopped = v),
    StatusField::number("Inactive", ParseStrategy::Flag, |s, v| s.inactive = v),
    StatusField::number("PartiallyOnline", ParseStrategy::Flag, |s, v| s.partially_online = v),
    StatusField::number("ThisNode", ParseStrategy::Marker, |s, v| s.this_node = v),
];

impl NodeStatus {
    /// True when no flag marks the node as degraded
    pub fn is_healthy(&self) -> bool {
        [
            self.disconnected,
            self.banned,
            self.disabled,
            self.unhealthy,
            self.stopped,
            self.inactive,
        ]
        .iter()
        .all(|&flag| flag == 0.0)
    }

    pub fn is_this_node(&self) -> bool {
        self.this_node == 1.0
    }
}

/// Parse a `status -Y` table into one record per data line
///
/// A header-only table yields an empty list.
///
/// Example:
/// ```text
/// |Node|IP|Disconnected|Banned|Disabled|Unhealthy|Stopped|Inactive|PartiallyOnline|ThisNode|
/// |0|10.0.0.1|0|0|0|0|0|0|0|Y|
/// |1|10.0.0.2|1|0|0|1|0|0|0|N|
/// ```
pub fn parse_status_table(raw: &str) -> Result<Vec<NodeStatus>> {
    let table = PipeTable::parse("status -Y", raw)?;
    Ok(table.decode_all(STATUS_FIELDS))
}

/// Run `ctdb status -Y` and parse the result
pub fn scrape_status<R: CtdbCommands + ?Sized>(runner: &R) -> Result<Vec<NodeStatus>> {
    let raw = runner.status()?;
    let nodes = parse_status_table(&raw)?;
    debug!(
        nodes = nodes.len(),
        degraded = nodes.iter().filter(|n| !n.is_healthy()).count(),
        this_node = ?nodes.iter().find(|n| n.is_this_node()).map(|n| n.id.as_str()),
        "scraped status"
    );
    Ok(nodes)
}
