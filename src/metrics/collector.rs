//! Collection cycle - one sequential round of ctdb invocations per scrape
//!
//! Order: `pnn`, `recmaster`, then `status -Y` on the recovery master only,
//! then `statistics -Y`. The first failure aborts the cycle.

use serde::Serialize;
use tracing::debug;

use super::statistics::{scrape_statistics, ClusterStatistics};
use crate::client::CommandRunner;
use crate::cluster::{scrape_status, NodeStatus, Topology};
use crate::utils::Result;

/// Everything gathered in one successful cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub topology: Topology,
    /// Membership table; `None` when the local node is not the recovery master
    pub nodes: Option<Vec<NodeStatus>>,
    pub statistics: ClusterStatistics,
}

impl Snapshot {
    /// Label value identifying the local node on statistics
    pub fn node_id(&self) -> &str {
        &self.topology.pnn
    }
}

/// Runs collection cycles against a command runner
pub struct CtdbCollector<R> {
    runner: R,
}

impl<R: CommandRunner> CtdbCollector<R> {
    /// Create new collector
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// Run one cycle
    ///
    /// Nothing is kept between calls; every snapshot is built from fresh
    /// command output.
    pub fn collect(&self) -> Result<Snapshot> {
        let topology = Topology::resolve(&self.runner)?;

        let nodes = if topology.is_master() {
            Some(scrape_status(&self.runner)?)
        } else {
            debug!(pnn = %topology.pnn, recmaster = %topology.recmaster, "not recovery master, skipping status");
            None
        };

        let statistics = scrape_statistics(&self.runner)?;

        Ok(Snapshot {
            topology,
            nodes,
            statistics,
        })
    }
}
