//! Recovery master detection
//!
//! Membership is identical on every node, so only the recovery master
//! publishes it. The topology is resolved once per collection cycle and passed
//! along as a value; it is never cached, since the master can move at any time.

use serde::Serialize;
use tracing::debug;

use crate::client::CtdbCommands;
use crate::utils::ExecutionError;

/// Local node id and the current recovery master id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    /// Local node number
    pub pnn: String,
    /// Node number of the recovery master
    pub recmaster: String,
}

impl Topology {
    /// Query `pnn` then `recmaster`
    ///
    /// The first failing invocation's error is returned as-is; `recmaster` is
    /// not run when `pnn` fails.
    pub fn resolve<R: CtdbCommands + ?Sized>(runner: &R) -> Result<Self, ExecutionError> {
        let pnn = runner.pnn()?;
        let recmaster = runner.recmaster()?;
        debug!(%pnn, %recmaster, "resolved topology");
        Ok(Self { pnn, recmaster })
    }

    /// Is the local node the recovery master?
    pub fn is_master(&self) -> bool {
        self.pnn == self.recmaster
    }
}

/// Whether the local node is the cluster's recovery master
pub fn is_master_node<R: CtdbCommands + ?Sized>(runner: &R) -> Result<bool, ExecutionError> {
    Topology::resolve(runner).map(|t| t.is_master())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::runner::testing::ScriptedRunner;

    #[test]
    fn test_master_when_ids_match() {
        let runner = ScriptedRunner::new().respond("pnn", "0").respond("recmaster", "0");

        assert!(is_master_node(&runner).unwrap());
    }

    #[test]
    fn test_not_master_when_ids_differ() {
        let runner = ScriptedRunner::new().respond("pnn", "0").respond("recmaster", "1");

        assert!(!is_master_node(&runner).unwrap());
    }

    #[test]
    fn test_comparison_is_exact() {
        let topology = Topology {
            pnn: "1".to_string(),
            recmaster: "01".to_string(),
        };
        assert!(!topology.is_master());
    }

    #[test]
    fn test_resolve_keeps_both_ids() {
        let runner = ScriptedRunner::new().respond("pnn", "2").respond("recmaster", "0");
        let topology = Topology::resolve(&runner).unwrap();

        assert_eq!(topology.pnn, "2");
        assert_eq!(topology.recmaster, "0");
        assert!(!topology.is_master());
    }

    #[test]
    fn test_pnn_failure_stops_before_recmaster() {
        let runner = ScriptedRunner::new()
            .fail("pnn", "connection refused")
            .respond("recmaster", "0");
        let err = is_master_node(&runner).unwrap_err();

        match err {
            ExecutionError::Failed {
                invocation, output, ..
            } => {
                assert_eq!(invocation, "ctdb pnn");
                assert_eq!(output, "connection refused");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(runner.calls(), vec!["pnn"]);
    }

    #[test]
    fn test_recmaster_failure_is_returned() {
        let runner = ScriptedRunner::new()
            .respond("pnn", "0")
            .fail("recmaster", "timeout");
        let err = is_master_node(&runner).unwrap_err();

        assert_eq!(err.invocation(), "ctdb recmaster");
        assert_eq!(runner.calls(), vec!["pnn", "recmaster"]);
    }
}
