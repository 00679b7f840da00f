//! Prometheus exposition of a collection cycle
//!
//! Every scrape renders into a brand-new [`Registry`], so a family that was
//! not produced this cycle is absent from the output rather than carrying a
//! value from an earlier scrape.
//!
//! # Metrics Families
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `ctdb_up` | Gauge | - |
//! | `ctdb_{banned,disconnected,disabled,inactive,partially_online,stopped,unhealthy,this_node}` | Gauge | `id`, `ip` |
//! | `ctdb_num_clients`, `ctdb_max_hop_count` | Gauge | `id` |
//! | `ctdb_num_recoveries_total`, `ctdb_client_packets_{sent,recv}_total` | Counter | `id` |
//! | `ctdb_{call,lockwait}_latency_count_total` | Counter | `id` |
//! | `ctdb_{call,lockwait}_latency_{min,avg,max}_seconds` | Gauge | `id` |

use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::error;

use super::collector::Snapshot;
use super::statistics::ClusterStatistics;
use crate::cluster::NodeStatus;
use crate::utils::{CtdbError, MetricsError, MetricsResult};

/// Metric namespace
pub const NAMESPACE: &str = "ctdb";

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

type NodeGetter = fn(&NodeStatus) -> f64;
type StatGetter = fn(&ClusterStatistics) -> f64;

/// Membership gauges: name, help, value
const NODE_GAUGES: &[(&str, &str, NodeGetter)] = &[
    ("banned", "Is node banned", |n| n.banned),
    ("disconnected", "Is node disconnected", |n| n.disconnected),
    ("disabled", "Is node disabled", |n| n.disabled),
    ("inactive", "Is node inactive", |n| n.inactive),
    ("partially_online", "Is node partially online", |n| n.partially_online),
    ("stopped", "Is node stopped", |n| n.stopped),
    ("unhealthy", "Is node unhealthy", |n| n.unhealthy),
    ("this_node", "Is this the node that answered the status query", |n| n.this_node),
];

/// Statistics gauges: name, help, value
const STAT_GAUGES: &[(&str, &str, StatGetter)] = &[
    ("num_clients", "CTDB active client connections", |s| s.num_clients),
    ("max_hop_count", "Maximum hop count of a call", |s| s.max_hop_count),
    ("call_latency_min_seconds", "Minimum call latency", |s| s.min_call_latency),
    ("call_latency_avg_seconds", "Average call latency", |s| s.avg_call_latency),
    ("call_latency_max_seconds", "Maximum call latency", |s| s.max_call_latency),
    ("lockwait_latency_min_seconds", "Minimum lock wait latency", |s| s.min_lockwait_latency),
    ("lockwait_latency_avg_seconds", "Average lock wait latency", |s| s.avg_lockwait_latency),
    ("lockwait_latency_max_seconds", "Maximum lock wait latency", |s| s.max_lockwait_latency),
];

/// Statistics counters: name, help, value
const STAT_COUNTERS: &[(&str, &str, StatGetter)] = &[
    ("num_recoveries_total", "Recoveries since daemon start", |s| s.num_recoveries),
    ("client_packets_sent_total", "Packets sent to clients", |s| s.client_packets_sent),
    ("client_packets_recv_total", "Packets received from clients", |s| s.client_packets_recv),
    ("call_latency_count_total", "Calls included in call latency", |s| s.num_call_latency),
    ("lockwait_latency_count_total", "Lock waits included in lock wait latency", |s| s.num_lockwait_latency),
];

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE)
}

/// Registry holding the families of one scrape
pub struct ScrapeRegistry {
    registry: Registry,
    up: Gauge,
}

impl ScrapeRegistry {
    /// Create a registry with the availability gauge registered
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();
        let up = Gauge::with_opts(opts("up", "Is CTDB running"))?;
        registry.register(Box::new(up.clone()))?;
        Ok(Self { registry, up })
    }

    /// Record the outcome of a cycle
    ///
    /// A failed cycle only sets `ctdb_up` to 0.
    pub fn record(&self, outcome: &Result<Snapshot, CtdbError>) -> MetricsResult<()> {
        match outcome {
            Ok(snapshot) => {
                self.up.set(1.0);
                if let Some(ref nodes) = snapshot.nodes {
                    self.record_nodes(nodes)?;
                }
                self.record_statistics(snapshot.node_id(), &snapshot.statistics)
            }
            Err(e) => {
                error!(error = %e, "ctdb collection failed");
                self.up.set(0.0);
                Ok(())
            }
        }
    }

    fn record_nodes(&self, nodes: &[NodeStatus]) -> MetricsResult<()> {
        for &(name, help, value) in NODE_GAUGES {
            let gauge = GaugeVec::new(opts(name, help), &["id", "ip"])?;
            self.registry.register(Box::new(gauge.clone()))?;
            for node in nodes {
                gauge
                    .with_label_values(&[node.id.as_str(), node.ip.as_str()])
                    .set(value(node));
            }
        }
        Ok(())
    }

    fn record_statistics(&self, id: &str, stats: &ClusterStatistics) -> MetricsResult<()> {
        for &(name, help, value) in STAT_GAUGES {
            let gauge = GaugeVec::new(opts(name, help), &["id"])?;
            self.registry.register(Box::new(gauge.clone()))?;
            gauge.with_label_values(&[id]).set(value(stats));
        }
        for &(name, help, value) in STAT_COUNTERS {
            let counter = CounterVec::new(opts(name, help), &["id"])?;
            self.registry.register(Box::new(counter.clone()))?;
            // Counters reject negative increments; ctdb never reports one
            let v = value(stats);
            if v > 0.0 {
                counter.with_label_values(&[id]).inc_by(v);
            } else {
                counter.with_label_values(&[id]);
            }
        }
        Ok(())
    }

    /// Encode all families in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

/// Render one cycle outcome as exposition text
pub fn render(outcome: &Result<Snapshot, CtdbError>) -> MetricsResult<String> {
    let registry = ScrapeRegistry::new()?;
    registry.record(outcome)?;
    registry.encode_text()
}
