//! Local daemon statistics from `ctdb statistics -Y`
//!
//! The output carries dozens of columns (timestamps, per-call-type counters,
//! lock, childwrite and reclock latencies). Only the allow-list in
//! [`STATISTICS_FIELDS`] is extracted.

use serde::Serialize;
use tracing::warn;

use super::table::{ColumnField, ParseStrategy, PipeTable};
use crate::client::CtdbCommands;
use crate::utils::{CtdbError, Result};

const COMMAND: &str = "statistics -Y";

/// Aggregate statistics for the polled node
///
/// Every field is zero when its column is missing, empty or unparsable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterStatistics {
    // Counters
    pub num_clients: f64,
    pub num_recoveries: f64,
    pub client_packets_sent: f64,
    pub client_packets_recv: f64,
    pub num_call_latency: f64,
    pub num_lockwait_latency: f64,

    // Gauges
    pub max_hop_count: f64,
    pub min_call_latency: f64,
    pub avg_call_latency: f64,
    pub max_call_latency: f64,
    pub min_lockwait_latency: f64,
    pub avg_lockwait_latency: f64,
    pub max_lockwait_latency: f64,
}

type StatField = ColumnField<ClusterStatistics>;

/// Column mapping for `statistics -Y`
pub const STATISTICS_FIELDS: &[StatField] = &[
    StatField::number("num_clients", ParseStrategy::Integer, |s, v| s.num_clients = v),
    StatField::number("num_recoveries", ParseStrategy::Integer, |s, v| s.num_recoveries = v),
    StatField::number("client_packets_sent", ParseStrategy::Integer, |s, v| s.client_packets_sent = v),
    StatField::number("client_packets_recv", ParseStrategy::Integer, |s, v| s.client_packets_recv = v),
    StatField::number("max_hop_count", ParseStrategy::Integer, |s, v| s.max_hop_count = v),
    StatField::number("num_call_latency", ParseStrategy::Integer, |s, v| s.num_call_latency = v),
    StatField::number("min_call_latency", ParseStrategy::Real, |s, v| s.min_call_latency = v),
    StatField::number("avg_call_latency", ParseStrategy::Real, |s, v| s.avg_call_latency = v),
    StatField::number("max_call_latency", ParseStrategy::Real, |s, v| s.max_call_latency = v),
    StatField::number("num_lockwait_latency", ParseStrategy::Integer, |s, v| s.num_lockwait_latency = v),
    StatField::number("min_lockwait_latency", ParseStrategy::Real, |s, v| s.min_lockwait_latency = v),
    StatField::number("avg_lockwait_latency", ParseStrategy::Real, |s, v| s.avg_lockwait_latency = v),
    StatField::number("max_lockwait_latency", ParseStrategy::Real, |s, v| s.max_lockwait_latency = v),
];

/// Parse a two-line `statistics -Y` table
///
/// Fails if there is no data line. Only the first data line is decoded.
pub fn parse_statistics_record(raw: &str) -> Result<ClusterStatistics> {
    let table = PipeTable::parse(COMMAND, raw)?;

    let Some((row, extra)) = table.rows().split_first() else {
        return Err(CtdbError::MalformedOutput {
            command: COMMAND.to_string(),
            expected: 2,
            actual: table.line_count(),
        });
    };
    if !extra.is_empty() {
        warn!(ignored = extra.len(), "statistics output has more than one data line");
    }

    Ok(table.decode_row(row, STATISTICS_FIELDS))
}

/// Run `ctdb statistics -Y` and parse the result
pub fn scrape_statistics<R: CtdbCommands + ?Sized>(runner: &R) -> Result<ClusterStatistics> {
    let raw = runner.statistics()?;
    parse_statistics_record(&raw)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::client::runner::testing::ScriptedRunner;

    /// Captured from ctdb 4.11
    const STATISTICS_OUTPUT: &str = "CTDB version|Current time of statistics|Statistics collected since|num_clients|frozen|recovering|num_recoveries|client_packets_sent|client_packets_recv|node_packets_sent|node_packets_recv|keepalive_packets_sent|keepalive_packets_recv|node.req_call|node.reply_call|node.req_dmaster|node.reply_dmaster|node.reply_error|node.req_message|node.req_control|node.reply_control|node.req_tunnel|client.req_call|client.req_message|client.req_control|client.req_tunnel|timeouts.call|timeouts.control|timeouts.traverse|locks.num_calls|locks.num_current|locks.num_pending|locks.num_failed|total_calls|pending_calls|childwrite_calls|pending_childwrite_calls|memory_used|max_hop_count|total_ro_delegations|total_ro_revokes|num_reclock_ctdbd_latency|min_reclock_ctdbd_latency|avg_reclock_ctdbd_latency|max_reclock_ctdbd_latency|num_reclock_recd_latency|min_reclock_recd_latency|avg_reclock_recd_latency|max_reclock_recd_latency|num_call_latency|min_call_latency|avg_call_latency|max_call_latency|num_lockwait_latency|min_lockwait_latency|avg_lockwait_latency|max_lockwait_latency|num_childwrite_latency|min_childwrite_latency|avg_childwrite_latency|max_childwrite_latency|\n1|1588091528|1588085478|46|0|0|5|400051|459095|857734|353214|3620|3620|125059|0|43553|82128|0|26998|331404|217203|0|155646|9847|294440|0|0|0|1|905|0|0|0|155646|0|0|0|212806|2|0|0|5|0.004952|0.011306|0.030810|1|0.004096|0.004096|0.004096|154808|0.000004|0.001244|0.438651|905|0.002878|0.004589|0.036985|0|0.000000|0.000000|0.000000|";

    #[test]
    fn test_parse_captured_output() {
        let stats = parse_statistics_record(STATISTICS_OUTPUT).unwrap();

        assert_eq!(
            stats,
            ClusterStatistics {
                num_clients: 46.0,
                num_recoveries: 5.0,
                client_packets_sent: 400051.0,
                client_packets_recv: 459095.0,
                max_hop_count: 2.0,
                num_call_latency: 154808.0,
                min_call_latency: 0.000004,
                avg_call_latency: 0.001244,
                max_call_latency: 0.438651,
                num_lockwait_latency: 905.0,
                min_lockwait_latency: 0.002878,
                avg_lockwait_latency: 0.004589,
                max_lockwait_latency: 0.036985,
            }
        );
    }

    #[test]
    fn test_missing_columns_default_to_zero() {
        let stats = parse_statistics_record("num_clients|frozen|\n3|0|").unwrap();

        assert_eq!(stats.num_clients, 3.0);
        assert_eq!(
            stats,
            ClusterStatistics {
                num_clients: 3.0,
                ..ClusterStatistics::default()
            }
        );
    }

    #[test]
    fn test_bad_values_are_skipped() {
        let raw = "num_clients|num_recoveries|min_call_latency|avg_call_latency|\nlots|7|fast|0.5|";
        let stats = parse_statistics_record(raw).unwrap();

        assert_eq!(stats.num_clients, 0.0);
        assert_eq!(stats.num_recoveries, 7.0);
        assert_eq!(stats.min_call_latency, 0.0);
        assert_eq!(stats.avg_call_latency, 0.5);
    }

    #[test]
    fn test_integer_columns_reject_fractions() {
        let stats = parse_statistics_record("max_hop_count|\n2.5|").unwrap();
        assert_eq!(stats.max_hop_count, 0.0);
    }

    #[test]
    fn test_column_order_independence() {
        let ordered = "num_clients|min_call_latency|max_hop_count\n4|0.25|3";
        let permuted = "max_hop_count|num_clients|min_call_latency\n3|4|0.25";

        assert_eq!(
            parse_statistics_record(ordered).unwrap(),
            parse_statistics_record(permuted).unwrap()
        );
    }

    #[test]
    fn test_header_only_is_malformed() {
        let err = parse_statistics_record("num_clients|frozen|").unwrap_err();

        assert!(matches!(
            err,
            CtdbError::MalformedOutput {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_output_is_error() {
        assert!(matches!(
            parse_statistics_record(""),
            Err(CtdbError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn test_extra_rows_use_first() {
        let stats = parse_statistics_record("num_clients\n1\n2").unwrap();
        assert_eq!(stats.num_clients, 1.0);
    }

    #[test]
    fn test_scrape_statistics_via_runner() {
        let runner = ScriptedRunner::new().respond("statistics -Y", STATISTICS_OUTPUT);
        let stats = scrape_statistics(&runner).unwrap();

        assert_eq!(stats.num_clients, 46.0);
        assert_eq!(stats.min_call_latency, 0.000004);
        assert_eq!(stats.avg_call_latency, 0.001244);
        assert_eq!(runner.calls(), vec!["statistics -Y"]);
    }
}
