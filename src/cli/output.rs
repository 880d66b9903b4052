//! Output formatting helpers for CLI commands

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

use crate::protocol::{RequestLogEntry, RuleListing, StatEntry};
use crate::sync::{ChartSeries, SyncEvent};

/// View model for rule display
#[derive(Debug, Clone, Serialize)]
pub struct RuleView {
    pub id: u64,
    pub active: bool,
    pub pattern: String,
    pub multi_line: bool,
    pub label: String,
}

impl From<&RuleListing> for RuleView {
    fn from(rule: &RuleListing) -> Self {
        Self {
            id: rule.id,
            active: rule.active,
            pattern: rule.descriptor.pattern_lossy(),
            multi_line: rule.descriptor.flags() != 0,
            label: rule.label.clone(),
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Render Unix milliseconds as a UTC wall clock time.
pub fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Human-readable byte size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Format stats intervals as a table, oldest first
pub fn format_stats_table(stats: &[StatEntry]) -> String {
    let mut table = new_table(vec![
        "Interval End",
        "Requests",
        "Avg Latency",
        "Connections",
        "Connects",
        "Disconnects",
        "Timeouts",
        "Dropped",
        "Memory",
    ]);

    for s in stats {
        let timeouts = s.connect_timeouts + s.read_timeouts;
        let timeouts = if timeouts > 0 {
            timeouts.to_string().red().to_string()
        } else {
            timeouts.to_string()
        };

        table.add_row(vec![
            Cell::new(format_millis(s.timestamp)),
            Cell::new(s.requests),
            Cell::new(format!("{}µs", s.average_latency_micros())),
            Cell::new(s.connections),
            Cell::new(s.connects),
            Cell::new(s.disconnects),
            Cell::new(timeouts),
            Cell::new(s.dropped_log),
            Cell::new(format_bytes(s.memory_bytes)),
        ]);
    }

    table.to_string()
}

/// Format request log entries as a table, in the order given
pub fn format_requests_table(requests: &[RequestLogEntry]) -> String {
    let mut table = new_table(vec![
        "Status", "Method", "URI", "Query", "Version", "Size", "Latency", "User Agent",
    ]);

    for r in requests {
        let status = match r.status {
            200..=299 => r.status.to_string().green().to_string(),
            300..=399 => r.status.to_string().cyan().to_string(),
            400..=499 => r.status.to_string().yellow().to_string(),
            _ => r.status.to_string().red().to_string(),
        };
        let uri = if r.uri_requested.is_empty() || r.uri_requested == r.uri {
            r.uri.clone()
        } else {
            format!("{} → {}", r.uri_requested, r.uri)
        };

        table.add_row(vec![
            Cell::new(status),
            Cell::new(r.method),
            Cell::new(uri),
            Cell::new(&r.query),
            Cell::new(r.version),
            Cell::new(format_bytes(r.content_length)),
            Cell::new(format!("{}µs", r.latency_micros())),
            Cell::new(&r.user_agent),
        ]);
    }

    table.to_string()
}

/// Format chart series as a table, oldest bucket first
pub fn format_chart_table(series: &ChartSeries) -> String {
    let mut table = new_table(vec!["Bucket End", "Req/s", "Conn/s", "Avg Latency", "Memory"]);

    for i in 0..series.len() {
        table.add_row(vec![
            Cell::new(series.labels[i].format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{:.2}", series.requests_per_sec[i])),
            Cell::new(format!("{:.2}", series.connects_per_sec[i])),
            Cell::new(format!("{:.0}µs", series.avg_latency_micros[i])),
            Cell::new(format!("{:.1} MiB", series.memory_mib[i])),
        ]);
    }

    table.to_string()
}

/// Format chart series as JSON
pub fn format_chart_json(series: &ChartSeries) -> String {
    serde_json::to_string_pretty(&json!({ "chart": series })).unwrap_or_default()
}

/// Format rules as a table
pub fn format_rules_table(rules: &[RuleView]) -> String {
    let mut table = new_table(vec!["ID", "Active", "Pattern", "Multi-line", "Label"]);

    for r in rules {
        let active = if r.active {
            "✓".green().to_string()
        } else {
            "-".to_string()
        };

        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(active),
            Cell::new(&r.pattern),
            Cell::new(if r.multi_line { "yes" } else { "no" }),
            Cell::new(&r.label),
        ]);
    }

    table.to_string()
}

/// Format rules as JSON
pub fn format_rules_json(rules: &[RuleView]) -> String {
    serde_json::to_string_pretty(&json!({ "rules": rules })).unwrap_or_default()
}

/// One event per line, for piping into other tools
pub fn format_event_json(event: &SyncEvent) -> String {
    serde_json::to_string(event).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HttpMethod, HttpVersion, RuleDescriptor};

    fn create_test_stat() -> StatEntry {
        StatEntry {
            requests: 120,
            connections: 4,
            timestamp: 60_000,
            prev_timestamp: 0,
            latency_sum_micros: 1_200_000,
            memory_bytes: 3 * 1024 * 1024,
            ..Default::default()
        }
    }

    fn create_test_request() -> RequestLogEntry {
        RequestLogEntry {
            method: HttpMethod::Post,
            version: HttpVersion::Http20,
            content_length: 2048,
            start_micros: 1_000,
            end_micros: 1_250,
            status: 404,
            uri: "/missing".to_string(),
            query: "q=1".to_string(),
            user_agent: "curl/8.0".to_string(),
            referer: String::new(),
            uri_requested: "/old".to_string(),
        }
    }

    fn create_test_rule_view() -> RuleView {
        RuleView::from(&RuleListing {
            id: 42,
            descriptor: RuleDescriptor::pattern("^/admin", true),
            active: true,
            label: "admin probes".to_string(),
        })
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01 00:00:00");
        assert_eq!(format_millis(60_000), "1970-01-01 00:01:00");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_format_stats_table_with_data() {
        let output = format_stats_table(&[create_test_stat()]);
        assert!(output.contains("Requests"));
        assert!(output.contains("10000µs"));
        assert!(output.contains("3.0 MiB"));
    }

    #[test]
    fn test_format_requests_table_with_data() {
        let output = format_requests_table(&[create_test_request()]);
        assert!(output.contains("POST"));
        assert!(output.contains("HTTP/2.0"));
        assert!(output.contains("/old → /missing"));
        assert!(output.contains("250µs"));
    }

    #[test]
    fn test_format_chart_table() {
        let series = ChartSeries::from_points(&[crate::protocol::ChartPoint {
            requests: 120,
            latency_sum: 1_200_000,
            connects: 60,
            end: 60_000,
            start: 0,
            memory_bytes: 1_048_576,
        }]);
        let output = format_chart_table(&series);
        assert!(output.contains("2.00"));
        assert!(output.contains("1.0 MiB"));
    }

    #[test]
    fn test_rule_view_from_listing() {
        let view = create_test_rule_view();
        assert_eq!(view.pattern, "^/admin");
        assert!(view.multi_line);
    }

    #[test]
    fn test_format_rules_table_empty() {
        let output = format_rules_table(&[]);
        assert!(output.contains("Pattern")); // Header present
    }

    #[test]
    fn test_format_rules_json_valid() {
        let output = format_rules_json(&[create_test_rule_view()]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["rules"][0]["id"], 42);
        assert_eq!(parsed["rules"][0]["label"], "admin probes");
    }

    #[test]
    fn test_format_event_json() {
        let line = format_event_json(&SyncEvent::ServerTime(5));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "server_time");
        assert_eq!(parsed["data"], 5);

        let line = format_event_json(&SyncEvent::Closed);
        assert_eq!(line, r#"{"event":"closed"}"#);
    }
}
