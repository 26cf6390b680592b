//! Per-view render functions. Each decodes its payload and returns the
//! complete block list for the view; none of them touch the network.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::format;
use super::{Bar, Block, Cell, Row};
use crate::model::{
    Alert, DashboardMetrics, DashboardSnapshot, LogEntry, LogsSnapshot, ReportSnapshot,
};
use crate::view::Payload;

pub const LABEL_CRITICAL: &str = "Critical Alerts";
pub const LABEL_EPS: &str = "Events / Sec";
pub const LABEL_UNASSIGNED: &str = "Unassigned Alerts";

pub const NO_TOP_SOURCES: &str = "No top sources data.";
pub const NO_VOLUME: &str = "No event volume data.";
pub const NO_TREND: &str = "No alert trend data.";
pub const NO_RECENT_EVENTS: &str = "No recent events.";
pub const RECENT_EVENTS_FAILED: &str = "Failed to load recent events.";
pub const NO_LOGS: &str = "No logs found matching your criteria.";
pub const NO_ALERTS: &str = "No open alerts.";
pub const NO_REPORT: &str = "Select a report to generate.";

pub const ALERT_COLUMNS: [&str; 6] = ["Severity", "Timestamp", "Description", "Source IP/Host", "Status", "ID"];

fn decode<T: DeserializeOwned>(payload: &Payload) -> Result<T, String> {
    T::deserialize(payload).map_err(|e| e.to_string())
}

pub fn render_dashboard(payload: &Payload) -> Result<Vec<Block>, String> {
    // Accept a bare metrics object too, as older loaders produced.
    let snapshot: DashboardSnapshot = if payload.get("metrics").is_some() {
        decode(payload)?
    } else {
        DashboardSnapshot {
            metrics: decode(payload)?,
            recent_events: Some(Vec::new()),
        }
    };
    let m = &snapshot.metrics;

    let mut blocks = vec![
        Block::Stat {
            label: LABEL_CRITICAL.to_string(),
            value: m.critical_alerts_count.to_string(),
        },
        Block::Stat {
            label: LABEL_EPS.to_string(),
            value: m.eps_count.to_string(),
        },
        Block::Stat {
            label: LABEL_UNASSIGNED.to_string(),
            value: m.unassigned_alerts_count.to_string(),
        },
    ];

    if m.top_sources.is_empty() {
        blocks.push(Block::Empty(NO_TOP_SOURCES.to_string()));
    } else {
        blocks.push(Block::List {
            title: "Top Sources".to_string(),
            items: m
                .top_sources
                .iter()
                .map(|s| format!("{} ({}%)", s.name, format::number(s.percentage)))
                .collect(),
        });
    }

    blocks.push(volume_block(m));

    if m.alert_trend_data.is_empty() {
        blocks.push(Block::Empty(NO_TREND.to_string()));
    } else {
        blocks.push(Block::Trend {
            title: "Alerts Trend".to_string(),
            points: format::trend_points(&m.alert_trend_data),
        });
    }

    blocks.push(match &snapshot.recent_events {
        None => Block::Error(RECENT_EVENTS_FAILED.to_string()),
        Some(events) if events.is_empty() => Block::Empty(NO_RECENT_EVENTS.to_string()),
        Some(events) => Block::Lines {
            title: "Recent Security Events".to_string(),
            lines: events
                .iter()
                .map(|e| {
                    Cell::toned(
                        format!("[{}] [{}] {}", format::datetime(&e.timestamp), e.level, e.message),
                        format::level_tone(&e.level),
                    )
                })
                .collect(),
        },
    });

    Ok(blocks)
}

fn volume_block(m: &DashboardMetrics) -> Block {
    if m.event_volume_by_type.is_empty() {
        return Block::Empty(NO_VOLUME.to_string());
    }
    let mut buckets: BTreeMap<(u8, String), f64> = BTreeMap::new();
    for (key, count) in &m.event_volume_by_type {
        let bucket = format::volume_bucket(key);
        *buckets.entry((format::bucket_rank(&bucket), bucket)).or_insert(0.0) += count.count();
    }
    let counts: Vec<f64> = buckets.values().copied().collect();
    let shares = format::percent_shares(&counts);
    let bars = buckets
        .keys()
        .zip(shares)
        .map(|((_, label), percent)| Bar {
            label: label.clone(),
            percent,
            tone: format::bucket_tone(label),
        })
        .collect();
    Block::Bars {
        title: "Event Volume by Type".to_string(),
        bars,
    }
}

pub fn log_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "[{}] [{}] {}: {}",
        format::datetime(&entry.timestamp),
        entry.level,
        entry.source,
        entry.message
    );
    if let Some(host) = entry.host.as_deref().filter(|h| !h.is_empty()) {
        line.push_str(&format!(" (Host: {})", host));
    }
    if let Some(ip) = entry.source_ip_host.as_deref().filter(|h| !h.is_empty()) {
        line.push_str(&format!(" (Source IP: {})", ip));
    }
    line
}

pub fn render_logs(payload: &Payload) -> Result<Vec<Block>, String> {
    let snapshot: LogsSnapshot = if payload.is_array() {
        LogsSnapshot {
            logs: decode(payload)?,
            ..Default::default()
        }
    } else {
        decode(payload)?
    };

    let mut blocks = Vec::new();
    if !snapshot.filter.is_default() {
        let f = &snapshot.filter;
        blocks.push(Block::Text(format!(
            "Filter: \"{}\" | source: {} | level: {}",
            f.filter_text, f.source, f.level
        )));
    }
    if snapshot.logs.is_empty() {
        blocks.push(Block::Empty(NO_LOGS.to_string()));
    } else {
        blocks.push(Block::Lines {
            title: format!("{} log entries", snapshot.logs.len()),
            lines: snapshot
                .logs
                .iter()
                .map(|e| Cell::toned(log_line(e), format::level_tone(&e.level)))
                .collect(),
        });
    }
    Ok(blocks)
}

pub fn render_alerts(payload: &Payload) -> Result<Vec<Block>, String> {
    let alerts: Vec<Alert> = decode(payload)?;
    if alerts.is_empty() {
        return Ok(vec![Block::Empty(NO_ALERTS.to_string())]);
    }
    let rows = alerts
        .iter()
        .map(|a| Row {
            key: a.id.clone(),
            cells: vec![
                Cell::toned(a.severity.clone(), format::severity_tone(&a.severity)),
                Cell::plain(format::datetime(&a.timestamp)),
                Cell::plain(a.description.clone()),
                Cell::plain(a.source_ip_host.clone().unwrap_or_else(|| "N/A".to_string())),
                Cell::toned(a.status.clone(), format::status_tone(&a.status)),
                Cell::plain(a.id.clone()),
            ],
        })
        .collect();
    Ok(vec![Block::Table {
        columns: ALERT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }])
}

pub fn render_reports(payload: &Payload) -> Result<Vec<Block>, String> {
    if payload.is_null() {
        return Ok(vec![Block::Empty(NO_REPORT.to_string())]);
    }
    let snapshot: ReportSnapshot = decode(payload)?;
    let title = snapshot
        .report
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| snapshot.request.title());

    let body = match snapshot.report.get("report_content").and_then(Value::as_str) {
        Some(content) => content.to_string(),
        None => serde_json::to_string_pretty(&snapshot.report).map_err(|e| e.to_string())?,
    };
    Ok(vec![Block::Text(title), Block::Pre(body)])
}
