//! Wire shapes of the Data API.
//!
//! Decoding is lenient: missing optional fields default, and the aliases
//! different backend revisions emit (`_id`/`id`, `ip_address`) are accepted.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const ALL_SOURCES: &str = "All Sources";
pub const ALL_LEVELS: &str = "All Levels";

/// Status values offered by the alert workflow.
pub const ALERT_STATUSES: [&str; 3] = ["Open", "Investigating", "Closed"];

/// Standards the compliance report is usually generated for.
pub const COMPLIANCE_STANDARDS: [&str; 4] = ["GDPR", "HIPAA", "ISO 27001", "PCI DSS"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default)]
    pub critical_alerts_count: u64,
    #[serde(default)]
    pub eps_count: u64,
    #[serde(default)]
    pub unassigned_alerts_count: u64,
    #[serde(default)]
    pub top_sources: Vec<TopSource>,
    #[serde(default)]
    pub event_volume_by_type: BTreeMap<String, VolumeCount>,
    #[serde(default)]
    pub alert_trend_data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopSource {
    #[serde(alias = "source")]
    pub name: String,
    #[serde(default)]
    pub percentage: f64,
}

/// Event volume arrives either as a bare count or as `{count, percent}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VolumeCount {
    Plain(f64),
    Detailed {
        count: f64,
        #[serde(default)]
        percent: Option<f64>,
    },
}

impl VolumeCount {
    pub fn count(&self) -> f64 {
        match self {
            VolumeCount::Plain(n) => *n,
            VolumeCount::Detailed { count, .. } => *count,
        }
    }
}

/// What the dashboard view loads: metrics plus the recent events feed.
/// `recent_events` is `None` when that feed failed to load.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardSnapshot {
    pub metrics: DashboardMetrics,
    #[serde(default)]
    pub recent_events: Option<Vec<LogEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "ip_address")]
    pub source_ip_host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub filter_text: String,
    pub source: String,
    pub level: String,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            source: ALL_SOURCES.to_string(),
            level: ALL_LEVELS.to_string(),
        }
    }
}

impl LogFilter {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Logs view payload: the filter it was loaded with and the matching entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogsSnapshot {
    #[serde(default)]
    pub filter: LogFilter,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "_id", alias = "id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_ip_host: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestResponse {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub log_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub database_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportRequest {
    DailySummary,
    ComplianceAudit { standard: String },
}

impl ReportRequest {
    pub fn title(&self) -> String {
        match self {
            ReportRequest::DailySummary => "Daily Security Summary".to_string(),
            ReportRequest::ComplianceAudit { standard } => format!("Compliance Audit: {}", standard),
        }
    }
}

/// Reports view payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportSnapshot {
    pub request: ReportRequest,
    pub report: Value,
}

/// Accepts strings, numbers and booleans; `null` becomes empty.
fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(scalar_to_string(Value::deserialize(de)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_to_string(Value::deserialize(de)?))
}

fn scalar_to_string(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
