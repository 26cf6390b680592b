mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use common::MockBackend;
use siemdash::client::api::{HttpSiemApi, SiemApi};
use siemdash::client::DataClient;
use siemdash::model::{BackendStatus, IngestResponse, LogFilter, StatusUpdate};
use siemdash::render::panels::{self, LABEL_CRITICAL, LABEL_EPS, LABEL_UNASSIGNED};
use siemdash::render::{Block, Frame, MemoryProbe, MemoryTarget};
use siemdash::view::ViewId;
use siemdash::{ClientError, Config, Console, CoordError};

fn quiet_config(base: &str) -> Config {
    Config {
        api_base: base.to_string(),
        dashboard_refresh_secs: 0,
        alerts_refresh_secs: 0,
        logs_refresh_secs: 0,
        ..Config::default()
    }
}

fn build(cfg: &Config, api: Arc<dyn SiemApi>) -> (Console, HashMap<String, MemoryProbe>) {
    let mut probes = HashMap::new();
    let console = Console::new(cfg, api, |id| {
        let target = MemoryTarget::new();
        probes.insert(id.to_string(), target.probe());
        Box::new(target)
    });
    (console, probes)
}

fn http_console(backend: &MockBackend) -> (Console, HashMap<String, MemoryProbe>) {
    let cfg = quiet_config(&backend.base);
    let api = Arc::new(HttpSiemApi::new(DataClient::from_config(&cfg).unwrap()));
    build(&cfg, api)
}

fn last(probes: &HashMap<String, MemoryProbe>, id: &str) -> Frame {
    probes[id].last_frame().expect("view has rendered")
}

fn alert(id: &str, description: &str) -> Value {
    json!({
        "_id": id, "severity": "High", "timestamp": "2025-06-17T10:00:00Z",
        "description": description, "source_ip_host": "10.0.0.5", "status": "Open"
    })
}

#[tokio::test]
async fn dashboard_renders_metrics_scenario() {
    let backend = MockBackend::start().await;
    backend
        .route(
            "GET",
            "/dashboard/metrics",
            200,
            json!({
                "critical_alerts_count": 5, "eps_count": 120, "unassigned_alerts_count": 2,
                "top_sources": [{"name": "auth", "percentage": 80}],
                "event_volume_by_type": {"INFO": 70, "WARN": 20, "CRITICAL": 10},
                "alert_trend_data": [1, 2, 3, 4, 5, 6, 7]
            }),
        )
        .route("GET", "/logs/recent", 200, json!([]));
    let (console, probes) = http_console(&backend);

    assert!(console.activate(ViewId::DASHBOARD).unwrap().outcome().await.is_applied());

    let frame = last(&probes, "dashboard");
    assert_eq!(frame.stat(LABEL_CRITICAL), Some("5"));
    assert_eq!(frame.stat(LABEL_EPS), Some("120"));
    assert_eq!(frame.stat(LABEL_UNASSIGNED), Some("2"));

    let mut top_sources = 0;
    let mut bar_total = 0;
    let mut bar_count = 0;
    let mut trend_len = 0;
    for block in &frame.blocks {
        match block {
            Block::List { items, .. } => top_sources = items.len(),
            Block::Bars { bars, .. } => {
                bar_count = bars.len();
                bar_total = bars.iter().map(|b| b.percent).sum::<u32>();
            }
            Block::Trend { points, .. } => trend_len = points.len(),
            _ => {}
        }
    }
    assert_eq!(top_sources, 1);
    assert_eq!(bar_count, 3);
    assert_eq!(bar_total, 100);
    assert_eq!(trend_len, 7);
}

#[tokio::test]
async fn empty_log_filter_renders_empty_state() {
    let backend = MockBackend::start().await;
    backend.route("POST", "/logs/filter", 200, json!([]));
    let (console, probes) = http_console(&backend);

    assert!(console.activate(ViewId::LOGS).unwrap().outcome().await.is_applied());

    let frame = last(&probes, "logs");
    assert_eq!(frame.empty_message(), Some(panels::NO_LOGS));
    assert!(frame.table_rows().is_none());
    assert!(!frame.is_loading());
}

#[tokio::test]
async fn failed_status_update_keeps_rows_and_shows_message() {
    let backend = MockBackend::start().await;
    backend
        .route("GET", "/alerts/open", 200, json!([alert("123", "Brute force")]))
        .route(
            "PUT",
            "/alerts/123/status",
            404,
            json!({"success": false, "message": "not found"}),
        );
    let (console, probes) = http_console(&backend);
    console.activate(ViewId::ALERTS).unwrap().outcome().await;

    let err = console.update_alert_status("123", "Closed").await.unwrap_err();
    assert!(matches!(err, CoordError::Request(ClientError::Http { status: 404, .. })));

    let frame = last(&probes, "alerts");
    assert_eq!(frame.error(), Some("not found"));
    let rows = frame.table_rows().expect("rows kept");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "123");
    assert_eq!(backend.hits("GET", "/alerts/open"), 1);
}

#[tokio::test]
async fn unsuccessful_status_reply_with_ok_status_is_rejected() {
    let backend = MockBackend::start().await;
    backend
        .route("GET", "/alerts/open", 200, json!([alert("123", "Brute force")]))
        .route(
            "PUT",
            "/alerts/123/status",
            200,
            json!({"success": false, "message": "not found"}),
        );
    let (console, probes) = http_console(&backend);
    console.activate(ViewId::ALERTS).unwrap().outcome().await;

    let err = console.update_alert_status("123", "Closed").await.unwrap_err();
    assert!(matches!(err, CoordError::Rejected(ref m) if m == "not found"));
    assert_eq!(last(&probes, "alerts").table_rows().unwrap()[0].key, "123");
}

#[tokio::test]
async fn status_update_success_reloads_alerts() {
    let backend = MockBackend::start().await;
    backend
        .route("GET", "/alerts/open", 200, json!([alert("123", "Brute force")]))
        .route("GET", "/alerts/open", 200, json!([]))
        .route(
            "PUT",
            "/alerts/123/status",
            200,
            json!({"success": true, "message": "Alert status updated to Closed"}),
        );
    let (console, probes) = http_console(&backend);
    console.activate(ViewId::ALERTS).unwrap().outcome().await;

    let message = console.update_alert_status("123", "Closed").await.unwrap().settle().await;
    assert_eq!(message, "Alert status updated to Closed");
    assert_eq!(last(&probes, "alerts").empty_message(), Some(panels::NO_ALERTS));
}

#[tokio::test]
async fn exactly_one_target_visible_after_each_activation() {
    let backend = MockBackend::start().await;
    let (console, probes) = http_console(&backend);

    for id in ["dashboard", "alerts", "logs", "reports", "logs", "dashboard"] {
        console.activate(id).unwrap();
        let visible: Vec<&String> = probes.iter().filter(|(_, p)| p.is_visible()).map(|(k, _)| k).collect();
        assert_eq!(visible, vec![id]);
        assert_eq!(console.active(), Some(ViewId::new(id)));
    }
}

#[tokio::test]
async fn unknown_view_keeps_previous_active() {
    let backend = MockBackend::start().await;
    backend.route("POST", "/logs/filter", 200, json!([]));
    let (console, probes) = http_console(&backend);
    console.activate(ViewId::LOGS).unwrap().outcome().await;

    let err = console.activate("settings").unwrap_err();
    assert!(matches!(err, CoordError::UnknownView(ref id) if id.as_str() == "settings"));
    assert_eq!(console.active(), Some(ViewId::new(ViewId::LOGS)));
    assert!(probes["logs"].is_visible());
    assert!(console.set_log_filter(LogFilter::default()).is_ok());
}

#[tokio::test]
async fn earlier_load_resolving_late_is_dropped() {
    let backend = MockBackend::start().await;
    backend
        .route_delayed(
            "GET",
            "/alerts/open",
            json!([alert("old", "first response")]),
            Duration::from_millis(300),
        )
        .route("GET", "/alerts/open", 200, json!([alert("new", "second response")]));
    let (console, probes) = http_console(&backend);

    let first = console.activate(ViewId::ALERTS).unwrap();
    backend.wait_for_hits("GET", "/alerts/open", 1).await;
    let second = console.refresh().unwrap();
    assert!(second.token() > first.token());

    assert!(second.outcome().await.is_applied());
    assert!(first.outcome().await.is_stale());

    let frame = last(&probes, "alerts");
    let rows = frame.table_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "new");
    assert_eq!(console.scheduler().outstanding(&ViewId::new(ViewId::ALERTS)), None);
}

#[tokio::test]
async fn load_failure_renders_error_state() {
    let backend = MockBackend::start().await;
    backend.route("GET", "/alerts/open", 500, json!({"error": "database unavailable"}));
    let (console, probes) = http_console(&backend);

    console.activate(ViewId::ALERTS).unwrap().outcome().await;
    let frame = last(&probes, "alerts");
    assert!(!frame.is_loading());
    assert_eq!(frame.error(), Some("Failed to load alerts. database unavailable"));
}

#[tokio::test]
async fn ingest_refreshes_active_dashboard() {
    let backend = MockBackend::start().await;
    backend
        .route("GET", "/dashboard/metrics", 200, json!({"eps_count": 1}))
        .route("GET", "/logs/recent", 200, json!([]))
        .route("POST", "/logs/ingest", 201, json!({"log_id": "665f"}));
    let (console, _probes) = http_console(&backend);
    console.activate(ViewId::DASHBOARD).unwrap().outcome().await;

    let message = console.ingest_log("Jun 17 sshd: Accepted password").await.unwrap().settle().await;
    assert_eq!(message, "Log uploaded successfully! Log ID: 665f");
    assert_eq!(backend.hits("GET", "/dashboard/metrics"), 2);
}

#[tokio::test]
async fn dashboard_shows_recent_events_failure_inline() {
    let backend = MockBackend::start().await;
    backend
        .route("GET", "/dashboard/metrics", 200, json!({"critical_alerts_count": 3}))
        .route("GET", "/logs/recent", 500, json!({"error": "boom"}));
    let (console, probes) = http_console(&backend);

    assert!(console.activate(ViewId::DASHBOARD).unwrap().outcome().await.is_applied());
    let frame = last(&probes, "dashboard");
    assert_eq!(frame.stat(LABEL_CRITICAL), Some("3"));
    assert!(frame.blocks.contains(&Block::Error(panels::RECENT_EVENTS_FAILED.to_string())));
}

/// Counts alert loads; everything else is empty.
#[derive(Default)]
struct CountingApi {
    alert_loads: AtomicUsize,
}

#[async_trait]
impl SiemApi for CountingApi {
    async fn status(&self) -> Result<BackendStatus, ClientError> {
        Ok(BackendStatus::default())
    }
    async fn dashboard_metrics(&self) -> Result<Value, ClientError> {
        Ok(json!({}))
    }
    async fn recent_logs(&self) -> Result<Value, ClientError> {
        Ok(json!([]))
    }
    async fn filter_logs(&self, _filter: &LogFilter) -> Result<Value, ClientError> {
        Ok(json!([]))
    }
    async fn ingest_log(&self, _raw_log: &str) -> Result<IngestResponse, ClientError> {
        Ok(IngestResponse::default())
    }
    async fn open_alerts(&self) -> Result<Value, ClientError> {
        self.alert_loads.fetch_add(1, Ordering::SeqCst);
        Ok(json!([]))
    }
    async fn update_alert_status(&self, _id: &str, _status: &str) -> Result<StatusUpdate, ClientError> {
        Ok(StatusUpdate::default())
    }
    async fn daily_summary(&self) -> Result<Value, ClientError> {
        Ok(json!({}))
    }
    async fn compliance_audit(&self, _standard: &str) -> Result<Value, ClientError> {
        Ok(json!({}))
    }
}

#[tokio::test(start_paused = true)]
async fn alerts_poll_while_active_and_stop_on_navigation() {
    let api = Arc::new(CountingApi::default());
    let cfg = Config {
        alerts_refresh_secs: 15,
        ..quiet_config("http://127.0.0.1:5000/api")
    };
    let (console, _probes) = build(&cfg, api.clone());

    console.activate(ViewId::ALERTS).unwrap().outcome().await;
    assert_eq!(api.alert_loads.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(api.alert_loads.load(Ordering::SeqCst), 3);

    console.activate(ViewId::DASHBOARD).unwrap().outcome().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.alert_loads.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_periodic_halts_further_loads() {
    let api = Arc::new(CountingApi::default());
    let cfg = Config {
        alerts_refresh_secs: 10,
        ..quiet_config("http://127.0.0.1:5000/api")
    };
    let (console, _probes) = build(&cfg, api.clone());
    let alerts = ViewId::new(ViewId::ALERTS);

    console.activate(ViewId::ALERTS).unwrap().outcome().await;
    assert!(console.scheduler().is_periodic(&alerts));
    assert!(console.scheduler().stop_periodic(&alerts));

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(api.alert_loads.load(Ordering::SeqCst), 1);
}
