//! Wires the views, renderer, scheduler and navigation into one console and
//! exposes the user actions (filtering, ingestion, alert status, reports).

use std::sync::Arc;

use serde_json::json;

use crate::client::api::SiemApi;
use crate::config::Config;
use crate::error::CoordError;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{BackendStatus, LogFilter, ReportRequest};
use crate::nav::NavigationController;
use crate::render::{panels, RenderFn, RenderTarget, ViewRenderer};
use crate::scheduler::{LoadHandle, RefreshScheduler};
use crate::view::panels::{AlertsView, DashboardView, LogsView, ReportsView};
use crate::view::{RefreshEvent, RefreshPolicy, ViewId, ViewRegistry};

pub const EMPTY_LOG_MESSAGE: &str = "Please enter a log to upload.";
pub const STATUS_UPDATE_FAILED: &str = "Alert status update failed";

/// Result of a user action: a message for the user and the reloads it set off.
#[derive(Debug)]
pub struct ActionOutcome {
    pub message: String,
    pub reloads: Vec<LoadHandle>,
}

impl ActionOutcome {
    /// Waits for every triggered reload to settle.
    pub async fn settle(self) -> String {
        for handle in self.reloads {
            handle.outcome().await;
        }
        self.message
    }
}

pub struct Console {
    api: Arc<dyn SiemApi>,
    scheduler: Arc<RefreshScheduler>,
    nav: NavigationController,
    logs: Arc<LogsView>,
    alerts: Arc<AlertsView>,
    reports: Arc<ReportsView>,
}

impl Console {
    /// Registers the four views with refresh policies from `cfg` and mounts a
    /// target for each from `make_target`.
    pub fn new(
        cfg: &Config,
        api: Arc<dyn SiemApi>,
        mut make_target: impl FnMut(&ViewId) -> Box<dyn RenderTarget>,
    ) -> Self {
        let registry = Arc::new(ViewRegistry::new());
        let renderer = Arc::new(ViewRenderer::new());

        let dashboard = Arc::new(DashboardView::new(api.clone()));
        let logs = Arc::new(LogsView::new(api.clone()));
        let alerts = Arc::new(AlertsView::new(api.clone()));
        let reports = Arc::new(ReportsView::new(api.clone()));

        registry.register(
            dashboard,
            RefreshPolicy::every(cfg.dashboard_interval())
                .on(RefreshEvent::AlertStatusChanged)
                .on(RefreshEvent::LogIngested),
        );
        registry.register(
            logs.clone(),
            RefreshPolicy::every(cfg.logs_interval())
                .on(RefreshEvent::LogFilterChanged)
                .on(RefreshEvent::LogIngested),
        );
        registry.register(
            alerts.clone(),
            RefreshPolicy::every(cfg.alerts_interval()).on(RefreshEvent::AlertStatusChanged),
        );
        registry.register(reports.clone(), RefreshPolicy::manual().on(RefreshEvent::ReportRequested));

        let mounts: [(&str, &str, RenderFn); 4] = [
            (ViewId::DASHBOARD, "Dashboard", panels::render_dashboard),
            (ViewId::LOGS, "Log Explorer", panels::render_logs),
            (ViewId::ALERTS, "Alerts", panels::render_alerts),
            (ViewId::REPORTS, "Reports", panels::render_reports),
        ];
        for (id, title, render) in mounts {
            let id = ViewId::new(id);
            let target = make_target(&id);
            renderer.mount(id, title, render, target);
        }

        let scheduler = Arc::new(RefreshScheduler::new(registry.clone(), renderer.clone()));
        let nav = NavigationController::new(registry, renderer, scheduler.clone());
        Self {
            api,
            scheduler,
            nav,
            logs,
            alerts,
            reports,
        }
    }

    pub fn activate(&self, id: &str) -> Result<LoadHandle, CoordError> {
        self.nav.activate(&ViewId::new(id))
    }

    pub fn active(&self) -> Option<ViewId> {
        self.nav.active()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// Reloads the active view.
    pub fn refresh(&self) -> Result<LoadHandle, CoordError> {
        let id = self
            .nav
            .active()
            .ok_or_else(|| CoordError::InvalidInput("No view is active.".to_string()))?;
        self.scheduler.trigger_load(&id)
    }

    pub fn log_filter(&self) -> LogFilter {
        self.logs.filter()
    }

    pub fn set_log_filter(&self, filter: LogFilter) -> Result<ActionOutcome, CoordError> {
        self.logs.set_filter(filter)?;
        Ok(self.emit(RefreshEvent::LogFilterChanged, "Filter applied."))
    }

    /// Uploads one raw log line. Blank input never reaches the backend.
    pub async fn ingest_log(&self, raw: &str) -> Result<ActionOutcome, CoordError> {
        if raw.trim().is_empty() {
            return Err(CoordError::InvalidInput(EMPTY_LOG_MESSAGE.to_string()));
        }
        let result = self.api.ingest_log(raw).await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let err = CoordError::Request(e);
                self.notify_active(&format!("Error uploading log: {}", err.display_message()));
                return Err(err);
            }
        };
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            self.notify_active(&format!("Error uploading log: {}", error));
            return Err(CoordError::Rejected(error));
        }

        let message = match response.log_id {
            Some(id) => format!("Log uploaded successfully! Log ID: {}", id),
            None => "Log uploaded successfully!".to_string(),
        };
        log(Level::Info, Domain::Action, "log_ingested", obj(&[("msg", v_str(&message))]));
        Ok(self.emit(RefreshEvent::LogIngested, message))
    }

    /// Changes an alert's status. Only allowed while the alerts view is active;
    /// on failure the current rows stay and the server's reason is shown.
    pub async fn update_alert_status(&self, alert_id: &str, status: &str) -> Result<ActionOutcome, CoordError> {
        self.alerts.ensure_attached()?;
        if alert_id.trim().is_empty() || status.trim().is_empty() {
            return Err(CoordError::InvalidInput("Alert id and status are required.".to_string()));
        }
        let alerts_id = ViewId::new(ViewId::ALERTS);
        let fields = obj(&[
            ("view_id", v_str(ViewId::ALERTS)),
            ("alert_id", v_str(alert_id)),
            ("status", v_str(status)),
        ]);

        match self.api.update_alert_status(alert_id, status).await {
            Ok(update) if update.success => {
                log(Level::Info, Domain::Action, "alert_status_updated", fields);
                let message = update
                    .message
                    .unwrap_or_else(|| format!("Alert {} marked {}", alert_id, status));
                Ok(self.emit(RefreshEvent::AlertStatusChanged, message))
            }
            Ok(update) => {
                let message = update.message.unwrap_or_else(|| STATUS_UPDATE_FAILED.to_string());
                log(Level::Warn, Domain::Action, "alert_status_rejected", fields);
                self.scheduler.report_notice(&alerts_id, &message);
                Err(CoordError::Rejected(message))
            }
            Err(e) => {
                let message = e.display_message();
                log(Level::Warn, Domain::Action, "alert_status_failed", fields);
                self.scheduler.report_notice(&alerts_id, &message);
                Err(CoordError::Request(e))
            }
        }
    }

    pub fn request_report(&self, request: ReportRequest) -> Result<ActionOutcome, CoordError> {
        let title = request.title();
        self.reports.set_request(request)?;
        Ok(self.emit(RefreshEvent::ReportRequested, format!("Generating {}...", title)))
    }

    pub async fn status(&self) -> Result<BackendStatus, CoordError> {
        Ok(self.api.status().await?)
    }

    fn emit(&self, event: RefreshEvent, message: impl Into<String>) -> ActionOutcome {
        ActionOutcome {
            message: message.into(),
            reloads: self.scheduler.on_external_event(event),
        }
    }

    fn notify_active(&self, message: &str) {
        match self.nav.active() {
            Some(id) => self.scheduler.report_notice(&id, message),
            None => log(
                Level::Warn,
                Domain::Action,
                "notice_dropped",
                obj(&[("msg", v_str(message)), ("active", json!(null))]),
            ),
        }
    }
}
