//! The four console views and their loaders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Payload, View, ViewId};
use crate::client::api::SiemApi;
use crate::error::{ClientError, CoordError};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{LogFilter, ReportRequest};

/// Tracks whether a view currently accepts user actions.
#[derive(Debug, Default)]
struct Handlers {
    attached: AtomicBool,
}

impl Handlers {
    fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn ensure(&self, id: &str) -> Result<(), CoordError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(CoordError::ViewInactive(ViewId::new(id)))
        }
    }
}

pub struct DashboardView {
    api: Arc<dyn SiemApi>,
    handlers: Handlers,
}

impl DashboardView {
    pub fn new(api: Arc<dyn SiemApi>) -> Self {
        Self {
            api,
            handlers: Handlers::default(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.is_attached()
    }
}

#[async_trait]
impl View for DashboardView {
    fn id(&self) -> ViewId {
        ViewId::new(ViewId::DASHBOARD)
    }

    /// Metrics and recent events load concurrently. Only a metrics failure
    /// fails the load; a missing events feed renders as its own error line.
    async fn load(&self) -> Result<Payload, ClientError> {
        let (metrics, recent) = tokio::join!(self.api.dashboard_metrics(), self.api.recent_logs());
        let metrics = metrics?;
        let recent = match recent {
            Ok(events) => events,
            Err(e) => {
                log(
                    Level::Warn,
                    Domain::Load,
                    "recent_events_failed",
                    obj(&[("view_id", v_str(ViewId::DASHBOARD)), ("msg", v_str(&e.to_string()))]),
                );
                Value::Null
            }
        };
        Ok(json!({ "metrics": metrics, "recent_events": recent }))
    }

    fn attach_handlers(&self) {
        self.handlers.attach();
    }

    fn detach_handlers(&self) {
        self.handlers.detach();
    }
}

/// Log explorer. Owns the current filter; always loads through `/logs/filter`.
pub struct LogsView {
    api: Arc<dyn SiemApi>,
    filter: Mutex<LogFilter>,
    handlers: Handlers,
}

impl LogsView {
    pub fn new(api: Arc<dyn SiemApi>) -> Self {
        Self {
            api,
            filter: Mutex::new(LogFilter::default()),
            handlers: Handlers::default(),
        }
    }

    pub fn filter(&self) -> LogFilter {
        self.filter.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Replaces the filter. Only allowed while the view's handlers are attached.
    pub fn set_filter(&self, filter: LogFilter) -> Result<(), CoordError> {
        self.handlers.ensure(ViewId::LOGS)?;
        *self.filter.lock().unwrap_or_else(|p| p.into_inner()) = filter;
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.is_attached()
    }
}

#[async_trait]
impl View for LogsView {
    fn id(&self) -> ViewId {
        ViewId::new(ViewId::LOGS)
    }

    async fn load(&self) -> Result<Payload, ClientError> {
        // Snapshot first so the guard is gone before the request is awaited.
        let filter = self.filter();
        let logs = self.api.filter_logs(&filter).await?;
        Ok(json!({ "filter": filter, "logs": logs }))
    }

    fn attach_handlers(&self) {
        self.handlers.attach();
    }

    fn detach_handlers(&self) {
        self.handlers.detach();
    }
}

pub struct AlertsView {
    api: Arc<dyn SiemApi>,
    handlers: Handlers,
}

impl AlertsView {
    pub fn new(api: Arc<dyn SiemApi>) -> Self {
        Self {
            api,
            handlers: Handlers::default(),
        }
    }

    pub fn ensure_attached(&self) -> Result<(), CoordError> {
        self.handlers.ensure(ViewId::ALERTS)
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.is_attached()
    }
}

#[async_trait]
impl View for AlertsView {
    fn id(&self) -> ViewId {
        ViewId::new(ViewId::ALERTS)
    }

    async fn load(&self) -> Result<Payload, ClientError> {
        self.api.open_alerts().await
    }

    fn attach_handlers(&self) {
        self.handlers.attach();
    }

    fn detach_handlers(&self) {
        self.handlers.detach();
    }
}

/// Reports panel. Loads whichever report was last requested, if any.
pub struct ReportsView {
    api: Arc<dyn SiemApi>,
    request: Mutex<Option<ReportRequest>>,
    handlers: Handlers,
}

impl ReportsView {
    pub fn new(api: Arc<dyn SiemApi>) -> Self {
        Self {
            api,
            request: Mutex::new(None),
            handlers: Handlers::default(),
        }
    }

    pub fn request(&self) -> Option<ReportRequest> {
        self.request.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn set_request(&self, request: ReportRequest) -> Result<(), CoordError> {
        self.handlers.ensure(ViewId::REPORTS)?;
        if let ReportRequest::ComplianceAudit { standard } = &request {
            if standard.trim().is_empty() {
                return Err(CoordError::InvalidInput("Compliance standard not provided".to_string()));
            }
        }
        *self.request.lock().unwrap_or_else(|p| p.into_inner()) = Some(request);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.is_attached()
    }
}

#[async_trait]
impl View for ReportsView {
    fn id(&self) -> ViewId {
        ViewId::new(ViewId::REPORTS)
    }

    async fn load(&self) -> Result<Payload, ClientError> {
        let Some(request) = self.request() else {
            return Ok(Value::Null);
        };
        let report = match &request {
            ReportRequest::DailySummary => self.api.daily_summary().await?,
            ReportRequest::ComplianceAudit { standard } => self.api.compliance_audit(standard).await?,
        };
        Ok(json!({ "request": request, "report": report }))
    }

    fn attach_handlers(&self) {
        self.handlers.attach();
    }

    fn detach_handlers(&self) {
        self.handlers.detach();
    }
}
