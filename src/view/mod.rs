use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

pub mod panels;
mod registry;

pub use registry::ViewRegistry;

/// JSON backing a view's rendered state. Its shape is view-specific.
pub type Payload = Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
    pub const DASHBOARD: &'static str = "dashboard";
    pub const LOGS: &'static str = "logs";
    pub const ALERTS: &'static str = "alerts";
    pub const REPORTS: &'static str = "reports";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Notifications that make dependent views reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshEvent {
    AlertStatusChanged,
    LogIngested,
    LogFilterChanged,
    ReportRequested,
}

impl RefreshEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshEvent::AlertStatusChanged => "alert_status_changed",
            RefreshEvent::LogIngested => "log_ingested",
            RefreshEvent::LogFilterChanged => "log_filter_changed",
            RefreshEvent::ReportRequested => "report_requested",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Poll period while the view is active. `None` means no polling.
    pub interval: Option<Duration>,
    pub refresh_on: Vec<RefreshEvent>,
}

impl RefreshPolicy {
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn every(interval: Option<Duration>) -> Self {
        Self {
            interval,
            refresh_on: Vec::new(),
        }
    }

    pub fn on(mut self, event: RefreshEvent) -> Self {
        if !self.refresh_on.contains(&event) {
            self.refresh_on.push(event);
        }
        self
    }

    pub fn listens_to(&self, event: RefreshEvent) -> bool {
        self.refresh_on.contains(&event)
    }
}

/// One navigable panel.
///
/// `load` fetches the view's payload; the handler hooks bracket the period
/// during which the view accepts user actions.
#[async_trait]
pub trait View: Send + Sync {
    fn id(&self) -> ViewId;

    async fn load(&self) -> Result<Payload, ClientError>;

    fn attach_handlers(&self) {}

    fn detach_handlers(&self) {}
}
