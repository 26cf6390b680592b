use async_trait::async_trait;
use serde_json::{json, Value};

use super::{DataClient, RequestOptions};
use crate::error::ClientError;
use crate::model::{BackendStatus, IngestResponse, LogFilter, StatusUpdate};

/// The Data API as the views and actions see it.
///
/// Read endpoints return raw JSON: views hand it to the renderer as an opaque
/// payload. Mutations decode their small acknowledgement shapes.
#[async_trait]
pub trait SiemApi: Send + Sync {
    async fn status(&self) -> Result<BackendStatus, ClientError>;
    async fn dashboard_metrics(&self) -> Result<Value, ClientError>;
    async fn recent_logs(&self) -> Result<Value, ClientError>;
    async fn filter_logs(&self, filter: &LogFilter) -> Result<Value, ClientError>;
    async fn ingest_log(&self, raw_log: &str) -> Result<IngestResponse, ClientError>;
    async fn open_alerts(&self) -> Result<Value, ClientError>;
    async fn update_alert_status(&self, alert_id: &str, status: &str) -> Result<StatusUpdate, ClientError>;
    async fn daily_summary(&self) -> Result<Value, ClientError>;
    async fn compliance_audit(&self, standard: &str) -> Result<Value, ClientError>;
}

pub struct HttpSiemApi {
    client: DataClient,
}

impl HttpSiemApi {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }
}

/// `/alerts/{id}/status`, with the id confined to a single path segment.
fn status_endpoint(alert_id: &str) -> String {
    format!("/alerts/{}/status", urlencoding::encode(alert_id))
}

#[async_trait]
impl SiemApi for HttpSiemApi {
    async fn status(&self) -> Result<BackendStatus, ClientError> {
        self.client.request_as("/status", RequestOptions::get()).await
    }

    async fn dashboard_metrics(&self) -> Result<Value, ClientError> {
        self.client.request("/dashboard/metrics", RequestOptions::get()).await
    }

    async fn recent_logs(&self) -> Result<Value, ClientError> {
        self.client.request("/logs/recent", RequestOptions::get()).await
    }

    async fn filter_logs(&self, filter: &LogFilter) -> Result<Value, ClientError> {
        let body = json!({
            "filter_text": filter.filter_text,
            "source": filter.source,
            "level": filter.level,
        });
        self.client.request("/logs/filter", RequestOptions::post(body)).await
    }

    async fn ingest_log(&self, raw_log: &str) -> Result<IngestResponse, ClientError> {
        self.client
            .request_as("/logs/ingest", RequestOptions::post(json!({ "raw_log": raw_log })))
            .await
    }

    async fn open_alerts(&self) -> Result<Value, ClientError> {
        self.client.request("/alerts/open", RequestOptions::get()).await
    }

    async fn update_alert_status(&self, alert_id: &str, status: &str) -> Result<StatusUpdate, ClientError> {
        self.client
            .request_as(&status_endpoint(alert_id), RequestOptions::put(json!({ "status": status })))
            .await
    }

    async fn daily_summary(&self) -> Result<Value, ClientError> {
        self.client.request("/reports/daily_summary", RequestOptions::get()).await
    }

    async fn compliance_audit(&self, standard: &str) -> Result<Value, ClientError> {
        self.client
            .request("/reports/compliance_audit", RequestOptions::post(json!({ "standard": standard })))
            .await
    }
}
