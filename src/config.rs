use std::time::Duration;

use url::Url;

use crate::error::CoordError;

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Data API, including the `/api` prefix.
    pub api_base: String,
    pub dashboard_refresh_secs: u64,
    pub alerts_refresh_secs: u64,
    pub logs_refresh_secs: u64,
    pub start_view: String,
    /// Transport-level timeout. 0 leaves requests unbounded.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000/api".to_string(),
            dashboard_refresh_secs: 30,
            alerts_refresh_secs: 15,
            logs_refresh_secs: 0,
            start_view: "dashboard".to_string(),
            request_timeout_secs: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: std::env::var("SIEM_API_BASE").unwrap_or(d.api_base),
            dashboard_refresh_secs: env_u64("DASH_REFRESH_SECS").unwrap_or(d.dashboard_refresh_secs),
            alerts_refresh_secs: env_u64("ALERTS_REFRESH_SECS").unwrap_or(d.alerts_refresh_secs),
            logs_refresh_secs: env_u64("LOGS_REFRESH_SECS").unwrap_or(d.logs_refresh_secs),
            start_view: std::env::var("START_VIEW").unwrap_or(d.start_view),
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS").unwrap_or(d.request_timeout_secs),
        }
    }

    /// Rejects a base URL that is not absolute http(s).
    pub fn validate(&self) -> Result<(), CoordError> {
        let parsed = Url::parse(&self.api_base)
            .map_err(|e| CoordError::InvalidInput(format!("SIEM_API_BASE {:?}: {}", self.api_base, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(CoordError::InvalidInput(format!(
                "SIEM_API_BASE must be http or https, got {}",
                other
            ))),
        }
    }

    pub fn dashboard_interval(&self) -> Option<Duration> {
        secs_to_interval(self.dashboard_refresh_secs)
    }

    pub fn alerts_interval(&self) -> Option<Duration> {
        secs_to_interval(self.alerts_refresh_secs)
    }

    pub fn logs_interval(&self) -> Option<Duration> {
        secs_to_interval(self.logs_refresh_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        secs_to_interval(self.request_timeout_secs)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn secs_to_interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
