use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ClientError, CoordError};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};

pub mod api;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
        }
    }
}

/// Join `base` and `endpoint` with exactly one `/` between them.
pub fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// String bodies go out verbatim; everything else is JSON-encoded.
fn encode_body(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Error bodies are parsed as JSON when possible, otherwise kept as raw text.
fn parse_error_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Thin JSON-over-HTTP client for the Data API. Never retries.
#[derive(Clone)]
pub struct DataClient {
    client: Client,
    base: String,
}

impl DataClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, CoordError> {
        cfg.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CoordError::InvalidInput(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base: cfg.api_base.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn request(&self, endpoint: &str, opts: RequestOptions) -> Result<Value, ClientError> {
        let url = join_url(&self.base, endpoint);
        let started = Instant::now();
        log(
            Level::Debug,
            Domain::Http,
            "request",
            obj(&[("method", v_str(opts.method.as_str())), ("url", v_str(&url))]),
        );

        let mut req = self
            .client
            .request(opts.method.as_reqwest(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &opts.body {
            req = req.body(encode_body(body));
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                log(
                    Level::Warn,
                    Domain::Http,
                    "network_error",
                    obj(&[("url", v_str(&url)), ("msg", v_str(&e.to_string()))]),
                );
                return Err(ClientError::Network { cause: e.to_string() });
            }
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::Network { cause: e.to_string() })?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !status.is_success() {
            log(
                Level::Warn,
                Domain::Http,
                "http_error",
                obj(&[
                    ("url", v_str(&url)),
                    ("status", json!(status.as_u16())),
                    ("elapsed_ms", v_num(elapsed_ms)),
                ]),
            );
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: parse_error_body(&text),
            });
        }

        log(
            Level::Debug,
            Domain::Http,
            "response",
            obj(&[
                ("url", v_str(&url)),
                ("status", json!(status.as_u16())),
                ("bytes", json!(text.len())),
                ("elapsed_ms", v_num(elapsed_ms)),
            ]),
        );

        serde_json::from_str(&text).map_err(|e| ClientError::Decode { cause: e.to_string() })
    }

    /// Same as [`DataClient::request`], then decodes into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<T, ClientError> {
        let value = self.request(endpoint, opts).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode { cause: e.to_string() })
    }
}
