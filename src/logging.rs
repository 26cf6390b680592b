//! Structured logging for the console coordinator.
//!
//! Every record is one JSON object per line with a run id, a sequence number
//! and a domain tag so a session can be filtered and replayed afterwards.
//! Records go to stderr because stdout belongs to the terminal renderer.
//! When `LOG_DIR` is set they are also appended under `<LOG_DIR>/<run_id>/`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Nav,    // View activation, visibility
    Load,   // Trigger, apply, stale drop, failure
    Http,   // Outbound requests to the Data API
    Render, // Frame replacement on targets
    Action, // User mutations (status, ingest, filter, reports)
    System, // Startup, shutdown, config
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Nav => "nav",
            Domain::Load => "load",
            Domain::Http => "http",
            Domain::Render => "render",
            Domain::Action => "action",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domain_listed(domains, self.as_str()),
        }
    }
}

fn domain_listed(list: &str, name: &str) -> bool {
    list.split(',').any(|d| d.trim() == name)
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

struct RunContext {
    run_id: String,
    min_level: Level,
    sink: Option<FileSink>,
}

/// Append-only JSONL files for one run.
struct FileSink {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

impl FileSink {
    fn open(dir: &Path) -> std::io::Result<Self> {
        create_dir_all(dir)?;
        let open = |name: &str| -> std::io::Result<Mutex<BufWriter<File>>> {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))?;
            Ok(Mutex::new(BufWriter::new(file)))
        };
        Ok(Self {
            events: open("events.jsonl")?,
            trace: open("trace.jsonl")?,
        })
    }

    fn write(&self, level: Level, line: &str) {
        let writer = match level {
            Level::Trace | Level::Debug => &self.trace,
            _ => &self.events,
        };
        let mut w = writer.lock().unwrap_or_else(|p| p.into_inner());
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let sink = std::env::var("LOG_DIR").ok().and_then(|base| {
            let mut dir = PathBuf::from(base);
            dir.push(&run_id);
            match FileSink::open(&dir) {
                Ok(sink) => Some(sink),
                Err(err) => {
                    eprintln!("[log] failed to open log dir {}: {}", dir.display(), err);
                    None
                }
            }
        });
        RunContext {
            run_id,
            min_level: Level::from_env(),
            sink,
        }
    })
}

// =============================================================================
// Record shaping
// =============================================================================

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "cookie", "Cookie", "api_key"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["view_id", "token", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn build_record(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) -> Value {
    let (mut top, data) = split_fields(sanitize_fields(fields));
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    if level < ctx.min_level || !domain.is_enabled() {
        return;
    }
    let line = build_record(&ctx.run_id, level, domain.as_str(), event, fields).to_string();
    if let Some(sink) = &ctx.sink {
        sink.write(level, &line);
    }
    eprintln!("{}", line);
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================
