//! Line commands understood by the terminal console.

use crate::error::CoordError;
use crate::model::{LogFilter, ReportRequest, ALERT_STATUSES, ALL_LEVELS, ALL_SOURCES, COMPLIANCE_STANDARDS};

const COMMANDS: &str = "\
commands:
  view <dashboard|logs|alerts|reports>
  refresh
  filter [text] [--source S] [--level L]
  ingest <raw log line>
  status <alert-id> <status>
  report daily
  report compliance <standard>
  help
  quit";

pub fn help() -> String {
    format!(
        "{}\nstatuses: {}\nstandards: {}",
        COMMANDS,
        ALERT_STATUSES.join(", "),
        COMPLIANCE_STANDARDS.join(", ")
    )
}

/// Returns the listed spelling of `input` when it matches one ignoring case.
/// Anything else passes through for the backend to judge.
fn canonical(input: &str, known: &[&str]) -> String {
    known
        .iter()
        .find(|k| k.eq_ignore_ascii_case(input))
        .map_or_else(|| input.to_string(), |k| k.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    View(String),
    Refresh,
    Filter(LogFilter),
    Ingest(String),
    Status { alert_id: String, status: String },
    Report(ReportRequest),
    Help,
    Quit,
}

fn usage(msg: &str) -> CoordError {
    CoordError::InvalidInput(msg.to_string())
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CoordError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let cmd = match head.to_ascii_lowercase().as_str() {
        "view" | "go" => {
            if rest.is_empty() {
                return Err(usage("usage: view <dashboard|logs|alerts|reports>"));
            }
            Command::View(rest.to_ascii_lowercase())
        }
        "refresh" | "r" => Command::Refresh,
        "filter" => Command::Filter(parse_filter(rest)?),
        // Raw log text is kept verbatim; the console rejects it if blank.
        "ingest" => Command::Ingest(rest.to_string()),
        "status" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            match (parts.next().filter(|s| !s.is_empty()), parts.next().map(str::trim)) {
                (Some(id), Some(status)) if !status.is_empty() => Command::Status {
                    alert_id: id.to_string(),
                    status: canonical(status, &ALERT_STATUSES),
                },
                _ => return Err(usage("usage: status <alert-id> <status>")),
            }
        }
        "report" => Command::Report(parse_report(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(usage(&format!("unknown command {:?}; type help", other))),
    };
    Ok(Some(cmd))
}

fn parse_filter(rest: &str) -> Result<LogFilter, CoordError> {
    let mut text = Vec::new();
    let mut source: Option<Vec<&str>> = None;
    let mut level: Option<Vec<&str>> = None;
    let mut in_flag: Option<&str> = None;

    for token in rest.split_whitespace() {
        match (token, in_flag) {
            ("--source", _) => {
                source = Some(Vec::new());
                in_flag = Some(token);
            }
            ("--level", _) => {
                level = Some(Vec::new());
                in_flag = Some(token);
            }
            (_, Some("--source")) => source.get_or_insert_with(Vec::new).push(token),
            (_, Some(_)) => level.get_or_insert_with(Vec::new).push(token),
            (_, None) => text.push(token),
        }
    }

    Ok(LogFilter {
        filter_text: text.join(" "),
        source: flag_value(source, "--source", ALL_SOURCES)?,
        level: flag_value(level, "--level", ALL_LEVELS)?,
    })
}

fn flag_value(values: Option<Vec<&str>>, name: &str, all: &str) -> Result<String, CoordError> {
    match values {
        None => Ok(all.to_string()),
        Some(v) if v.is_empty() => Err(usage(&format!("{} needs a value", name))),
        Some(v) if v.len() == 1 && v[0].eq_ignore_ascii_case("all") => Ok(all.to_string()),
        Some(v) => Ok(v.join(" ")),
    }
}

fn parse_report(rest: &str) -> Result<ReportRequest, CoordError> {
    let (kind, arg) = match rest.split_once(char::is_whitespace) {
        Some((kind, arg)) => (kind, arg.trim()),
        None => (rest, ""),
    };
    match kind.to_ascii_lowercase().as_str() {
        "daily" => Ok(ReportRequest::DailySummary),
        "compliance" if !arg.is_empty() => Ok(ReportRequest::ComplianceAudit {
            standard: canonical(arg, &COMPLIANCE_STANDARDS),
        }),
        "compliance" => Err(usage("usage: report compliance <standard>")),
        _ => Err(usage("usage: report daily | report compliance <standard>")),
    }
}
