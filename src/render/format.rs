//! Display helpers shared by the view renderers.

use chrono::{DateTime, Utc};

use super::{Tone, TrendPoint};

/// `YYYY-MM-DD HH:MM:SS` in UTC. Accepts RFC3339 and the RFC2822 form the
/// backend's JSON encoder emits; anything else is returned unchanged.
pub fn datetime(raw: &str) -> String {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}

/// Integers without a trailing `.0`, everything else to one decimal.
pub fn number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{:.1}", n)
    }
}

pub fn level_tone(level: &str) -> Tone {
    match level.trim().to_ascii_uppercase().as_str() {
        "INFO" => Tone::Ok,
        "WARN" | "WARNING" => Tone::Warn,
        "ERROR" | "ALERT" | "CRITICAL" => Tone::Danger,
        "AUTH" => Tone::Accent,
        "DEBUG" | "TRACE" => Tone::Muted,
        _ => Tone::Normal,
    }
}

pub fn severity_tone(severity: &str) -> Tone {
    match severity.trim().to_ascii_lowercase().as_str() {
        "critical" | "high" => Tone::Danger,
        "medium" => Tone::Warn,
        "low" => Tone::Info,
        _ => Tone::Muted,
    }
}

pub fn status_tone(status: &str) -> Tone {
    match status.trim().to_ascii_lowercase().as_str() {
        "open" => Tone::Warn,
        "closed" => Tone::Ok,
        "investigating" | "in progress" => Tone::Info,
        _ => Tone::Muted,
    }
}

/// Canonical event-volume bucket for a backend key.
pub fn volume_bucket(key: &str) -> String {
    let upper = key.trim().to_ascii_uppercase();
    match upper.as_str() {
        "WARN" | "WARNING" => "WARN".to_string(),
        "CRITICAL" | "ALERT" | "ALERT_CRITICAL" | "ALERT-CRITICAL" | "ALERT/CRITICAL" => {
            "ALERT/CRITICAL".to_string()
        }
        _ => upper,
    }
}

/// Sort rank for buckets: known levels first, unknown keys, then OTHER.
pub fn bucket_rank(bucket: &str) -> u8 {
    match bucket {
        "INFO" => 0,
        "WARN" => 1,
        "ERROR" => 2,
        "ALERT/CRITICAL" => 3,
        "OTHER" => 5,
        _ => 4,
    }
}

pub fn bucket_tone(bucket: &str) -> Tone {
    match bucket {
        "INFO" => Tone::Ok,
        "WARN" => Tone::Warn,
        "ERROR" | "ALERT/CRITICAL" => Tone::Danger,
        _ => Tone::Muted,
    }
}

/// Whole-number percentages that sum to exactly 100 when any count is
/// positive (largest-remainder rounding). All zero otherwise.
pub fn percent_shares(counts: &[f64]) -> Vec<u32> {
    let clean: Vec<f64> = counts
        .iter()
        .map(|c| if c.is_finite() && *c > 0.0 { *c } else { 0.0 })
        .collect();
    let total: f64 = clean.iter().sum();
    if total <= 0.0 {
        return vec![0; clean.len()];
    }

    let exact: Vec<f64> = clean.iter().map(|c| c / total * 100.0).collect();
    let mut shares: Vec<u32> = exact.iter().map(|e| e.floor() as u32).collect();
    let assigned: u32 = shares.iter().sum();
    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });
    for &i in order.iter().take(100u32.saturating_sub(assigned) as usize) {
        shares[i] += 1;
    }
    shares
}

/// Points spread evenly over the x axis, heights scaled to 90% of the max.
pub fn trend_points(values: &[f64]) -> Vec<TrendPoint> {
    let n = values.len();
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let value = if value.is_finite() { value } else { 0.0 };
            let x_pct = if n > 1 { i as f64 / (n - 1) as f64 * 100.0 } else { 0.0 };
            let y_pct = if max > 0.0 { (value.max(0.0) / max) * 90.0 } else { 0.0 };
            TrendPoint { value, x_pct, y_pct }
        })
        .collect()
}
