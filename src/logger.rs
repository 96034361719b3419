//! Structured logging for netwarden.
//!
//! Provides a [`Logger`] that writes events to stdout and optionally to
//! a log file. Output can be formatted as human-readable plain text or
//! as newline-delimited JSON (NDJSON), making it easy to ingest into
//! log shippers and SIEM platforms.

use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex};

// ── Event types ──────────────────────────────────────────────────────────────

/// All distinct event kinds that netwarden can emit.
///
/// Each variant carries exactly the fields needed to describe that
/// event. The `#[serde(tag = "event")]` attribute ensures JSON output
/// includes an `"event"` key so consumers can filter by type without
/// inspecting structure.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event<'a> {
    /// Informational startup / status message.
    Info { message: &'a str },

    /// One cycle's traffic reading and the rolling average.
    TrafficSample {
        interval_bytes: u64,
        average_bytes: f64,
        window_len: usize,
    },

    /// A latency or loss probe produced no reading.
    ProbeFailed { probe: &'a str, reason: &'a str },

    /// The rolling traffic average exceeded its threshold.
    HighTraffic { average_bytes: f64 },

    /// Round-trip latency toward the target exceeded its threshold.
    HighLatency { latency_ms: f64 },

    /// Packet loss toward the target exceeded its threshold.
    HighPacketLoss { loss_pct: f64 },

    /// An incident opened; a start alert is being delivered.
    IncidentStart { ip: &'a str, start_time: &'a str },

    /// The open incident cleared; an end alert is being delivered.
    IncidentEnd {
        ip: &'a str,
        start_time: &'a str,
        end_time: &'a str,
    },

    /// A source IP held more simultaneous connections than allowed.
    ConnectionFlood { ip: &'a str, connections: u32 },

    /// A source IP reappeared suspiciously often within the detection
    /// window.
    SuspiciousBurst { ip: &'a str, span_secs: f64 },

    /// A firewall block took effect.
    IpBlocked { ip: &'a str },

    /// A firewall block was lifted.
    IpUnblocked { ip: &'a str },

    /// A firewall command failed; bookkeeping was left untouched.
    FirewallError {
        action: &'a str,
        ip: &'a str,
        reason: &'a str,
    },

    /// A webhook delivery failed; the event is not retried.
    DeliveryFailed { endpoint: &'a str, reason: &'a str },

    /// Session summary emitted on graceful shutdown.
    SessionSummary {
        duration_secs: u64,
        cycles: u64,
        alerts_emitted: u64,
        ips_blocked: u64,
        probe_failures: u64,
        delivery_failures: u64,
    },
}

// ── Logger ───────────────────────────────────────────────────────────────────

/// Shared, thread-safe structured logger.
///
/// Constructed once in `main` and passed as an `Arc<Logger>` to every
/// module that needs to emit events. The internal `Mutex` serialises
/// file writes so lines are never interleaved.
pub struct Logger {
    /// Whether to format events as NDJSON instead of plain text.
    json: bool,
    /// Optional buffered file writer. `None` when `--log-file` was not given.
    file: Option<Mutex<BufWriter<std::fs::File>>>,
}

/// Type alias used throughout the codebase for convenience.
pub type SharedLogger = Arc<Logger>;

impl Logger {
    /// Creates a new logger.
    ///
    /// # Arguments
    /// * `json`     - Emit NDJSON instead of plain text when `true`.
    /// * `log_path` - If `Some`, open (or create) this file for appended writes.
    ///
    /// # Errors
    /// Returns an `io::Error` if the log file cannot be opened or created.
    pub fn new(json: bool, log_path: Option<&str>) -> io::Result<Self> {
        let file = match log_path {
            Some(path) => {
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Mutex::new(BufWriter::new(f)))
            }
            None => None,
        };

        Ok(Self { json, file })
    }

    /// Logs a single [`Event`], writing to stdout and optionally to the
    /// log file.
    ///
    /// Plain-text output is prefixed with a timestamp and the event tag.
    /// NDJSON output is a single JSON object per line with a
    /// `"timestamp"` field injected alongside the event fields.
    pub fn log(&self, event: &Event) {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();

        let line = if self.json {
            // Serialise the event to a JSON Value so we can inject the timestamp.
            let mut val = serde_json::to_value(event).unwrap_or_default();
            if let Some(obj) = val.as_object_mut() {
                obj.insert(
                    "timestamp".to_string(),
                    serde_json::Value::String(timestamp.clone()),
                );
            }
            serde_json::to_string(&val).unwrap_or_default()
        } else {
            // Plain-text: "[TIMESTAMP] [TAG] human-readable description"
            format!("[{}] {}", timestamp, self.plain_text(event))
        };

        // Always write to stdout.
        println!("{}", line);

        // If a log file was configured, also write there.
        if let Some(mutex) = &self.file {
            if let Ok(mut writer) = mutex.lock() {
                let _ = writeln!(writer, "{}", line);
                let _ = writer.flush();
            }
        }
    }

    /// Formats an [`Event`] as a human-readable plain-text string (no timestamp).
    fn plain_text(&self, event: &Event) -> String {
        match event {
            Event::Info { message } =>
                format!("[INFO] {}", message),

            Event::TrafficSample { interval_bytes, average_bytes, window_len } =>
                format!(
                    "[TRAFFIC] interval={}B avg={:.0}B over {} samples",
                    interval_bytes, average_bytes, window_len
                ),

            Event::ProbeFailed { probe, reason } =>
                format!("[PROBE] {} probe failed: {}", probe, reason),

            Event::HighTraffic { average_bytes } =>
                format!("[HIGH TRAFFIC] average {:.0} bytes/interval", average_bytes),

            Event::HighLatency { latency_ms } =>
                format!("[HIGH LATENCY] {:.1}ms", latency_ms),

            Event::HighPacketLoss { loss_pct } =>
                format!("[HIGH LOSS] {:.1}%", loss_pct),

            Event::IncidentStart { ip, start_time } =>
                format!("[ALERT START] {} at {}", ip, start_time),

            Event::IncidentEnd { ip, start_time, end_time } =>
                format!("[ALERT END] {} from {} to {}", ip, start_time, end_time),

            Event::ConnectionFlood { ip, connections } =>
                format!("[FLOOD] {} holds {} connections", ip, connections),

            Event::SuspiciousBurst { ip, span_secs } =>
                format!("[BURST] {} seen repeatedly over {:.1}s", ip, span_secs),

            Event::IpBlocked { ip } =>
                format!("[BLOCKED] {}", ip),

            Event::IpUnblocked { ip } =>
                format!("[UNBLOCKED] {}", ip),

            Event::FirewallError { action, ip, reason } =>
                format!("[FIREWALL] {} {} failed: {}", action, ip, reason),

            Event::DeliveryFailed { endpoint, reason } =>
                format!("[DELIVERY] {} failed: {}", endpoint, reason),

            Event::SessionSummary {
                duration_secs, cycles, alerts_emitted, ips_blocked, probe_failures, delivery_failures
            } => format!(
                "[SUMMARY] duration={}s cycles={} alerts={} blocked={} probe_failures={} delivery_failures={}",
                duration_secs, cycles, alerts_emitted, ips_blocked, probe_failures, delivery_failures
            ),
        }
    }
}
