use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;

/// Selects which metrics participate in violation evaluation.
///
/// `All` is the default; the single-metric variants exist so that a
/// deployment can ignore readings it knows to be noisy (e.g. `traffic`
/// on a host whose upstream rate-limits ICMP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CheckMethod {
    All,
    Traffic,
    Ping,
    PacketLoss,
}

impl CheckMethod {
    pub fn includes_traffic(self) -> bool {
        matches!(self, CheckMethod::All | CheckMethod::Traffic)
    }

    pub fn includes_ping(self) -> bool {
        matches!(self, CheckMethod::All | CheckMethod::Ping)
    }

    pub fn includes_loss(self) -> bool {
        matches!(self, CheckMethod::All | CheckMethod::PacketLoss)
    }
}

/// Runtime-tunable health thresholds from CLI args.
///
/// All comparisons against these are strict (`>`): a reading exactly at
/// the threshold is still healthy.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Average bytes per interval above which traffic is abnormal.
    pub traffic_bytes: f64,
    /// Round-trip latency ceiling in milliseconds.
    pub ping_ms: f64,
    /// Packet-loss ceiling in percent.
    pub loss_pct: f64,
}

/// Runtime-tunable connection-abuse limits from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct AbuseLimits {
    /// Active connections from one IP above which it is blocked outright.
    pub max_connections: u32,
    /// Sightings kept per IP; also the burst trigger count.
    pub suspicious_threshold: usize,
    /// Span within which `suspicious_threshold` sightings form a burst.
    pub detection_window: Duration,
    /// How long a block lasts before lazy expiry lifts it.
    pub block_duration: Duration,
}

/// One cycle's worth of measurements. Immutable once recorded.
///
/// `latency_ms` and `loss_pct` are `None` when the probe failed, timed
/// out, produced unparseable output, or was excluded by the check
/// method. A missing reading is "no evidence", never a violation.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// Bytes transferred (sent + received) during the interval.
    pub interval_bytes: u64,
    /// Round-trip latency toward the target, if measured.
    pub latency_ms: Option<f64>,
    /// Packet loss toward the target in percent, if measured.
    pub loss_pct: Option<f64>,
}

/// A continuous period during which at least one monitored metric
/// exceeded its threshold.
///
/// Created on the violation edge with `end_time` unset; completed on
/// the all-clear edge. At most one incident is open at a time.
#[derive(Debug, Clone)]
pub struct Incident {
    /// The monitored target the incident refers to.
    pub ip: String,
    /// Human-readable location tag carried into alert payloads.
    pub location: String,
    /// ISO-8601 UTC timestamp of the violation edge.
    pub start_time: String,
    /// ISO-8601 UTC timestamp of the all-clear edge, once reached.
    pub end_time: Option<String>,
}

/// Current UTC time as an ISO-8601 string with an explicit `Z` marker,
/// the format the alert API expects.
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Running totals for the session, reported in the shutdown summary.
///
/// Plain atomics: the polling loop is single-threaded, but the Ctrl+C
/// handler and summary printer read these from other threads.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Completed check cycles.
    pub cycles_completed: AtomicU64,
    /// Start and end alerts emitted (edges, not degraded cycles).
    pub alerts_emitted: AtomicU64,
    /// IPs blocked through the firewall gateway.
    pub ips_blocked: AtomicU64,
    /// Latency/loss probes that produced no reading.
    pub probe_failures: AtomicU64,
    /// Webhook deliveries that failed.
    pub delivery_failures: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Type aliases used throughout the codebase for convenience.
pub type SharedStats = Arc<SessionStats>;
pub type ShutdownFlag = Arc<AtomicBool>;
