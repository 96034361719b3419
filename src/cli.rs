use crate::monitor::config;
use crate::monitor::types::CheckMethod;
use clap::Parser;

/// netwarden — host network-health monitor with webhook alerting and
/// firewall-based IP blocking.
///
/// Periodically samples traffic, latency, and packet loss toward a
/// target host, raises start/end alerts through a webhook API when
/// thresholds are exceeded, and blocks source IPs with abusive
/// connection patterns.
#[derive(Parser, Debug, Clone)]
#[command(
    name    = "netwarden",
    version = "0.1.0",
    about   = "Network health monitor with webhook alerting and IP blocking",
    long_about = None,
)]
pub struct Cli {
    // ── Target ───────────────────────────────────────────────────────────────

    /// Host or IP toward which latency and loss are probed, and which
    /// is named in alert payloads.
    #[arg(short = 't', long = "target", value_name = "HOST", default_value = "1.1.1.1")]
    pub target: String,

    /// Human-readable location tag carried in alert payloads so the
    /// receiving side can tell monitored sites apart.
    #[arg(short = 'l', long = "location", value_name = "NAME", default_value = "unspecified")]
    pub location: String,

    /// Which metric(s) participate in violation evaluation.
    #[arg(long = "check-method", value_enum, default_value_t = CheckMethod::All)]
    pub check_method: CheckMethod,

    // ── Sampling ─────────────────────────────────────────────────────────────

    /// Seconds between check cycles; also the span over which each
    /// traffic delta is measured.
    #[arg(long = "interval", value_name = "SECS", default_value_t = config::CHECK_INTERVAL)]
    pub interval: u64,

    /// Capacity of the traffic averaging window, in samples (one per
    /// cycle), independent of the interval length.
    #[arg(long = "window", value_name = "N", default_value_t = config::TRAFFIC_WINDOW)]
    pub window: usize,

    /// Restrict byte counting to this network interface.
    ///
    /// If omitted, counters are summed across all interfaces. Use
    /// `ip link` or `ifconfig` to list available interfaces.
    #[arg(short = 'i', long = "interface", value_name = "IFACE")]
    pub interface: Option<String>,

    // ── Thresholds ───────────────────────────────────────────────────────────

    /// Average bytes per interval above which traffic is abnormal.
    #[arg(long = "traffic-threshold", value_name = "BYTES", default_value_t = config::TRAFFIC_THRESHOLD)]
    pub traffic_threshold: f64,

    /// Round-trip latency (ms) above which the target is degraded.
    #[arg(long = "ping-threshold", value_name = "MS", default_value_t = config::PING_THRESHOLD)]
    pub ping_threshold: f64,

    /// Packet loss (percent) above which the target is degraded.
    #[arg(long = "loss-threshold", value_name = "PCT", default_value_t = config::PACKET_LOSS_THRESHOLD)]
    pub loss_threshold: f64,

    // ── Connection blocking ──────────────────────────────────────────────────

    /// Simultaneous connections from one source IP above which it is
    /// blocked outright.
    #[arg(long = "max-connections", value_name = "N", default_value_t = config::THRESHOLD_CONNECTIONS)]
    pub max_connections: u32,

    /// Sightings of one IP within the detection window that count as a
    /// suspicious burst.
    #[arg(long = "suspicious-threshold", value_name = "N", default_value_t = config::SUSPICIOUS_CONNECTIONS_THRESHOLD)]
    pub suspicious_threshold: usize,

    /// Detection window for suspicious bursts, in seconds.
    #[arg(long = "detection-window", value_name = "SECS", default_value_t = config::DETECTION_WINDOW)]
    pub detection_window: u64,

    /// How long a blocked IP stays blocked, in seconds. Expiry is
    /// checked lazily on each cycle, not on a timer.
    #[arg(long = "block-duration", value_name = "SECS", default_value_t = config::BLOCK_DURATION)]
    pub block_duration: u64,

    /// Disable the connection sweep and firewall blocking entirely,
    /// leaving only health monitoring and alerting.
    #[arg(long = "no-blocking")]
    pub no_blocking: bool,

    // ── API endpoints ────────────────────────────────────────────────────────

    /// Endpoint receiving incident start/end alerts (HTTP POST).
    #[arg(long = "alert-url", value_name = "URL", default_value = config::API_URL_ALERT)]
    pub alert_url: String,

    /// Endpoint receiving blocked-IP notifications (HTTP POST).
    #[arg(long = "block-url", value_name = "URL", default_value = config::API_URL_IP_BLOCKED)]
    pub block_url: String,

    /// Endpoint serving aggregate network statistics (HTTP GET).
    #[arg(long = "stats-url", value_name = "URL", default_value = config::API_URL_NETWORK_STATS)]
    pub stats_url: String,

    // ── Logging ──────────────────────────────────────────────────────────────

    /// Write log output to this file in addition to stdout.
    ///
    /// The file is created if it does not exist and appended to if it
    /// does. JSON mode (--json) affects the format written to this file
    /// as well.
    #[arg(short = 'o', long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Emit log entries as newline-delimited JSON (NDJSON).
    ///
    /// Each event is a self-contained JSON object on its own line,
    /// suitable for ingestion by log shippers or SIEM platforms.
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    // ── One-shot modes ───────────────────────────────────────────────────────

    /// Send a scripted start alert, wait a few seconds, send the
    /// matching end alert, then exit. Verifies API wiring without
    /// waiting for a real incident.
    #[arg(long = "test")]
    pub test: bool,

    /// Fetch the aggregate network statistics from the API, print them,
    /// then exit.
    #[arg(long = "stats")]
    pub stats: bool,
}
