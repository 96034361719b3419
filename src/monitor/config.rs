use std::time::Duration;

/// Default amount of traffic, in bytes per check interval, above which the
/// rolling average is considered abnormal.
///
/// 10 MB over a 15-second interval is roughly 5.3 Mbit/s of sustained
/// traffic. Hosts serving legitimate bulk transfers should raise this
/// on the command line rather than editing the source.
pub const TRAFFIC_THRESHOLD: f64 = 10_000_000.0;

/// Default round-trip latency ceiling toward the monitored target,
/// in milliseconds. Values above this mark the cycle as degraded.
pub const PING_THRESHOLD: f64 = 100.0;

/// Default packet-loss ceiling toward the monitored target, in percent.
pub const PACKET_LOSS_THRESHOLD: f64 = 10.0;

/// Seconds between check cycles.
///
/// The byte-counter measurement brackets this sleep, so it is also the
/// span over which each traffic delta is accumulated. Lowering it makes
/// detection more responsive but shrinks every per-interval delta
/// accordingly.
pub const CHECK_INTERVAL: u64 = 15;

/// Capacity of the traffic averaging window, in samples.
///
/// The window holds this many per-interval deltas, one per check cycle.
/// At the default 15-second interval, 120 samples cover half an hour of
/// history. The count is independent of the interval length.
pub const TRAFFIC_WINDOW: usize = 120;

/// How long a blocked IP stays blocked, in seconds.
///
/// Expiry is lazy: an expired block is lifted on the next sweep that
/// observes the IP, not on a timer.
pub const BLOCK_DURATION: u64 = 3600;

/// Active connections from a single source IP above which the IP is
/// blocked outright.
pub const THRESHOLD_CONNECTIONS: u32 = 100;

/// Number of recent sightings kept per source IP for burst detection.
///
/// Also the trigger count: once this many sightings fall inside
/// [`DETECTION_WINDOW`], the IP is blocked as a suspicious burst.
pub const SUSPICIOUS_CONNECTIONS_THRESHOLD: usize = 10;

/// Span, in seconds, within which [`SUSPICIOUS_CONNECTIONS_THRESHOLD`]
/// sightings of one IP count as a burst.
pub const DETECTION_WINDOW: u64 = 60;

/// Deadline handed to the single-echo latency probe, in seconds.
pub const PING_DEADLINE: u64 = 5;

/// Deadline handed to the multi-echo loss probe, in seconds.
pub const LOSS_DEADLINE: u64 = 10;

/// Number of echo requests issued by the loss probe.
pub const LOSS_PROBE_COUNT: u32 = 10;

/// Timeout for every webhook request. Delivery is fire-and-forget, so a
/// slow API must never stall the polling loop for longer than this.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between the scripted start and end alerts in `--test` mode,
/// in seconds.
pub const TEST_ALERT_DELAY: u64 = 5;

/// Default endpoint for incident start/end alerts.
pub const API_URL_ALERT: &str = "http://localhost:3000/ddos-alert";

/// Default endpoint for blocked-IP notifications.
pub const API_URL_IP_BLOCKED: &str = "http://localhost:3000/ip-blocked";

/// Default endpoint for aggregate network statistics.
pub const API_URL_NETWORK_STATS: &str = "http://localhost:3000/network-stats";
