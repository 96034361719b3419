//! Metric sampling: byte counters, latency/loss probes, connection
//! listing.
//!
//! The byte counters come from the OS interface table via `sysinfo`.
//! Latency, loss and the connection listing shell out to the platform
//! `ping` and `netstat` binaries; the [`Platform`] capability decides
//! the argument vectors once at startup so no OS branching leaks into
//! the monitoring logic.

use crate::logger::{Event, Logger};
use crate::monitor::config::{LOSS_DEADLINE, LOSS_PROBE_COUNT, PING_DEADLINE};
use crate::monitor::parsers::{parse_connection_counts, parse_loss_pct, parse_rtt_ms};
use crate::monitor::types::SharedStats;
use std::net::IpAddr;
use std::process::Command;
use std::sync::atomic::Ordering;
use sysinfo::Networks;

/// Host OS family, detected once at startup.
///
/// Carries the platform-specific command construction for the probe
/// and listing binaries. `detect` returns `None` on anything else, in
/// which case probes and blocking are skipped rather than attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    pub fn detect() -> Option<Platform> {
        match std::env::consts::OS {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::Macos),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }

    /// Argument vector for `ping` issuing `count` echoes with an
    /// overall deadline. The deadline rides on ping's own flags since
    /// `std::process` has no wait-timeout of its own.
    pub fn ping_args(self, host: &str, count: u32, deadline_secs: u64) -> Vec<String> {
        match self {
            Platform::Linux => vec![
                "-c".into(),
                count.to_string(),
                "-w".into(),
                deadline_secs.to_string(),
                host.to_string(),
            ],
            Platform::Macos => vec![
                "-c".into(),
                count.to_string(),
                "-t".into(),
                deadline_secs.to_string(),
                host.to_string(),
            ],
            Platform::Windows => vec![
                "-n".into(),
                count.to_string(),
                "-w".into(),
                (deadline_secs * 1000).to_string(),
                host.to_string(),
            ],
        }
    }

    /// Argument vector for the netstat connection listing.
    pub fn netstat_args(self) -> Vec<String> {
        match self {
            Platform::Linux => vec!["-ntu".into()],
            Platform::Macos => vec!["-an".into(), "-f".into(), "inet".into()],
            Platform::Windows => vec!["-n".into()],
        }
    }
}

/// Cumulative traffic sampler over the OS interface counters.
///
/// Reports the total of bytes sent and received across all interfaces,
/// or a single named interface when one was configured. Totals are
/// cumulative since boot; the monitor loop differences two readings to
/// get a per-interval delta.
pub struct TrafficSampler {
    networks: Networks,
    interface: Option<String>,
}

impl TrafficSampler {
    pub fn new(interface: Option<String>) -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            interface,
        }
    }

    /// Current cumulative byte total (sent + received).
    pub fn total_bytes(&mut self) -> u64 {
        self.networks.refresh();
        let wanted = self.interface.as_deref();
        self.networks
            .iter()
            .filter(|(name, _)| wanted.map_or(true, |w| name.as_str() == w))
            .map(|(_, data)| data.total_received() + data.total_transmitted())
            .sum()
    }
}

/// Measures round-trip latency toward `target` with a single echo.
///
/// `None` on command failure, non-zero exit, or missing time field;
/// each such outcome is logged and counted as a probe failure.
pub fn probe_latency(
    platform: Platform,
    target: &str,
    logger: &Logger,
    stats: &SharedStats,
) -> Option<f64> {
    run_ping(platform, target, 1, PING_DEADLINE, "latency", logger, stats)
        .and_then(|output| report_missing(parse_rtt_ms(&output), "latency", logger, stats))
}

/// Measures packet loss toward `target` over ten echoes.
pub fn probe_loss(
    platform: Platform,
    target: &str,
    logger: &Logger,
    stats: &SharedStats,
) -> Option<f64> {
    run_ping(platform, target, LOSS_PROBE_COUNT, LOSS_DEADLINE, "loss", logger, stats)
        .and_then(|output| report_missing(parse_loss_pct(&output), "loss", logger, stats))
}

/// Lists active connections as `(remote_ip, connection_count)` pairs.
pub fn sample_connections(platform: Platform) -> Result<Vec<(IpAddr, u32)>, String> {
    let output = Command::new("netstat")
        .args(platform.netstat_args())
        .output()
        .map_err(|e| format!("failed to run netstat: {}", e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("netstat exited with {}: {}", output.status, stderr.trim()));
    }
    Ok(parse_connection_counts(&String::from_utf8_lossy(&output.stdout)))
}

/// Runs ping and returns its stdout, logging any failure.
fn run_ping(
    platform: Platform,
    target: &str,
    count: u32,
    deadline_secs: u64,
    probe: &'static str,
    logger: &Logger,
    stats: &SharedStats,
) -> Option<String> {
    let result = Command::new("ping")
        .args(platform.ping_args(target, count, deadline_secs))
        .output();

    match result {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            logger.log(&Event::ProbeFailed {
                probe,
                reason: &format!("ping exited with {}", output.status),
            });
            stats.probe_failures.fetch_add(1, Ordering::Relaxed);
            None
        }
        Err(e) => {
            logger.log(&Event::ProbeFailed {
                probe,
                reason: &format!("failed to run ping: {}", e),
            });
            stats.probe_failures.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}

/// Logs and counts a reading that ran but produced no parseable field.
fn report_missing(
    reading: Option<f64>,
    probe: &'static str,
    logger: &Logger,
    stats: &SharedStats,
) -> Option<f64> {
    if reading.is_none() {
        logger.log(&Event::ProbeFailed {
            probe,
            reason: "expected field missing from ping output",
        });
        stats.probe_failures.fetch_add(1, Ordering::Relaxed);
    }
    reading
}
