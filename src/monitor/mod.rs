//! Network-health monitoring engine entry point.
//!
//! One single-threaded polling loop drives everything. Each cycle:
//! the byte-counter measurement brackets the inter-cycle sleep, the
//! delta feeds the rolling window, latency and loss are probed per the
//! configured check method, the verdict drives the alert latch, and
//! the connection sweep feeds the abuse detector. All shared state is
//! owned here and mutated only by this loop, so no locking is needed.

pub mod abuse;
pub mod config;
pub mod detection;
pub mod parsers;
pub mod sampler;
pub mod types;
pub mod window;

use crate::firewall::{platform_firewall, Firewall};
use crate::logger::{Event, SharedLogger};
use crate::monitor::abuse::{AbuseDetector, BlockEvent};
use crate::monitor::detection::{evaluate, AlertEdge, AlertLatch};
use crate::monitor::sampler::{
    probe_latency, probe_loss, sample_connections, Platform, TrafficSampler,
};
use crate::monitor::types::*;
use crate::monitor::window::TrafficWindow;
use crate::notifier::{AlertKind, AlertPayload, Notifier};

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

/// Configuration bundle passed from `main` into the monitoring engine.
pub struct MonitorConfig {
    /// Host/IP probed for latency and loss and named in alerts.
    pub target: String,
    /// Location tag carried in alert payloads.
    pub location: String,
    /// Which metrics participate in violation evaluation.
    pub method: CheckMethod,
    /// Runtime-tunable health thresholds from CLI args.
    pub thresholds: Thresholds,
    /// Runtime-tunable connection-abuse limits from CLI args.
    pub limits: AbuseLimits,
    /// Seconds between check cycles.
    pub check_interval: u64,
    /// Traffic window capacity in samples.
    pub window_capacity: usize,
    /// When false, the connection sweep and firewall are skipped.
    pub blocking_enabled: bool,
    /// Restrict byte counting to this interface, if set.
    pub interface: Option<String>,
    /// Shared structured logger.
    pub logger: SharedLogger,
    /// Shared session statistics for the shutdown summary.
    pub stats: SharedStats,
    /// Set to `true` by the ctrlc handler; the loop exits on next check.
    pub shutdown: ShutdownFlag,
}

/// Entry point for the monitoring engine.
///
/// Runs until the shutdown flag is set. Every per-cycle failure (probe,
/// delivery, firewall, listing) is logged and survived; the loop itself
/// only ends on shutdown.
pub fn start_monitor(cfg: MonitorConfig, notifier: &Notifier) -> Result<(), String> {
    let platform = Platform::detect();
    if platform.is_none() {
        cfg.logger.log(&Event::Info {
            message: &format!(
                "unsupported platform '{}': probes and blocking disabled",
                std::env::consts::OS
            ),
        });
    }

    let firewall: Option<Box<dyn Firewall>> = match (cfg.blocking_enabled, platform) {
        (true, Some(p)) => {
            let fw = platform_firewall(p);
            cfg.logger.log(&Event::Info {
                message: &format!("connection blocking enabled via {}", fw.name()),
            });
            Some(fw)
        }
        _ => None,
    };

    let mut traffic = TrafficSampler::new(cfg.interface.clone());
    let mut window = TrafficWindow::new(cfg.window_capacity);
    let mut latch = AlertLatch::new();
    let mut detector = AbuseDetector::new(cfg.limits);
    let interval = Duration::from_secs(cfg.check_interval);

    cfg.logger.log(&Event::Info {
        message: &format!(
            "monitoring {} every {}s (window {} samples)",
            cfg.target, cfg.check_interval, cfg.window_capacity
        ),
    });

    while !cfg.shutdown.load(Ordering::Relaxed) {
        // The delta measurement brackets the inter-cycle sleep: sample
        // the cumulative counters, wait one interval, sample again.
        let before = traffic.total_bytes();
        sleep_interruptible(interval, &cfg.shutdown);
        if cfg.shutdown.load(Ordering::Relaxed) {
            break;
        }
        let interval_bytes = traffic.total_bytes().saturating_sub(before);
        let average = window.record(interval_bytes);

        // Probes run only for participating checks; a missing reading
        // is "no evidence" and never trips a threshold.
        let latency_ms = match (cfg.method.includes_ping(), platform) {
            (true, Some(p)) => probe_latency(p, &cfg.target, &cfg.logger, &cfg.stats),
            _ => None,
        };
        let loss_pct = match (cfg.method.includes_loss(), platform) {
            (true, Some(p)) => probe_loss(p, &cfg.target, &cfg.logger, &cfg.stats),
            _ => None,
        };

        let sample = Sample {
            interval_bytes,
            latency_ms,
            loss_pct,
        };
        cfg.logger.log(&Event::TrafficSample {
            interval_bytes: sample.interval_bytes,
            average_bytes: average,
            window_len: window.len(),
        });

        let violated = evaluate(average, &sample, cfg.method, &cfg.thresholds, &cfg.logger);
        if let Some(edge) = latch.observe(violated, &cfg.target, &cfg.location) {
            cfg.stats.alerts_emitted.fetch_add(1, Ordering::Relaxed);
            deliver_edge(&edge, notifier, &cfg);
        }

        // Connection sweep, independent of the health checks above.
        if let (Some(fw), Some(p)) = (firewall.as_deref(), platform) {
            match sample_connections(p) {
                Ok(connections) => {
                    let events = detector.sweep(
                        &connections,
                        Instant::now(),
                        fw,
                        &cfg.logger,
                        &cfg.stats,
                    );
                    for event in events {
                        if let BlockEvent::Blocked(ip) = event {
                            if let Err(e) = notifier.notify_blocked(&ip.to_string()) {
                                cfg.logger.log(&Event::DeliveryFailed {
                                    endpoint: "ip-blocked",
                                    reason: &e,
                                });
                                cfg.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
                Err(e) => {
                    cfg.logger.log(&Event::Info {
                        message: &format!("connection listing failed: {}", e),
                    });
                }
            }
        }

        cfg.stats.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    Ok(())
}

/// Delivers a latch edge to the alert endpoint.
///
/// The latch already committed the transition; a delivery failure is
/// logged and counted but never propagated, so the next cycle proceeds
/// with consistent local state.
fn deliver_edge(edge: &AlertEdge, notifier: &Notifier, cfg: &MonitorConfig) {
    let result = match edge {
        AlertEdge::Start(incident) => {
            cfg.logger.log(&Event::IncidentStart {
                ip: &incident.ip,
                start_time: &incident.start_time,
            });
            notifier.send_alert(&AlertPayload {
                kind: AlertKind::Start,
                ip: &incident.ip,
                location: &incident.location,
                start_time: &incident.start_time,
                end_time: None,
            })
        }
        AlertEdge::End(incident) => {
            let end_time = incident.end_time.as_deref().unwrap_or_default();
            cfg.logger.log(&Event::IncidentEnd {
                ip: &incident.ip,
                start_time: &incident.start_time,
                end_time,
            });
            notifier.send_alert(&AlertPayload {
                kind: AlertKind::End,
                ip: &incident.ip,
                location: &incident.location,
                start_time: &incident.start_time,
                end_time: incident.end_time.as_deref(),
            })
        }
    };

    if let Err(e) = result {
        cfg.logger.log(&Event::DeliveryFailed {
            endpoint: "ddos-alert",
            reason: &e,
        });
        cfg.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sleeps for `total`, waking every second to re-check the shutdown
/// flag so Ctrl+C never waits out a full interval.
fn sleep_interruptible(total: Duration, shutdown: &ShutdownFlag) {
    let mut slept = Duration::ZERO;
    while slept < total {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let step = Duration::from_secs(1).min(total - slept);
        thread::sleep(step);
        slept += step;
    }
}
