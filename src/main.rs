mod cli;
mod firewall;
mod logger;
mod monitor;
mod notifier;

use clap::Parser;
use cli::Cli;
use logger::{Event, Logger};
use monitor::config::TEST_ALERT_DELAY;
use monitor::types::{utc_now_iso, AbuseLimits, SessionStats, ShutdownFlag, Thresholds};
use monitor::{start_monitor, MonitorConfig};
use notifier::{AlertKind, AlertPayload, Notifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logger with optional JSON output and file logging
    let logger = Arc::new(
        Logger::new(cli.json, cli.log_file.as_deref()).expect("Failed to open log file"),
    );

    // The webhook client is needed by every mode, including the
    // one-shot test and stats modes.
    let notifier = match Notifier::new(
        cli.alert_url.clone(),
        cli.block_url.clone(),
        cli.stats_url.clone(),
    ) {
        Ok(n) => n,
        Err(e) => {
            logger.log(&Event::Info {
                message: &format!("cannot initialize webhook client: {}", e),
            });
            std::process::exit(1);
        }
    };

    // ── One-shot modes ────────────────────────────────────────────────────────
    if cli.test {
        run_alert_test(&cli, &notifier, &logger);
        return;
    }
    if cli.stats {
        match notifier.fetch_stats() {
            Ok(stats) => println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default()),
            Err(e) => {
                logger.log(&Event::Info {
                    message: &format!("failed to fetch network stats: {}", e),
                });
                std::process::exit(1);
            }
        }
        return;
    }

    // ── Monitoring mode ───────────────────────────────────────────────────────

    // Initialize shutdown flag for graceful termination
    let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
    register_shutdown_handler(Arc::clone(&shutdown));

    // Track session duration for summary reporting
    let session_start = Instant::now();
    let stats = SessionStats::new();

    let cfg = MonitorConfig {
        target:           cli.target.clone(),
        location:         cli.location.clone(),
        method:           cli.check_method,
        thresholds:       build_thresholds(&cli),
        limits:           build_limits(&cli),
        check_interval:   cli.interval,
        window_capacity:  cli.window,
        blocking_enabled: !cli.no_blocking,
        interface:        cli.interface.clone(),
        logger:           Arc::clone(&logger),
        stats:            Arc::clone(&stats),
        shutdown:         Arc::clone(&shutdown),
    };

    if let Err(e) = start_monitor(cfg, &notifier) {
        logger.log(&Event::Info {
            message: &format!("Monitor error: {}", e),
        });
    }

    print_summary(&logger, &stats, session_start);
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Registers a signal handler for graceful shutdown on Ctrl+C
fn register_shutdown_handler(shutdown: ShutdownFlag) {
    ctrlc::set_handler(move || {
        println!("\n[!] Ctrl+C received — shutting down...");
        shutdown.store(true, Ordering::SeqCst);
    })
    .expect("Failed to register Ctrl+C handler");
}

/// Sends a scripted start alert followed by the matching end alert.
///
/// Lets operators verify the API wiring end to end without waiting for
/// a real incident.
fn run_alert_test(cli: &Cli, notifier: &Notifier, logger: &Logger) {
    logger.log(&Event::Info { message: "Starting alert test..." });

    let start_time = utc_now_iso();
    let start = AlertPayload {
        kind: AlertKind::Start,
        ip: &cli.target,
        location: &cli.location,
        start_time: &start_time,
        end_time: None,
    };
    if let Err(e) = notifier.send_alert(&start) {
        logger.log(&Event::DeliveryFailed { endpoint: "ddos-alert", reason: &e });
    }

    thread::sleep(Duration::from_secs(TEST_ALERT_DELAY));

    let end_time = utc_now_iso();
    let end = AlertPayload {
        kind: AlertKind::End,
        ip: &cli.target,
        location: &cli.location,
        start_time: &start_time,
        end_time: Some(&end_time),
    };
    if let Err(e) = notifier.send_alert(&end) {
        logger.log(&Event::DeliveryFailed { endpoint: "ddos-alert", reason: &e });
    }

    logger.log(&Event::Info { message: "Alert test completed." });
}

/// Prints the session summary on shutdown
fn print_summary(logger: &Logger, stats: &SessionStats, session_start: Instant) {
    logger.log(&Event::SessionSummary {
        duration_secs:     session_start.elapsed().as_secs(),
        cycles:            stats.cycles_completed.load(Ordering::Relaxed),
        alerts_emitted:    stats.alerts_emitted.load(Ordering::Relaxed),
        ips_blocked:       stats.ips_blocked.load(Ordering::Relaxed),
        probe_failures:    stats.probe_failures.load(Ordering::Relaxed),
        delivery_failures: stats.delivery_failures.load(Ordering::Relaxed),
    });
}

/// Builds threshold configuration from command-line arguments
fn build_thresholds(cli: &Cli) -> Thresholds {
    Thresholds {
        traffic_bytes: cli.traffic_threshold,
        ping_ms:       cli.ping_threshold,
        loss_pct:      cli.loss_threshold,
    }
}

/// Builds connection-abuse limits from command-line arguments
fn build_limits(cli: &Cli) -> AbuseLimits {
    AbuseLimits {
        max_connections:      cli.max_connections,
        suspicious_threshold: cli.suspicious_threshold,
        detection_window:     Duration::from_secs(cli.detection_window),
        block_duration:       Duration::from_secs(cli.block_duration),
    }
}
