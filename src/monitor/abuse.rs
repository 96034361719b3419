//! Connection abuse detection and block bookkeeping.
//!
//! Each poll cycle the detector sweeps the current per-source-IP
//! connection counts. An IP is blocked when it holds too many
//! simultaneous connections, or when it reappears often enough within
//! the detection window to look like a burst. Blocks expire lazily: an
//! expired entry is lifted the next time a sweep observes the IP.
//!
//! Sighting history is a bounded deque evicted by insertion order, not
//! by age. The history is exactly `suspicious_threshold` entries deep,
//! so the burst test always spans the last that-many sightings however
//! long ago the oldest one was.

use crate::firewall::Firewall;
use crate::logger::{Event, Logger};
use crate::monitor::types::{AbuseLimits, SharedStats};
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// A confirmed firewall action taken during a sweep, for the caller to
/// notify on. Only emitted after the firewall command succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEvent {
    Blocked(IpAddr),
    Unblocked(IpAddr),
}

/// Per-IP abuse tracking state, owned by the polling loop.
pub struct AbuseDetector {
    limits: AbuseLimits,
    /// Recent sighting timestamps per IP, capacity = suspicious_threshold.
    suspicious: HashMap<IpAddr, VecDeque<Instant>>,
    /// Currently blocked IPs and their expiry instants.
    blocked: HashMap<IpAddr, Instant>,
}

impl AbuseDetector {
    pub fn new(limits: AbuseLimits) -> Self {
        Self {
            limits,
            suspicious: HashMap::new(),
            blocked: HashMap::new(),
        }
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.blocked.contains_key(&ip)
    }

    /// Expiry instant of an active block, if any.
    pub fn block_expiry(&self, ip: IpAddr) -> Option<Instant> {
        self.blocked.get(&ip).copied()
    }

    /// Processes one poll cycle's `(source_ip, connection_count)` pairs.
    ///
    /// Returns the firewall actions that actually took effect, in
    /// order. Bookkeeping is success-gated: a failed firewall command
    /// leaves both maps untouched and logs the error, so the next sweep
    /// retries naturally.
    pub fn sweep(
        &mut self,
        connections: &[(IpAddr, u32)],
        now: Instant,
        firewall: &dyn Firewall,
        logger: &Logger,
        stats: &SharedStats,
    ) -> Vec<BlockEvent> {
        let mut events = Vec::new();

        for &(ip, count) in connections {
            if count > self.limits.max_connections && !self.blocked.contains_key(&ip) {
                logger.log(&Event::ConnectionFlood {
                    ip: &ip.to_string(),
                    connections: count,
                });
                self.block(ip, now, firewall, logger, stats, &mut events);
            } else if self.expired(ip, now) {
                self.unblock(ip, firewall, logger, &mut events);
            }

            // Record the sighting regardless of the outcome above, then
            // test for a burst over the bounded history.
            let span = {
                let history = self.suspicious.entry(ip).or_default();
                history.push_back(now);
                if history.len() > self.limits.suspicious_threshold {
                    history.pop_front();
                }
                if self.limits.suspicious_threshold > 0
                    && history.len() == self.limits.suspicious_threshold
                {
                    match (history.front(), history.back()) {
                        (Some(oldest), Some(newest)) => Some(newest.duration_since(*oldest)),
                        _ => None,
                    }
                } else {
                    None
                }
            };

            if let Some(span) = span {
                if span < self.limits.detection_window && !self.blocked.contains_key(&ip) {
                    logger.log(&Event::SuspiciousBurst {
                        ip: &ip.to_string(),
                        span_secs: span.as_secs_f64(),
                    });
                    self.block(ip, now, firewall, logger, stats, &mut events);
                } else if self.expired(ip, now) {
                    self.unblock(ip, firewall, logger, &mut events);
                }
            }
        }

        events
    }

    fn expired(&self, ip: IpAddr, now: Instant) -> bool {
        self.blocked.get(&ip).is_some_and(|&expiry| now > expiry)
    }

    fn block(
        &mut self,
        ip: IpAddr,
        now: Instant,
        firewall: &dyn Firewall,
        logger: &Logger,
        stats: &SharedStats,
        events: &mut Vec<BlockEvent>,
    ) {
        match firewall.block(ip) {
            Ok(()) => {
                self.blocked.insert(ip, now + self.limits.block_duration);
                logger.log(&Event::IpBlocked { ip: &ip.to_string() });
                stats.ips_blocked.fetch_add(1, Ordering::Relaxed);
                events.push(BlockEvent::Blocked(ip));
            }
            Err(e) => {
                logger.log(&Event::FirewallError {
                    action: "block",
                    ip: &ip.to_string(),
                    reason: &e,
                });
            }
        }
    }

    fn unblock(
        &mut self,
        ip: IpAddr,
        firewall: &dyn Firewall,
        logger: &Logger,
        events: &mut Vec<BlockEvent>,
    ) {
        match firewall.unblock(ip) {
            Ok(()) => {
                self.blocked.remove(&ip);
                logger.log(&Event::IpUnblocked { ip: &ip.to_string() });
                events.push(BlockEvent::Unblocked(ip));
            }
            Err(e) => {
                logger.log(&Event::FirewallError {
                    action: "unblock",
                    ip: &ip.to_string(),
                    reason: &e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::SessionStats;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records every firewall call without touching the OS.
    #[derive(Default)]
    struct RecordingFirewall {
        calls: RefCell<Vec<(&'static str, IpAddr)>>,
        fail: bool,
    }

    impl Firewall for RecordingFirewall {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn block(&self, ip: IpAddr) -> Result<(), String> {
            if self.fail {
                return Err("simulated failure".to_string());
            }
            self.calls.borrow_mut().push(("block", ip));
            Ok(())
        }

        fn unblock(&self, ip: IpAddr) -> Result<(), String> {
            if self.fail {
                return Err("simulated failure".to_string());
            }
            self.calls.borrow_mut().push(("unblock", ip));
            Ok(())
        }
    }

    fn limits() -> AbuseLimits {
        AbuseLimits {
            max_connections: 100,
            suspicious_threshold: 10,
            detection_window: Duration::from_secs(60),
            block_duration: Duration::from_secs(3600),
        }
    }

    fn quiet_logger() -> Logger {
        Logger::new(false, None).unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn modest_connection_count_is_not_blocked() {
        let mut det = AbuseDetector::new(limits());
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();

        let events = det.sweep(&[(ip("10.0.0.5"), 15)], Instant::now(), &fw, &logger, &stats);
        assert!(events.is_empty());
        assert!(!det.is_blocked(ip("10.0.0.5")));
        assert!(fw.calls.borrow().is_empty());
    }

    #[test]
    fn flood_blocks_once_with_expiry() {
        let mut det = AbuseDetector::new(limits());
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let now = Instant::now();
        let target = ip("10.0.0.5");

        let events = det.sweep(&[(target, 150)], now, &fw, &logger, &stats);
        assert_eq!(events, vec![BlockEvent::Blocked(target)]);
        assert_eq!(det.block_expiry(target), Some(now + Duration::from_secs(3600)));

        // Still flooding next cycle: the existing block suppresses a
        // second firewall invocation.
        let later = now + Duration::from_secs(15);
        let events = det.sweep(&[(target, 150)], later, &fw, &logger, &stats);
        assert!(events.is_empty());
        assert_eq!(fw.calls.borrow().len(), 1);
        assert_eq!(stats.ips_blocked.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn expired_block_is_lifted_on_next_sweep() {
        let mut det = AbuseDetector::new(AbuseLimits {
            block_duration: Duration::from_secs(60),
            ..limits()
        });
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let now = Instant::now();
        let target = ip("192.0.2.1");

        det.sweep(&[(target, 500)], now, &fw, &logger, &stats);
        assert!(det.is_blocked(target));

        // Before expiry: nothing happens.
        let events = det.sweep(&[(target, 1)], now + Duration::from_secs(30), &fw, &logger, &stats);
        assert!(events.is_empty());

        // After expiry: the block is lifted lazily.
        let events = det.sweep(&[(target, 1)], now + Duration::from_secs(61), &fw, &logger, &stats);
        assert_eq!(events, vec![BlockEvent::Unblocked(target)]);
        assert!(!det.is_blocked(target));
    }

    #[test]
    fn ten_sightings_within_window_is_a_burst() {
        let mut det = AbuseDetector::new(limits());
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let t0 = Instant::now();
        let target = ip("203.0.113.9");

        // Ten sightings spanning 45 seconds (under the 60s window).
        let mut blocked_at = None;
        for i in 0..10u64 {
            let events = det.sweep(&[(target, 1)], t0 + Duration::from_secs(i * 5), &fw, &logger, &stats);
            if !events.is_empty() {
                blocked_at = Some(i);
            }
        }
        assert_eq!(blocked_at, Some(9));
        assert!(det.is_blocked(target));
        assert_eq!(fw.calls.borrow().len(), 1);
    }

    #[test]
    fn ten_sightings_spread_past_window_is_not_a_burst() {
        let mut det = AbuseDetector::new(limits());
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let t0 = Instant::now();
        let target = ip("203.0.113.9");

        // Ten sightings spanning 90 seconds (past the 60s window).
        for i in 0..10u64 {
            det.sweep(&[(target, 1)], t0 + Duration::from_secs(i * 10), &fw, &logger, &stats);
        }
        assert!(!det.is_blocked(target));
        assert!(fw.calls.borrow().is_empty());
    }

    #[test]
    fn flood_and_burst_in_one_sweep_block_once() {
        let mut det = AbuseDetector::new(AbuseLimits {
            suspicious_threshold: 1,
            ..limits()
        });
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let target = ip("198.51.100.7");

        // One sighting fills the history, so both the raw count and the
        // burst test apply in the same sweep. The block guard coalesces
        // them into a single firewall call.
        let events = det.sweep(&[(target, 500)], Instant::now(), &fw, &logger, &stats);
        assert_eq!(events, vec![BlockEvent::Blocked(target)]);
        assert_eq!(fw.calls.borrow().len(), 1);
    }

    #[test]
    fn failed_firewall_command_leaves_bookkeeping_untouched() {
        let mut det = AbuseDetector::new(limits());
        let fw = RecordingFirewall {
            fail: true,
            ..Default::default()
        };
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let target = ip("10.0.0.5");

        let events = det.sweep(&[(target, 150)], Instant::now(), &fw, &logger, &stats);
        assert!(events.is_empty());
        assert!(!det.is_blocked(target));
        assert_eq!(stats.ips_blocked.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn history_eviction_is_by_insertion_order() {
        // With capacity 3 and a 60s window, three rapid sightings after
        // a long quiet gap must still form a burst: the stale oldest
        // entries were evicted by capacity, not retained by age.
        let mut det = AbuseDetector::new(AbuseLimits {
            suspicious_threshold: 3,
            ..limits()
        });
        let fw = RecordingFirewall::default();
        let logger = quiet_logger();
        let stats = SessionStats::new();
        let t0 = Instant::now();
        let target = ip("203.0.113.20");

        // Two sightings far in the past.
        det.sweep(&[(target, 1)], t0, &fw, &logger, &stats);
        det.sweep(&[(target, 1)], t0 + Duration::from_secs(1000), &fw, &logger, &stats);
        // Three rapid sightings; the first of them evicts t0.
        det.sweep(&[(target, 1)], t0 + Duration::from_secs(2000), &fw, &logger, &stats);
        det.sweep(&[(target, 1)], t0 + Duration::from_secs(2001), &fw, &logger, &stats);
        let events = det.sweep(&[(target, 1)], t0 + Duration::from_secs(2002), &fw, &logger, &stats);
        assert_eq!(events, vec![BlockEvent::Blocked(target)]);
    }
}
