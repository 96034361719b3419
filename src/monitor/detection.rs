//! Threshold evaluation and the incident alert latch.
//!
//! Evaluation is stateless: each cycle's readings are compared against
//! the configured thresholds under the selected check method. The latch
//! is the only stateful piece, turning a stream of per-cycle verdicts
//! into edge-triggered start/end alerts.

use crate::logger::{Event, Logger};
use crate::monitor::types::{utc_now_iso, CheckMethod, Incident, Sample, Thresholds};

/// Compares one cycle's readings against the thresholds.
///
/// Returns `true` when any participating check trips. Participation is
/// decided by `method`; a check whose reading is missing never trips,
/// and every comparison is strict (`>`). Each tripped check emits its
/// own structured event so the log explains why a cycle was degraded.
///
/// Stateless: identical inputs always produce the identical verdict.
pub fn evaluate(
    avg_traffic: f64,
    sample: &Sample,
    method: CheckMethod,
    thresholds: &Thresholds,
    logger: &Logger,
) -> bool {
    let mut violated = false;

    if method.includes_traffic() && avg_traffic > thresholds.traffic_bytes {
        logger.log(&Event::HighTraffic {
            average_bytes: avg_traffic,
        });
        violated = true;
    }

    if method.includes_ping() {
        if let Some(latency) = sample.latency_ms {
            if latency > thresholds.ping_ms {
                logger.log(&Event::HighLatency { latency_ms: latency });
                violated = true;
            }
        }
    }

    if method.includes_loss() {
        if let Some(loss) = sample.loss_pct {
            if loss > thresholds.loss_pct {
                logger.log(&Event::HighPacketLoss { loss_pct: loss });
                violated = true;
            }
        }
    }

    violated
}

/// An alert edge produced by the latch, carrying the incident snapshot
/// the notifier should deliver.
#[derive(Debug, Clone)]
pub enum AlertEdge {
    /// A violation began; the incident has a start time only.
    Start(Incident),
    /// The open incident cleared; both timestamps are set.
    End(Incident),
}

/// Single-flag incident latch.
///
/// Holds the one open [`Incident`], if any. Alerts fire only on state
/// edges: a violation while quiet opens an incident, an all-clear while
/// active closes it. Repeats of either state emit nothing, so a
/// sustained incident produces exactly one start and one end alert no
/// matter how many cycles it spans.
pub struct AlertLatch {
    open: Option<Incident>,
}

impl AlertLatch {
    pub fn new() -> Self {
        Self { open: None }
    }

    /// Whether an incident is currently open.
    pub fn is_active(&self) -> bool {
        self.open.is_some()
    }

    /// Feeds one cycle's verdict through the latch.
    ///
    /// The state transition is committed before the edge is returned;
    /// whatever the caller does with the edge (including failing to
    /// deliver it) cannot roll the latch back.
    pub fn observe(&mut self, violated: bool, ip: &str, location: &str) -> Option<AlertEdge> {
        if violated {
            if self.open.is_none() {
                let incident = Incident {
                    ip: ip.to_string(),
                    location: location.to_string(),
                    start_time: utc_now_iso(),
                    end_time: None,
                };
                self.open = Some(incident.clone());
                return Some(AlertEdge::Start(incident));
            }
        } else if let Some(mut incident) = self.open.take() {
            incident.end_time = Some(utc_now_iso());
            return Some(AlertEdge::End(incident));
        }
        None
    }
}
