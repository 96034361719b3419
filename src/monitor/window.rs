//! Sliding-window traffic averaging.
//!
//! The window holds the last W per-interval byte deltas and reports
//! their arithmetic mean. Eviction is FIFO by insertion order, never by
//! age: the window is W samples wide regardless of how long each
//! interval actually took.

use std::collections::VecDeque;

/// Bounded FIFO of per-interval traffic deltas.
///
/// Invariant: `len() <= capacity` at all times.
pub struct TrafficWindow {
    deltas: VecDeque<u64>,
    capacity: usize,
}

impl TrafficWindow {
    /// Creates an empty window holding up to `capacity` samples.
    /// A capacity of zero is clamped to one so the average is always
    /// taken over at least the newest sample.
    pub fn new(capacity: usize) -> Self {
        Self {
            deltas: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a delta, evicting the single oldest entry if the window
    /// is full, and returns the arithmetic mean of the current
    /// contents. With one entry the average equals that entry.
    pub fn record(&mut self, delta: u64) -> f64 {
        self.deltas.push_back(delta);
        if self.deltas.len() > self.capacity {
            self.deltas.pop_front();
        }
        let sum: u128 = self.deltas.iter().map(|&d| d as u128).sum();
        sum as f64 / self.deltas.len() as f64
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_averages_to_itself() {
        let mut w = TrafficWindow::new(10);
        assert_eq!(w.record(42), 42.0);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn average_covers_last_min_n_w_deltas() {
        let mut w = TrafficWindow::new(3);
        w.record(1);
        w.record(2);
        assert_eq!(w.record(3), 2.0); // mean of [1, 2, 3]
        assert_eq!(w.record(4), 3.0); // oldest evicted, mean of [2, 3, 4]
        assert_eq!(w.record(5), 4.0); // mean of [3, 4, 5]
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut w = TrafficWindow::new(4);
        for i in 0..100 {
            w.record(i);
            assert!(w.len() <= 4);
        }
        // mean of the last four deltas [96, 97, 98, 99]
        assert_eq!(w.record(100), 98.5);
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let mut w = TrafficWindow::new(0);
        assert_eq!(w.record(7), 7.0);
        assert_eq!(w.record(9), 9.0);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn full_window_mean_is_exact() {
        let mut w = TrafficWindow::new(120);
        let mut avg = 0.0;
        for _ in 0..119 {
            avg = w.record(5_000_000);
        }
        assert_eq!(avg, 5_000_000.0);
        // One large spike amortized over the full window.
        let avg = w.record(50_000_000);
        assert_eq!(avg, (119u64 * 5_000_000 + 50_000_000) as f64 / 120.0);
        assert_eq!(avg, 5_375_000.0);
    }
}
