//! Bounded, time-ordered log of applied set-points per charge point.
//!
//! Owned by the orchestrator's per-charge-point state arena and written
//! exactly once per cycle with the post-ramp value, so ramp limiting
//! compounds correctly across cycles.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One applied set-point, in Watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub at: Instant,
    pub set_point: i32,
    /// Whether the value came from a FORCE-mode cycle (exempt from ramp
    /// limiting).
    pub forced: bool,
}

/// Append-only log trimmed to a retention window.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    retention: Duration,
}

impl History {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
        }
    }

    /// Appends the value applied this cycle and drops entries older than
    /// the retention window.
    pub fn record(&mut self, at: Instant, set_point: i32, forced: bool) {
        self.entries.push_back(HistoryEntry {
            at,
            set_point,
            forced,
        });
        while let Some(front) = self.entries.front() {
            let age = at.checked_duration_since(front.at).unwrap_or(Duration::ZERO);
            if age > self.retention && self.entries.len() > 1 {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_time_order() {
        let mut h = History::new(Duration::from_secs(300));
        let t0 = Instant::now();
        h.record(t0, 4140, false);
        h.record(t0 + Duration::from_secs(1), 4640, false);
        assert_eq!(h.len(), 2);
        assert_eq!(h.last().map(|e| e.set_point), Some(4640));
    }

    #[test]
    fn old_entries_fall_out_of_the_window() {
        let mut h = History::new(Duration::from_secs(10));
        let t0 = Instant::now();
        for s in 0..30 {
            h.record(t0 + Duration::from_secs(s), s as i32 * 100, false);
        }
        assert!(h.len() <= 12);
        assert!(h.iter().all(|e| {
            t0 + Duration::from_secs(29) - e.at <= Duration::from_secs(10)
        }));
        assert_eq!(h.last().map(|e| e.set_point), Some(2900));
    }

    #[test]
    fn always_keeps_the_latest_entry() {
        let mut h = History::new(Duration::ZERO);
        let t0 = Instant::now();
        h.record(t0, 100, false);
        h.record(t0 + Duration::from_secs(60), 200, true);
        assert_eq!(h.len(), 1);
        assert_eq!(h.last().map(|e| (e.set_point, e.forced)), Some((200, true)));
    }
}
