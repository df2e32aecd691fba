//! Process-wide solver counters.
//!
//! Time spent in heuristics, time spent separating cuts, and the number of
//! cuts added accumulate across the whole run and are reported at the end.
//! The MILP engine may invoke callbacks from worker threads, so everything
//! here is atomic.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static HEURISTIC_NANOS: AtomicU64 = AtomicU64::new(0);
static SEPARATION_NANOS: AtomicU64 = AtomicU64::new(0);
static CUTS_ADDED: AtomicU64 = AtomicU64::new(0);
static CUT_SEARCH_INTERVAL: AtomicU64 = AtomicU64::new(1);

/// Add elapsed time to the heuristics timer.
pub fn add_heuristic_time(elapsed: Duration) {
    HEURISTIC_NANOS.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
}

/// Total time spent inside heuristics so far.
pub fn heuristic_time() -> Duration {
    Duration::from_nanos(HEURISTIC_NANOS.load(Ordering::Relaxed))
}

/// Add elapsed time to the cut-separation timer.
pub fn add_separation_time(elapsed: Duration) {
    SEPARATION_NANOS.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
}

/// Total time spent separating cuts so far.
pub fn separation_time() -> Duration {
    Duration::from_nanos(SEPARATION_NANOS.load(Ordering::Relaxed))
}

/// Record cuts handed to the MILP engine.
pub fn add_cuts(count: u64) {
    CUTS_ADDED.fetch_add(count, Ordering::Relaxed);
}

/// Total number of cuts added so far.
pub fn cuts_added() -> u64 {
    CUTS_ADDED.load(Ordering::Relaxed)
}

/// Set the separation cadence: cuts are searched for every n-th eligible
/// branch-and-bound callback. Clamped to at least 1.
pub fn set_cut_search_interval(every_n_nodes: u64) {
    CUT_SEARCH_INTERVAL.store(every_n_nodes.max(1), Ordering::Relaxed);
}

/// Current separation cadence.
pub fn cut_search_interval() -> u64 {
    CUT_SEARCH_INTERVAL.load(Ordering::Relaxed)
}

/// Point-in-time view of the counters, used in reports.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountersSnapshot {
    pub heuristic_seconds: f64,
    pub separation_seconds: f64,
    pub cuts_added: u64,
}

/// Take a snapshot of the current counter values.
pub fn snapshot() -> CountersSnapshot {
    CountersSnapshot {
        heuristic_seconds: heuristic_time().as_secs_f64(),
        separation_seconds: separation_time().as_secs_f64(),
        cuts_added: cuts_added(),
    }
}

impl std::fmt::Display for CountersSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "heuristics: {:.4}s, separation: {:.4}s, cuts added: {}",
            self.heuristic_seconds, self.separation_seconds, self.cuts_added
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_monotone() {
        let cuts_before = cuts_added();
        let heur_before = heuristic_time();

        add_cuts(3);
        add_heuristic_time(Duration::from_millis(5));

        assert!(cuts_added() >= cuts_before + 3);
        assert!(heuristic_time() >= heur_before + Duration::from_millis(5));
    }

    #[test]
    fn test_interval_clamped() {
        set_cut_search_interval(0);
        assert_eq!(cut_search_interval(), 1);
        set_cut_search_interval(5);
        assert!(cut_search_interval() >= 1);
        set_cut_search_interval(1);
    }
}
