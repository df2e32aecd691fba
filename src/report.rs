//! End-of-run summaries.

use crate::counters::{self, CountersSnapshot};
use crate::path::Path;
use chrono::Local;
use serde::Serialize;

/// Summary printed (and optionally serialized) at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub instance: String,
    pub finished_at: String,
    pub pool_size: usize,
    pub best_heuristic_cost: Option<f64>,
    pub counters: CountersSnapshot,
}

impl RunSummary {
    pub fn new(instance: &str, pool: &[Path]) -> Self {
        RunSummary {
            instance: instance.to_string(),
            finished_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            pool_size: pool.len(),
            best_heuristic_cost: pool
                .iter()
                .map(|p| p.total_cost)
                .min_by(|a, b| a.partial_cmp(b).unwrap()),
            counters: counters::snapshot(),
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "instance {}: {} warm starts{}, {} [{}]",
            self.instance,
            self.pool_size,
            match self.best_heuristic_cost {
                Some(c) => format!(" (best {:.2})", c),
                None => String::new(),
            },
            self.counters,
            self.finished_at
        )
    }
}
