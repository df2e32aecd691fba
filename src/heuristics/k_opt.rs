//! K-opt local-search improver over warm-start paths.
//!
//! A move removes k contiguous request-pairs (contiguous in pickup visit
//! order) and reinserts them with cost-greedy best insertion. Moves are
//! applied best-improvement-first until a local optimum is reached.

use crate::counters;
use crate::graph::Graph;
use crate::heuristics::insertion::{try_insert, InsertionRule};
use crate::path::Path;
use log::debug;
use std::time::Instant;

pub struct KOptHeuristic {
    pub k: usize,
}

impl KOptHeuristic {
    pub fn new(k: usize) -> Self {
        KOptHeuristic { k: k.max(1) }
    }

    /// Improve every input path independently. Returns only the improved
    /// variants; callers keep the originals alongside.
    pub fn improve_all(&self, g: &Graph, paths: &[Path]) -> Vec<Path> {
        let start = Instant::now();
        let improved: Vec<Path> =
            paths.iter().filter_map(|p| self.improve_path(g, p)).collect();
        debug!("k-opt (k = {}) improved {} of {} paths", self.k, improved.len(), paths.len());
        counters::add_heuristic_time(start.elapsed());
        improved
    }

    fn improve_path(&self, g: &Graph, path: &Path) -> Option<Path> {
        let mut current = path.clone();
        let mut improved_any = false;

        loop {
            let requests = current.request_order(g);
            if requests.len() < self.k {
                break;
            }

            let mut best: Option<Path> = None;
            for window in requests.windows(self.k) {
                if let Some(candidate) = self.rebuild_window(g, &current, window) {
                    if candidate.total_cost < current.total_cost - 1e-9
                        && best.as_ref().map_or(true, |b| candidate.total_cost < b.total_cost)
                    {
                        best = Some(candidate);
                    }
                }
            }

            match best {
                Some(better) => {
                    current = better;
                    improved_any = true;
                }
                None => break,
            }
        }

        improved_any.then_some(current)
    }

    /// Remove the window's requests and reinsert them cost-greedily.
    fn rebuild_window(&self, g: &Graph, path: &Path, window: &[usize]) -> Option<Path> {
        let mut partial = path.clone();
        for &request in window {
            partial = partial.remove_request(g, request).ok()?;
        }

        let mut remaining: Vec<usize> = window.to_vec();
        while !remaining.is_empty() {
            let (sentinel_cost, sentinel_load) = InsertionRule::sentinel();
            let mut best_cost = sentinel_cost;
            let mut best_load = sentinel_load;
            let mut best: Option<(usize, Path)> = None;

            for &request in &remaining {
                for x in 1..partial.len() {
                    for y in x..partial.len() {
                        if let Some(candidate) = try_insert(
                            g,
                            InsertionRule::CostOnly,
                            request,
                            x,
                            y,
                            &partial,
                            best_cost,
                            best_load,
                        ) {
                            best_cost = candidate.total_cost;
                            best_load = candidate.total_load;
                            best = Some((request, candidate));
                        }
                    }
                }
            }

            let (request, next) = best?;
            partial = next;
            remaining.retain(|&r| r != request);
        }

        Some(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two requests where serving them one after the other is much cheaper
    /// than the interleaving the initial path uses.
    fn improvable_graph() -> Graph {
        let n = 2;
        let side = 2 * n + 2;
        let mut cost = vec![vec![10.0; side]; side];
        for i in 0..side {
            cost[i][i] = -1.0;
        }
        cost[0][5] = 50.0;
        cost[0][1] = 1.0;
        cost[1][3] = 1.0;
        cost[3][2] = 1.0;
        cost[2][4] = 1.0;
        cost[4][5] = 1.0;
        Graph::new("t".into(), 10, cost, vec![4, 4]).unwrap()
    }

    #[test]
    fn test_improves_bad_path() {
        let g = improvable_graph();
        let bad = Path::from_nodes(&g, vec![0, 2, 4, 1, 3, 5]).unwrap();
        let h = KOptHeuristic::new(2);
        let improved = h.improve_all(&g, &[bad.clone()]);
        assert_eq!(improved.len(), 1);
        assert!(improved[0].total_cost < bad.total_cost);
        assert_eq!(improved[0].nodes, vec![0, 1, 3, 2, 4, 5]);
    }

    #[test]
    fn test_no_output_when_already_optimal() {
        let g = improvable_graph();
        let good = Path::from_nodes(&g, vec![0, 1, 3, 2, 4, 5]).unwrap();
        let h = KOptHeuristic::new(2);
        assert!(h.improve_all(&g, &[good]).is_empty());
    }

    #[test]
    fn test_window_larger_than_path_is_noop() {
        let g = improvable_graph();
        let p = Path::from_nodes(&g, vec![0, 2, 4, 1, 3, 5]).unwrap();
        let h = KOptHeuristic::new(3);
        assert!(h.improve_all(&g, &[p]).is_empty());
    }
}
