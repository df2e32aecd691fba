//! The heuristic solver: runs the whole constructive family and collects
//! the warm-start pool.
//!
//! Six constructive runs (two max-regret, two ordered-request, two
//! best-insertion) followed by the k-opt improver over the successes. Each
//! failure is isolated: it is logged and dropped, and the pool is the union
//! of the successful outputs.

use crate::graph::Graph;
use crate::heuristics::insertion::{InsertionRule, RegretRule, RequestOrder};
use crate::heuristics::{
    BestInsertionHeuristic, ConstructionHeuristic, KOptHeuristic, MaxRegretHeuristic,
    OrderedRequestsHeuristic,
};
use crate::path::Path;
use log::{info, warn};
use statrs::statistics::Statistics;

/// Admissibility entry for the k-opt improver: instances with at most
/// `max_requests` requests may run a k-opt pass with this `k`.
#[derive(Debug, Clone, Copy)]
pub struct InstanceSizeLimit {
    pub max_requests: usize,
    pub k: usize,
}

pub struct HeuristicSolver {
    limits: Vec<InstanceSizeLimit>,
}

impl HeuristicSolver {
    pub fn new() -> Self {
        HeuristicSolver {
            limits: vec![
                InstanceSizeLimit { max_requests: 25, k: 3 },
                InstanceSizeLimit { max_requests: 50, k: 2 },
            ],
        }
    }

    pub fn with_limits(limits: Vec<InstanceSizeLimit>) -> Self {
        HeuristicSolver { limits }
    }

    /// Largest admissible k for an instance with `n` requests.
    pub fn k_for(&self, n: usize) -> Option<usize> {
        self.limits.iter().filter(|l| n <= l.max_requests).map(|l| l.k).max()
    }

    /// Run the family and return the warm-start pool.
    pub fn solve(&self, g: &Graph) -> Vec<Path> {
        let constructive: Vec<Box<dyn ConstructionHeuristic>> = vec![
            Box::new(MaxRegretHeuristic::new(
                InsertionRule::LoadOverCost,
                RegretRule::RatioDifference,
            )),
            Box::new(MaxRegretHeuristic::new(InsertionRule::LoadTimesCost, RegretRule::ProductGap)),
            Box::new(OrderedRequestsHeuristic::new(
                RequestOrder::AscendingPairCost,
                InsertionRule::CostOnly,
            )),
            Box::new(OrderedRequestsHeuristic::new(
                RequestOrder::DescendingPairCost,
                InsertionRule::CostOnly,
            )),
            Box::new(BestInsertionHeuristic::new(InsertionRule::LoadOverCost)),
            Box::new(BestInsertionHeuristic::new(InsertionRule::LoadTimesCost)),
        ];

        let mut pool: Vec<Path> = Vec::new();
        for heuristic in &constructive {
            match heuristic.construct(g) {
                Ok(path) => {
                    info!("{}: cost {:.2}", heuristic.name(), path.total_cost);
                    pool.push(path);
                }
                Err(e) => warn!("{} produced no path: {}", heuristic.name(), e),
            }
        }

        if let Some(k) = self.k_for(g.n) {
            let improver = KOptHeuristic::new(k);
            let improved = improver.improve_all(g, &pool);
            for path in &improved {
                info!("k-opt (k = {}): cost {:.2}", k, path.total_cost);
            }
            pool.extend(improved);
        } else {
            info!("instance too large for k-opt, skipping");
        }

        if !pool.is_empty() {
            let costs: Vec<f64> = pool.iter().map(|p| p.total_cost).collect();
            info!(
                "warm-start pool: {} paths, best {:.2}, mean {:.2}, std {:.2}",
                pool.len(),
                costs.iter().cloned().fold(f64::INFINITY, f64::min),
                (&costs).mean(),
                if costs.len() > 1 { (&costs).std_dev() } else { 0.0 },
            );
        } else {
            warn!("every heuristic failed, warm-start pool is empty");
        }

        pool
    }
}

impl Default for HeuristicSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_graph(n: usize, capacity: i32, demands: Vec<i32>) -> Graph {
        let side = 2 * n + 2;
        let mut cost = vec![vec![1.0; side]; side];
        for i in 0..side {
            cost[i][i] = -1.0;
        }
        Graph::new("t".into(), capacity, cost, demands).unwrap()
    }

    #[test]
    fn test_pool_paths_all_feasible_and_complete() {
        let g = test_graph(3, 9, vec![4, 3, 5]);
        let pool = HeuristicSolver::new().solve(&g);
        assert!(!pool.is_empty());
        for path in &pool {
            assert!(path.is_complete(&g));
            let check = Path::from_nodes(&g, path.nodes.clone()).unwrap();
            assert!((path.total_cost - check.total_cost).abs() < 1e-9);
            assert_eq!(path.total_load, check.total_load);
        }
    }

    #[test]
    fn test_pool_totals_survive_forbidden_depot_arc() {
        // coordinate-style graph: the depot-to-depot arc is forbidden
        let mut g = test_graph(3, 10, vec![4, 3, 5]);
        g.cost[0][7] = -1.0;
        let pool = HeuristicSolver::new().solve(&g);
        assert!(!pool.is_empty());
        for path in &pool {
            assert!(path.is_complete(&g));
            let check = Path::from_nodes(&g, path.nodes.clone()).unwrap();
            assert!((path.total_cost - check.total_cost).abs() < 1e-9);
            assert_eq!(path.total_load, check.total_load);
        }
    }

    #[test]
    fn test_single_request_pool_is_forced_path() {
        let g = test_graph(1, 10, vec![4]);
        let pool = HeuristicSolver::new().solve(&g);
        assert!(!pool.is_empty());
        for path in &pool {
            assert_eq!(path.nodes, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_k_opt_gating_by_instance_size() {
        let solver =
            HeuristicSolver::with_limits(vec![InstanceSizeLimit { max_requests: 5, k: 3 }]);
        assert_eq!(solver.k_for(4), Some(3));
        assert_eq!(solver.k_for(5), Some(3));
        assert_eq!(solver.k_for(10), None);
    }

    #[test]
    fn test_largest_admissible_k_wins() {
        let solver = HeuristicSolver::new();
        assert_eq!(solver.k_for(10), Some(3));
        assert_eq!(solver.k_for(30), Some(2));
        assert_eq!(solver.k_for(100), None);
    }

    #[test]
    fn test_heuristic_time_counter_increases() {
        let g = test_graph(2, 10, vec![4, 3]);
        let before = crate::counters::heuristic_time();
        let pool = HeuristicSolver::new().solve(&g);
        assert!(!pool.is_empty());
        assert!(crate::counters::heuristic_time() >= before);
    }

    #[test]
    fn test_pool_respects_forbidden_arcs() {
        let mut g = test_graph(3, 10, vec![4, 3, 5]);
        g.cost[1][4] = -1.0;
        let pool = HeuristicSolver::new().solve(&g);
        assert!(!pool.is_empty());
        for path in &pool {
            assert!(path.is_complete(&g));
            for w in path.nodes.windows(2) {
                assert!(!(w[0] == 1 && w[1] == 4), "path uses the forbidden arc: {:?}", path.nodes);
            }
        }
    }

    #[test]
    fn test_pool_isolates_failures() {
        // delivery 2 unreachable from its pickup makes every heuristic fail
        let mut g = test_graph(1, 10, vec![4]);
        g.cost[1][2] = -1.0;
        let pool = HeuristicSolver::new().solve(&g);
        assert!(pool.is_empty());
    }
}
