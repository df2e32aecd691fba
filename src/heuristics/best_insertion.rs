//! Best-insertion construction heuristic.
//!
//! Repeatedly inserts the rule-best `(request, x, y)` candidate over all
//! remaining requests and all position pairs, starting from the depot-only
//! skeleton path.

use crate::counters;
use crate::graph::Graph;
use crate::heuristics::insertion::{try_insert, InsertionRule};
use crate::heuristics::{ConstructionHeuristic, HeuristicError};
use crate::path::Path;
use std::time::Instant;

pub struct BestInsertionHeuristic {
    pub rule: InsertionRule,
}

impl BestInsertionHeuristic {
    pub fn new(rule: InsertionRule) -> Self {
        BestInsertionHeuristic { rule }
    }

    fn build(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let mut path = Path::skeleton(g);
        let mut remaining: Vec<usize> = (1..=g.n).collect();

        while !remaining.is_empty() {
            let (sentinel_cost, sentinel_load) = InsertionRule::sentinel();
            let mut best_cost = sentinel_cost;
            let mut best_load = sentinel_load;
            let mut best: Option<(usize, Path)> = None;

            for &request in &remaining {
                for x in 1..path.len() {
                    for y in x..path.len() {
                        if let Some(candidate) =
                            try_insert(g, self.rule, request, x, y, &path, best_cost, best_load)
                        {
                            best_cost = candidate.total_cost;
                            best_load = candidate.total_load;
                            best = Some((request, candidate));
                        }
                    }
                }
            }

            match best {
                Some((request, next)) => {
                    path = next;
                    remaining.retain(|&r| r != request);
                }
                None => return Err(HeuristicError::NoFeasibleInsertion),
            }
        }

        Ok(path)
    }
}

impl ConstructionHeuristic for BestInsertionHeuristic {
    fn construct(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let start = Instant::now();
        let result = self.build(g);
        counters::add_heuristic_time(start.elapsed());
        result
    }

    fn name(&self) -> &str {
        match self.rule {
            InsertionRule::LoadOverCost => "BestInsertion-Ratio",
            InsertionRule::LoadTimesCost => "BestInsertion-Product",
            InsertionRule::CostOnly => "BestInsertion-Cost",
        }
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
    fn test_single_request_forced_path() {
        let g = test_graph(1, 10, vec![4]);
        let h = BestInsertionHeuristic::new(InsertionRule::CostOnly);
        let p = h.construct(&g).unwrap();
        assert_eq!(p.nodes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_builds_complete_feasible_path() {
        let g = test_graph(3, 10, vec![4, 3, 5]);
        for rule in
            [InsertionRule::LoadOverCost, InsertionRule::LoadTimesCost, InsertionRule::CostOnly]
        {
            let h = BestInsertionHeuristic::new(rule);
            let p = h.construct(&g).unwrap();
            assert!(p.is_complete(&g), "incomplete path under {:?}", rule);
            // revalidation must agree with the incrementally built totals
            let check = Path::from_nodes(&g, p.nodes.clone()).unwrap();
            assert!((p.total_cost - check.total_cost).abs() < 1e-9);
            assert_eq!(p.total_load, check.total_load);
        }
    }

    #[test]
    fn test_totals_survive_forbidden_depot_arc() {
        // coordinate-style graph: the direct depot arc is forbidden, so the
        // skeleton starts at cost zero and the first insertion replaces a
        // costless arc
        let mut g = test_graph(2, 10, vec![4, 3]);
        g.cost[0][5] = -1.0;
        let h = BestInsertionHeuristic::new(InsertionRule::CostOnly);
        let p = h.construct(&g).unwrap();
        assert!(p.is_complete(&g));
        let check = Path::from_nodes(&g, p.nodes.clone()).unwrap();
        assert!((p.total_cost - check.total_cost).abs() < 1e-9);
        assert_eq!(p.total_load, check.total_load);
    }

    #[test]
    fn test_unit_costs_reach_the_optimum() {
        // with symmetric unit costs every complete path costs exactly 2n+1,
        // which is also the MILP optimum
        let g = test_graph(2, 10, vec![6, 6]);
        let h = BestInsertionHeuristic::new(InsertionRule::CostOnly);
        let p = h.construct(&g).unwrap();
        assert!(p.is_complete(&g));
        assert!((p.total_cost - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tight_capacity_forces_alternation() {
        // capacity equals the max demand: every pickup must be delivered
        // before the next pickup fits
        let g = test_graph(2, 4, vec![4, 4]);
        let h = BestInsertionHeuristic::new(InsertionRule::CostOnly);
        let p = h.construct(&g).unwrap();
        let mut load = 0;
        for &node in &p.nodes {
            load += g.demand(node);
            assert!(load == 0 || load == 4);
        }
    }

    #[test]
    fn test_deterministic() {
        let g = test_graph(3, 10, vec![4, 3, 5]);
        let h = BestInsertionHeuristic::new(InsertionRule::LoadOverCost);
        let a = h.construct(&g).unwrap();
        let b = h.construct(&g).unwrap();
        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn test_fails_when_nothing_insertable() {
        let mut g = test_graph(1, 10, vec![4]);
        // cut the delivery off from everything except the return depot
        g.cost[1][2] = -1.0;
        let h = BestInsertionHeuristic::new(InsertionRule::CostOnly);
        assert!(matches!(h.construct(&g), Err(HeuristicError::NoFeasibleInsertion)));
    }
}
