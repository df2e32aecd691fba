//! Ordered-request construction heuristic.
//!
//! Requests are sorted once by a [`RequestOrder`] and inserted in that order
//! at their rule-best feasible position. The first request without any
//! feasible position aborts the heuristic.

use crate::counters;
use crate::graph::Graph;
use crate::heuristics::insertion::{try_insert, InsertionRule, RequestOrder};
use crate::heuristics::{ConstructionHeuristic, HeuristicError};
use crate::path::Path;
use std::time::Instant;

pub struct OrderedRequestsHeuristic {
    pub order: RequestOrder,
    pub rule: InsertionRule,
}

impl OrderedRequestsHeuristic {
    pub fn new(order: RequestOrder, rule: InsertionRule) -> Self {
        OrderedRequestsHeuristic { order, rule }
    }

    fn build(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let mut requests: Vec<usize> = (1..=g.n).collect();
        self.order.sort(g, &mut requests);

        let mut path = Path::skeleton(g);
        for request in requests {
            let (sentinel_cost, sentinel_load) = InsertionRule::sentinel();
            let mut best_cost = sentinel_cost;
            let mut best_load = sentinel_load;
            let mut best: Option<Path> = None;

            for x in 1..path.len() {
                for y in x..path.len() {
                    if let Some(candidate) =
                        try_insert(g, self.rule, request, x, y, &path, best_cost, best_load)
                    {
                        best_cost = candidate.total_cost;
                        best_load = candidate.total_load;
                        best = Some(candidate);
                    }
                }
            }

            path = best.ok_or(HeuristicError::RequestNotInsertable(request))?;
        }

        Ok(path)
    }
}

impl ConstructionHeuristic for OrderedRequestsHeuristic {
    fn construct(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let start = Instant::now();
        let result = self.build(g);
        counters::add_heuristic_time(start.elapsed());
        result
    }

    fn name(&self) -> &str {
        match self.order {
            RequestOrder::AscendingPairCost => "OrderedRequests-Ascending",
            RequestOrder::DescendingPairCost => "OrderedRequests-Descending",
        }
    }
}
