//! Max-regret construction heuristic.
//!
//! At every step each remaining request is scored by the regret between its
//! best and second-best feasible insertions; the request with the largest
//! regret is inserted at its best position. Requests with a single feasible
//! insertion are placed immediately, requests with none are skipped until no
//! request can be placed at all.

use crate::counters;
use crate::graph::Graph;
use crate::heuristics::insertion::{try_insert, InsertionRule, RegretRule};
use crate::heuristics::{ConstructionHeuristic, HeuristicError};
use crate::path::Path;
use std::time::Instant;

pub struct MaxRegretHeuristic {
    pub rule: InsertionRule,
    pub regret: RegretRule,
}

/// Best and second-best insertion of one request into the current path.
struct RequestCandidates {
    best: Option<Path>,
    best_cost: f64,
    best_load: i32,
    second_cost: f64,
    second_load: i32,
    count: usize,
}

impl MaxRegretHeuristic {
    pub fn new(rule: InsertionRule, regret: RegretRule) -> Self {
        MaxRegretHeuristic { rule, regret }
    }

    /// Scan all positions, keeping the two rule-best candidates. The prune
    /// bound handed to the primitive is the second best: anything worse
    /// cannot affect either slot.
    fn scan_request(&self, g: &Graph, path: &Path, request: usize) -> RequestCandidates {
        let (sentinel_cost, sentinel_load) = InsertionRule::sentinel();
        let mut cands = RequestCandidates {
            best: None,
            best_cost: sentinel_cost,
            best_load: sentinel_load,
            second_cost: sentinel_cost,
            second_load: sentinel_load,
            count: 0,
        };

        for x in 1..path.len() {
            for y in x..path.len() {
                if let Some(candidate) = try_insert(
                    g,
                    self.rule,
                    request,
                    x,
                    y,
                    path,
                    cands.second_cost,
                    cands.second_load,
                ) {
                    cands.count += 1;
                    let (c, l) = (candidate.total_cost, candidate.total_load);
                    if self.rule.better(c, l, cands.best_cost, cands.best_load) {
                        cands.second_cost = cands.best_cost;
                        cands.second_load = cands.best_load;
                        cands.best_cost = c;
                        cands.best_load = l;
                        cands.best = Some(candidate);
                    } else {
                        cands.second_cost = c;
                        cands.second_load = l;
                    }
                }
            }
        }

        cands
    }

    fn regret_of(&self, cands: &RequestCandidates) -> f64 {
        match (cands.best.is_some(), cands.count) {
            (false, _) => -1.0,
            (true, 1) => f64::INFINITY,
            (true, _) => self.regret.score(
                cands.best_cost,
                cands.best_load,
                cands.second_cost,
                cands.second_load,
            ),
        }
    }

    fn build(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let mut path = Path::skeleton(g);
        let mut remaining: Vec<usize> = (1..=g.n).collect();

        while !remaining.is_empty() {
            let mut best_request: Option<(usize, Path)> = None;
            let mut max_regret = -1.0;

            for &request in &remaining {
                let cands = self.scan_request(g, &path, request);
                let regret = self.regret_of(&cands);
                if regret >= 0.0 && (best_request.is_none() || regret > max_regret) {
                    max_regret = regret;
                    best_request = Some((request, cands.best.unwrap()));
                }
            }

            match best_request {
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

impl ConstructionHeuristic for MaxRegretHeuristic {
    fn construct(&self, g: &Graph) -> Result<Path, HeuristicError> {
        let start = Instant::now();
        let result = self.build(g);
        counters::add_heuristic_time(start.elapsed());
        result
    }

    fn name(&self) -> &str {
        match self.regret {
            RegretRule::RatioDifference => "MaxRegret-Ratio",
            RegretRule::ProductGap => "MaxRegret-Product",
        }
    }
}
