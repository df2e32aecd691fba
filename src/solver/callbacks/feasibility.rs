//! Feasibility-cut separation via minimum cuts.
//!
//! For each request i two s-t flow instances are solved on the reduced
//! graph with arc capacities taken from the fractional solution: the
//! precedence flow from pickup i to delivery n+i, and the cycle flow from
//! delivery n+i to the return depot. A max flow below 1 exposes a deficient
//! cut, and the inequality requiring at least one unit across it is emitted.

use crate::counters;
use crate::graph::{Graph, ReducedGraph};
use crate::solver::callbacks::{Cut, CutSense, LpSolution};
use crate::solver::flow::FlowNetwork;
use log::debug;
use std::time::Instant;

/// Separate violated feasibility cuts from the fractional solution `sol`.
pub fn separate_feasibility_cuts(
    g: &Graph,
    gr: &ReducedGraph,
    sol: &LpSolution,
    eps: f64,
) -> Vec<Cut> {
    let start = Instant::now();
    let n = g.n;
    let mut cuts = Vec::new();

    // Requests whose cycle flow is already implied by an earlier cut.
    let mut already_checked_cycle = vec![false; n + 1];

    for i in 1..=n {
        let mut precedence_net = support_network(gr, sol);
        let flow = precedence_net.max_flow(g.pickup(i), g.delivery(i));
        if flow < 1.0 - eps {
            let side = precedence_net.min_cut_side(g.pickup(i));
            cuts.push(boundary_cut(gr, &side));
        }

        if !already_checked_cycle[i] {
            let mut cycle_net = support_network(gr, sol);
            let flow = cycle_net.max_flow(g.delivery(i), g.end_depot());
            if flow < 1.0 - eps {
                let side = cycle_net.min_cut_side(g.delivery(i));
                // Every delivery on the source side would produce the same
                // deficient cut, so skip its cycle computation later.
                for j in n + 1..=2 * n {
                    if side[j] {
                        already_checked_cycle[j - n] = true;
                    }
                }
                cuts.push(boundary_cut(gr, &side));
            }
        }
    }

    if !cuts.is_empty() {
        debug!("feasibility separation found {} cuts", cuts.len());
    }
    counters::add_separation_time(start.elapsed());
    cuts
}

/// Flow network over the allowed arcs with the LP values as capacities.
fn support_network(gr: &ReducedGraph, sol: &LpSolution) -> FlowNetwork {
    let mut net = FlowNetwork::new(gr.num_nodes());
    for arc in gr.arcs() {
        net.add_edge(arc.from, arc.to, sol.value(arc.from, arc.to));
    }
    net
}

/// `sum of x over allowed arcs leaving the cut side >= 1`.
fn boundary_cut(gr: &ReducedGraph, side: &[bool]) -> Cut {
    let terms = gr
        .arcs()
        .iter()
        .filter(|arc| side[arc.from] && !side[arc.to])
        .map(|arc| (arc.id, 1.0))
        .collect();
    Cut { terms, sense: CutSense::Ge, rhs: 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn test_graph(n: usize, capacity: i32, demands: Vec<i32>) -> Graph {
        let side = 2 * n + 2;
        let mut cost = vec![vec![1.0; side]; side];
        for i in 0..side {
            cost[i][i] = -1.0;
        }
        Graph::new("t".into(), capacity, cost, demands).unwrap()
    }

    fn lp_with(g: &Graph, entries: &[(usize, usize, f64)]) -> LpSolution {
        let side = g.num_nodes();
        let mut x = vec![vec![0.0; side]; side];
        for &(i, j, v) in entries {
            x[i][j] = v;
        }
        LpSolution { x }
    }

    #[test]
    fn test_deficient_precedence_flow_yields_singleton_cut() {
        // only 0.4 units can travel from pickup 1 to delivery 2
        let g = test_graph(1, 10, vec![4]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(1, 2, 0.4)]);

        let cuts = separate_feasibility_cuts(&g, &gr, &sol, 1e-6);
        assert!(!cuts.is_empty());

        // the precedence cut separates S = {1} from the rest
        let first = &cuts[0];
        assert_eq!(first.sense, CutSense::Ge);
        assert_eq!(first.rhs, 1.0);
        let froms: Vec<usize> =
            first.terms.iter().map(|&(col, _)| gr.arcs()[col].from).collect();
        assert!(froms.iter().all(|&f| f == 1));
        assert!(first.terms.iter().any(|&(col, _)| Some(col) == gr.column(1, 2)));
        assert!(first.is_violated(gr.arcs(), &sol, 1e-6));
    }

    #[test]
    fn test_saturated_flows_yield_no_precedence_cut() {
        // a fully integral feasible path: 0 -> 1 -> 2 -> 3
        let g = test_graph(1, 10, vec![4]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);

        let cuts = separate_feasibility_cuts(&g, &gr, &sol, 1e-6);
        assert!(cuts.is_empty());
    }

    #[test]
    fn test_every_cut_is_violated_and_on_allowed_arcs() {
        let mut g = test_graph(2, 10, vec![4, 3]);
        g.cost[1][4] = -1.0; // a forbidden arc that must never appear
        let gr = g.reduced();
        // half-integral point with weak connectivity to the return depot
        let sol = lp_with(
            &g,
            &[(0, 1, 1.0), (1, 2, 0.5), (2, 1, 0.5), (1, 3, 0.5), (3, 4, 0.5), (2, 4, 0.5)],
        );

        let cuts = separate_feasibility_cuts(&g, &gr, &sol, 1e-6);
        assert!(!cuts.is_empty());
        for cut in &cuts {
            assert!(cut.is_violated(gr.arcs(), &sol, 1e-6));
            for &(col, _) in &cut.terms {
                let arc = gr.arcs()[col];
                assert!(g.is_allowed(arc.from, arc.to));
                assert!(!(arc.from == 1 && arc.to == 4));
            }
        }
    }

    #[test]
    fn test_cycle_skip_bookkeeping_still_cuts() {
        // nothing reaches the return depot at all: every request's cycle
        // flow is deficient, but source sides overlap so later requests are
        // skipped without losing the first cut
        let g = test_graph(2, 10, vec![4, 3]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(0, 1, 1.0), (1, 3, 1.0), (3, 2, 1.0), (2, 4, 1.0)]);

        let cuts = separate_feasibility_cuts(&g, &gr, &sol, 1e-6);
        // both precedence flows are saturated; the cycle cuts remain
        assert!(!cuts.is_empty());
        for cut in &cuts {
            assert!(cut.is_violated(gr.arcs(), &sol, 1e-6));
        }
    }

    #[test]
    fn test_separation_time_counter_increases() {
        let g = test_graph(1, 10, vec![4]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(1, 2, 0.4)]);
        let before = counters::separation_time();
        separate_feasibility_cuts(&g, &gr, &sol, 1e-6);
        assert!(counters::separation_time() >= before);
    }
}
