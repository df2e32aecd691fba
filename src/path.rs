//! Path representation for the pickup-and-delivery problem.
//!
//! A path is an ordered node sequence from the start depot 0 to the return
//! depot 2n+1 together with its total cost and total carried load. Paths are
//! produced by the constructive heuristics and injected into the MILP engine
//! as warm starts.

use crate::graph::Graph;
use serde::{Deserialize, Serialize};

/// A (possibly partial) depot-to-depot path with running totals.
///
/// `total_load` is the load summed over every traversed arc, i.e. the load
/// carried when leaving each node except the last. The insertion comparators
/// trade this quantity off against `total_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Visited nodes, starting at 0 and ending at 2n+1
    pub nodes: Vec<usize>,
    /// Sum of arc costs along the sequence
    pub total_cost: f64,
    /// Sum of the load carried over each arc
    pub total_load: i32,
}

/// Errors raised while validating a node sequence.
#[derive(Debug)]
pub enum PathError {
    BadEndpoints,
    DuplicateNode(usize),
    ForbiddenArc { from: usize, to: usize },
    PrecedenceViolated { request: usize },
    CapacityExceeded { node: usize, load: i32 },
    NegativeLoad { node: usize, load: i32 },
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::BadEndpoints => {
                write!(f, "path must start at the depot and end at the return depot")
            }
            PathError::DuplicateNode(node) => write!(f, "node {} visited twice", node),
            PathError::ForbiddenArc { from, to } => {
                write!(f, "path uses forbidden arc ({}, {})", from, to)
            }
            PathError::PrecedenceViolated { request } => {
                write!(f, "delivery of request {} not preceded by its pickup", request)
            }
            PathError::CapacityExceeded { node, load } => {
                write!(f, "load {} after node {} exceeds capacity", load, node)
            }
            PathError::NegativeLoad { node, load } => {
                write!(f, "load {} after node {} is negative", load, node)
            }
        }
    }
}

impl std::error::Error for PathError {}

impl Path {
    /// The empty skeleton path `[0, 2n+1]` every heuristic starts from.
    ///
    /// The direct depot-to-depot arc is usually forbidden (coordinate
    /// instances always forbid it); it then carries no cost and disappears
    /// with the first insertion.
    pub fn skeleton(g: &Graph) -> Self {
        let (start, end) = (g.start_depot(), g.end_depot());
        let total_cost = if g.is_allowed(start, end) { g.cost(start, end) } else { 0.0 };
        Path { nodes: vec![start, end], total_cost, total_load: 0 }
    }

    /// Validate a node sequence and compute its totals.
    ///
    /// Checks endpoints, uniqueness, arc allowedness, pickup-before-delivery
    /// precedence and the load staying within `[0, capacity]`. The sequence
    /// does not have to visit every node; use [`Path::is_complete`] for that.
    pub fn from_nodes(g: &Graph, nodes: Vec<usize>) -> Result<Self, PathError> {
        if nodes.len() < 2 || nodes[0] != g.start_depot() || *nodes.last().unwrap() != g.end_depot()
        {
            return Err(PathError::BadEndpoints);
        }

        let mut seen = vec![false; g.num_nodes()];
        for &node in &nodes {
            if seen[node] {
                return Err(PathError::DuplicateNode(node));
            }
            seen[node] = true;
        }

        // Precedence: a delivery may only appear after its pickup, and a
        // pickup that appears must have its delivery in the sequence too.
        let mut position = vec![usize::MAX; g.num_nodes()];
        for (k, &node) in nodes.iter().enumerate() {
            position[node] = k;
        }
        for r in 1..=g.n {
            let p = position[g.pickup(r)];
            let d = position[g.delivery(r)];
            match (p == usize::MAX, d == usize::MAX) {
                (false, false) if p < d => {}
                (true, true) => {}
                _ => return Err(PathError::PrecedenceViolated { request: r }),
            }
        }

        let mut total_cost = 0.0;
        let mut total_load = 0;
        let mut load = 0i32;
        for w in nodes.windows(2) {
            let (from, to) = (w[0], w[1]);
            if !g.is_allowed(from, to) {
                return Err(PathError::ForbiddenArc { from, to });
            }
            total_cost += g.cost(from, to);

            load += g.demand(from);
            if load > g.capacity {
                return Err(PathError::CapacityExceeded { node: from, load });
            }
            if load < 0 {
                return Err(PathError::NegativeLoad { node: from, load });
            }
            total_load += load;
        }

        Ok(Path { nodes, total_cost, total_load })
    }

    /// Number of nodes in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the path visits every node of the graph exactly once.
    pub fn is_complete(&self, g: &Graph) -> bool {
        self.nodes.len() == g.num_nodes()
    }

    /// Position of a node in the sequence.
    pub fn position(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&x| x == node)
    }

    /// Requests in order of their pickup's appearance along the path.
    pub fn request_order(&self, g: &Graph) -> Vec<usize> {
        self.nodes.iter().copied().filter(|&node| g.is_pickup(node)).collect()
    }

    /// Remove a request's pickup and delivery, revalidating the remainder.
    ///
    /// Fails if closing the two gaps needs a forbidden arc.
    pub fn remove_request(&self, g: &Graph, request: usize) -> Result<Path, PathError> {
        let pickup = g.pickup(request);
        let delivery = g.delivery(request);
        let nodes: Vec<usize> =
            self.nodes.iter().copied().filter(|&node| node != pickup && node != delivery).collect();
        Path::from_nodes(g, nodes)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cost {:.2}, load {}, nodes {:?}", self.total_cost, self.total_load, self.nodes)
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
    fn test_skeleton() {
        let g = test_graph(2, 10, vec![3, 4]);
        let p = Path::skeleton(&g);
        assert_eq!(p.nodes, vec![0, 5]);
        assert_eq!(p.total_cost, 1.0);
        assert_eq!(p.total_load, 0);
    }

    #[test]
    fn test_skeleton_with_forbidden_depot_arc() {
        let mut g = test_graph(2, 10, vec![3, 4]);
        g.cost[0][5] = -1.0;
        let p = Path::skeleton(&g);
        assert_eq!(p.nodes, vec![0, 5]);
        assert_eq!(p.total_cost, 0.0);
    }

    #[test]
    fn test_from_nodes_totals() {
        let g = test_graph(1, 10, vec![4]);
        let p = Path::from_nodes(&g, vec![0, 1, 2, 3]).unwrap();
        assert_eq!(p.total_cost, 3.0);
        // load over arcs: 0 after depot, 4 after pickup, 0 after delivery
        assert_eq!(p.total_load, 4);
        assert!(p.is_complete(&g));
    }

    #[test]
    fn test_precedence_rejected() {
        let g = test_graph(1, 10, vec![4]);
        assert!(matches!(
            Path::from_nodes(&g, vec![0, 2, 1, 3]),
            Err(PathError::PrecedenceViolated { request: 1 })
        ));
    }

    #[test]
    fn test_capacity_rejected() {
        let g = test_graph(2, 5, vec![3, 4]);
        // picking up both requests before delivering exceeds capacity 5
        assert!(matches!(
            Path::from_nodes(&g, vec![0, 1, 2, 3, 4, 5]),
            Err(PathError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_remove_request() {
        let g = test_graph(2, 10, vec![3, 4]);
        let p = Path::from_nodes(&g, vec![0, 1, 2, 3, 4, 5]).unwrap();
        let q = p.remove_request(&g, 2).unwrap();
        assert_eq!(q.nodes, vec![0, 1, 3, 5]);
        let base = Path::from_nodes(&g, vec![0, 1, 3, 5]).unwrap();
        assert_eq!(q.total_cost, base.total_cost);
        assert_eq!(q.total_load, base.total_load);
    }

    #[test]
    fn test_request_order() {
        let g = test_graph(2, 10, vec![3, 4]);
        let p = Path::from_nodes(&g, vec![0, 2, 1, 3, 4, 5]).unwrap();
        assert_eq!(p.request_order(&g), vec![2, 1]);
    }
}
