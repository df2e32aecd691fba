//! Fractional-capacity flow network with min-cut extraction.
//!
//! The feasibility-cut separator builds one of these per request from the
//! current LP relaxation values and asks for an s-t max flow; when the flow
//! is deficient, the residual-reachable side of the cut yields the violated
//! inequality.

/// Residual capacities below this are treated as empty.
const RESIDUAL_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    to: usize,
    capacity: f64,
    flow: f64,
    /// Index of the paired reverse edge
    rev: usize,
}

/// A directed flow network over fractional capacities.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    num_nodes: usize,
    adj: Vec<Vec<usize>>,
    edges: Vec<FlowEdge>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        FlowNetwork { num_nodes, adj: vec![Vec::new(); num_nodes], edges: Vec::new() }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Add a directed edge and its zero-capacity residual twin.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) {
        let forward = self.edges.len();
        let reverse = forward + 1;
        self.edges.push(FlowEdge { to, capacity, flow: 0.0, rev: reverse });
        self.adj[from].push(forward);
        self.edges.push(FlowEdge { to: from, capacity: 0.0, flow: 0.0, rev: forward });
        self.adj[to].push(reverse);
    }

    #[inline]
    fn residual(&self, edge: usize) -> f64 {
        self.edges[edge].capacity - self.edges[edge].flow
    }

    fn push_flow(&mut self, edge: usize, amount: f64) {
        self.edges[edge].flow += amount;
        let rev = self.edges[edge].rev;
        self.edges[rev].flow -= amount;
    }

    /// Shortest augmenting path from `source` in the residual network,
    /// returned as the incoming edge per visited node.
    fn bfs_augmenting(&self, source: usize, sink: usize) -> Option<Vec<Option<usize>>> {
        let mut parent_edge: Vec<Option<usize>> = vec![None; self.num_nodes];
        let mut visited = vec![false; self.num_nodes];
        let mut queue = std::collections::VecDeque::new();
        visited[source] = true;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for &e in &self.adj[u] {
                let v = self.edges[e].to;
                if !visited[v] && self.residual(e) > RESIDUAL_EPS {
                    visited[v] = true;
                    parent_edge[v] = Some(e);
                    if v == sink {
                        return Some(parent_edge);
                    }
                    queue.push_back(v);
                }
            }
        }
        None
    }

    /// Maximum s-t flow by shortest augmenting paths.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> f64 {
        debug_assert!(source != sink);
        let mut total = 0.0;

        while let Some(parent_edge) = self.bfs_augmenting(source, sink) {
            // Bottleneck along the path
            let mut bottleneck = f64::INFINITY;
            let mut v = sink;
            while v != source {
                let e = parent_edge[v].unwrap();
                bottleneck = bottleneck.min(self.residual(e));
                v = self.edges[self.edges[e].rev].to;
            }

            let mut v = sink;
            while v != source {
                let e = parent_edge[v].unwrap();
                self.push_flow(e, bottleneck);
                v = self.edges[self.edges[e].rev].to;
            }
            total += bottleneck;
        }

        total
    }

    /// Source side of the minimum cut: nodes reachable from `source` in the
    /// residual network. Only meaningful after [`FlowNetwork::max_flow`].
    pub fn min_cut_side(&self, source: usize) -> Vec<bool> {
        let mut side = vec![false; self.num_nodes];
        let mut queue = std::collections::VecDeque::new();
        side[source] = true;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for &e in &self.adj[u] {
                let v = self.edges[e].to;
                if !side[v] && self.residual(e) > RESIDUAL_EPS {
                    side[v] = true;
                    queue.push_back(v);
                }
            }
        }
        side
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_path_bottleneck() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 0.7);
        net.add_edge(1, 2, 0.4);
        let flow = net.max_flow(0, 2);
        assert!((flow - 0.4).abs() < 1e-9);
        let side = net.min_cut_side(0);
        assert_eq!(side, vec![true, true, false]);
    }

    #[test]
    fn test_parallel_paths() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 0.5);
        net.add_edge(1, 3, 0.5);
        net.add_edge(0, 2, 0.25);
        net.add_edge(2, 3, 0.5);
        let flow = net.max_flow(0, 3);
        assert!((flow - 0.75).abs() < 1e-9);
        let side = net.min_cut_side(0);
        // the 0->2 edge saturates, so 2 stays on the sink side
        assert_eq!(side, vec![true, false, false, false]);
    }

    #[test]
    fn test_rerouting_through_residual() {
        // classic case where an augmenting path must undo earlier flow
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 1.0);
        net.add_edge(0, 2, 1.0);
        net.add_edge(1, 2, 1.0);
        net.add_edge(1, 3, 1.0);
        net.add_edge(2, 3, 1.0);
        let flow = net.max_flow(0, 3);
        assert!((flow - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_disconnected_sink() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 0.9);
        let flow = net.max_flow(0, 2);
        assert_eq!(flow, 0.0);
        let side = net.min_cut_side(0);
        assert_eq!(side, vec![true, true, false]);
    }
}
