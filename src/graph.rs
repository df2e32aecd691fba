//! Cost/load graph for the pickup-and-delivery problem.
//!
//! Nodes are numbered 0 (start depot), 1..n (pickups), n+1..2n (deliveries,
//! delivery of request i is node n+i) and 2n+1 (return depot). The cost
//! matrix is square of side 2n+2; a negative entry marks a forbidden arc.
//! The derived [`ReducedGraph`] keeps only the allowed arcs, each carrying a
//! stable integer id that doubles as the LP column index.

use serde::{Deserialize, Serialize};

/// Immutable problem graph: costs, capacity and request demands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Instance name (from the input file, or synthetic for tests)
    pub name: String,
    /// Number of requests
    pub n: usize,
    /// Vehicle capacity
    pub capacity: i32,
    /// Cost matrix of side 2n+2; `cost[i][j] < 0` marks a forbidden arc
    pub cost: Vec<Vec<f64>>,
    /// Demand per node: 0 at the depots, `q[i]` at pickup i, `-q[i]` at n+i
    pub demand: Vec<i32>,
}

/// Errors raised while validating a graph.
#[derive(Debug)]
pub enum GraphError {
    NoRequests,
    CostMatrixNotSquare { expected: usize, rows: usize },
    SelfLoopAllowed(usize),
    RequiredArcForbidden { from: usize, to: usize },
    BadDemand { request: usize, demand: i32 },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NoRequests => write!(f, "instance has no requests"),
            GraphError::CostMatrixNotSquare { expected, rows } => {
                write!(f, "cost matrix must be square of side {}, got {} rows", expected, rows)
            }
            GraphError::SelfLoopAllowed(i) => {
                write!(f, "self-loop arc ({0}, {0}) must be forbidden", i)
            }
            GraphError::RequiredArcForbidden { from, to } => {
                write!(f, "arc ({}, {}) must be allowed for the instance to be solvable", from, to)
            }
            GraphError::BadDemand { request, demand } => {
                write!(f, "request {} has demand {} outside (0, capacity]", request, demand)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl Graph {
    /// Build and validate a graph from a cost matrix and pickup demands.
    ///
    /// `pickup_demands` has one positive entry per request; the paired
    /// delivery demands are derived as their negation.
    pub fn new(
        name: String,
        capacity: i32,
        cost: Vec<Vec<f64>>,
        pickup_demands: Vec<i32>,
    ) -> Result<Self, GraphError> {
        let n = pickup_demands.len();
        if n == 0 {
            return Err(GraphError::NoRequests);
        }

        let side = 2 * n + 2;
        if cost.len() != side {
            return Err(GraphError::CostMatrixNotSquare { expected: side, rows: cost.len() });
        }
        for row in &cost {
            if row.len() != side {
                return Err(GraphError::CostMatrixNotSquare { expected: side, rows: row.len() });
            }
        }

        for i in 0..side {
            if cost[i][i] >= 0.0 {
                return Err(GraphError::SelfLoopAllowed(i));
            }
        }

        // Every pickup must be reachable from the start depot and every
        // delivery must reach the return depot, otherwise no Hamiltonian
        // path exists at all.
        for r in 1..=n {
            if cost[0][r] < 0.0 {
                return Err(GraphError::RequiredArcForbidden { from: 0, to: r });
            }
            if cost[n + r][2 * n + 1] < 0.0 {
                return Err(GraphError::RequiredArcForbidden { from: n + r, to: 2 * n + 1 });
            }
        }

        let mut demand = vec![0i32; side];
        for (idx, &q) in pickup_demands.iter().enumerate() {
            let request = idx + 1;
            if q <= 0 || q > capacity {
                return Err(GraphError::BadDemand { request, demand: q });
            }
            demand[request] = q;
            demand[n + request] = -q;
        }

        Ok(Graph { name, n, capacity, cost, demand })
    }

    /// Total number of nodes, depots included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        2 * self.n + 2
    }

    /// The start depot, node 0.
    #[inline]
    pub fn start_depot(&self) -> usize {
        0
    }

    /// The return depot, node 2n+1.
    #[inline]
    pub fn end_depot(&self) -> usize {
        2 * self.n + 1
    }

    /// Pickup node of request `r`.
    #[inline]
    pub fn pickup(&self, r: usize) -> usize {
        r
    }

    /// Delivery node of request `r`.
    #[inline]
    pub fn delivery(&self, r: usize) -> usize {
        self.n + r
    }

    #[inline]
    pub fn is_pickup(&self, node: usize) -> bool {
        node >= 1 && node <= self.n
    }

    #[inline]
    pub fn is_delivery(&self, node: usize) -> bool {
        node > self.n && node <= 2 * self.n
    }

    /// Arc cost; negative means forbidden.
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.cost[i][j]
    }

    /// Whether arc (i, j) may appear in a solution.
    #[inline]
    pub fn is_allowed(&self, i: usize, j: usize) -> bool {
        self.cost[i][j] >= 0.0
    }

    /// Demand processed when visiting `node`.
    #[inline]
    pub fn demand(&self, node: usize) -> i32 {
        self.demand[node]
    }

    /// Build the reduced support graph of allowed arcs.
    pub fn reduced(&self) -> ReducedGraph {
        let side = self.num_nodes();
        let mut arcs = Vec::new();
        let mut column = vec![vec![None; side]; side];

        // Row-major enumeration skipping forbidden arcs: the arc id is the
        // LP column index, and every separator relies on this ordering.
        for i in 0..side {
            for j in 0..side {
                if self.cost[i][j] >= 0.0 {
                    let id = arcs.len();
                    column[i][j] = Some(id);
                    arcs.push(Arc { id, from: i, to: j });
                }
            }
        }

        ReducedGraph { num_nodes: side, arcs, column }
    }
}

/// A directed arc of the reduced graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    /// Stable id, equal to the arc's LP column index
    pub id: usize,
    pub from: usize,
    pub to: usize,
}

/// Support graph of the allowed arcs, shared read-only by the separators.
#[derive(Debug, Clone)]
pub struct ReducedGraph {
    num_nodes: usize,
    arcs: Vec<Arc>,
    column: Vec<Vec<Option<usize>>>,
}

impl ReducedGraph {
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// All allowed arcs in column order.
    #[inline]
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Number of LP columns (one per allowed arc).
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.arcs.len()
    }

    /// LP column of arc (i, j), or `None` if the arc is forbidden.
    #[inline]
    pub fn column(&self, i: usize, j: usize) -> Option<usize> {
        self.column[i][j]
    }
}
