//! Branch-and-cut solver for the single-vehicle pickup and delivery TSP.
//!
//! Computes a minimum-cost Hamiltonian path from the start depot to the
//! return depot that serves every pickup before its paired delivery and
//! never exceeds the vehicle capacity.
//!
//! # Features
//!
//! - Constructive warm-start heuristics (best insertion, max regret,
//!   ordered requests) and a k-opt improver
//! - Min-cut feasibility-cut separation over the fractional relaxation
//! - Tabu-search subtour/precedence-cut separation (base pi/sigma and
//!   lifted Groetschel inequalities)
//! - Gurobi branch-and-cut behind the optional `gurobi` feature
//!
//! # Example
//!
//! ```no_run
//! use tsppd_solver::heuristics::HeuristicSolver;
//!
//! let graph = tsppd_solver::instance::load("instance.txt").unwrap();
//! let pool = HeuristicSolver::new().solve(&graph);
//! for path in &pool {
//!     println!("warm start with cost {:.2}", path.total_cost);
//! }
//! ```

pub mod counters;
pub mod graph;
pub mod heuristics;
pub mod instance;
pub mod path;
pub mod report;
pub mod solver;

pub use graph::Graph;
pub use path::Path;
