//! Branch-and-cut orchestration.
//!
//! The MILP engine (Gurobi, through the `grb` crate) is consumed as a black
//! box behind the `gurobi` feature; builds without it get a stub that
//! reports the missing engine. Cut separation lives in [`callbacks`] and is
//! engine-agnostic.

pub mod callbacks;
pub mod flow;

use crate::counters::CountersSnapshot;
use crate::path::Path;
use serde::Serialize;

/// Branch-and-cut configuration.
#[derive(Debug, Clone)]
pub struct BcConfig {
    /// Time limit in seconds
    pub time_limit: f64,
    /// MIP gap tolerance
    pub mip_gap: f64,
    /// Number of threads (0 = automatic)
    pub threads: i32,
    /// Enable engine output
    pub verbose: bool,
    /// Violation tolerance shared by all separators
    pub eps: f64,
    /// Seed for the Groetschel set shuffling
    pub seed: u64,
}

impl Default for BcConfig {
    fn default() -> Self {
        BcConfig {
            time_limit: 3600.0,
            mip_gap: 1e-6,
            threads: 0,
            verbose: false,
            eps: 1e-6,
            seed: 42,
        }
    }
}

/// Outcome of a branch-and-cut run.
#[derive(Debug, Clone, Serialize)]
pub struct BcReport {
    /// Best path found, if any
    pub path: Option<Path>,
    /// Best proven lower bound
    pub lower_bound: f64,
    /// Objective of the best incumbent
    pub upper_bound: f64,
    /// Relative optimality gap
    pub gap: f64,
    /// Whether optimality was proven
    pub optimal: bool,
    /// Engine status string
    pub status: String,
    /// Branch-and-bound nodes explored
    pub nodes_explored: i64,
    /// Counter values at the end of the run
    pub counters: CountersSnapshot,
}

/// Errors surfaced by the branch-and-cut layer.
#[derive(Debug)]
pub enum SolverError {
    /// Engine-side failure, reported verbatim
    Engine(String),
    /// The model was proven infeasible
    Infeasible,
    /// The model was reported unbounded
    Unbounded,
    /// Fatal separation failure inside a callback
    Separation(callbacks::SeparationError),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::Engine(msg) => write!(f, "MILP engine error: {}", msg),
            SolverError::Infeasible => write!(f, "model is infeasible"),
            SolverError::Unbounded => write!(f, "model is unbounded"),
            SolverError::Separation(e) => write!(f, "cut separation failed: {}", e),
        }
    }
}

impl std::error::Error for SolverError {}

impl From<callbacks::SeparationError> for SolverError {
    fn from(e: callbacks::SeparationError) -> Self {
        SolverError::Separation(e)
    }
}

// When built with the `gurobi` feature, expose the real implementation
#[cfg(feature = "gurobi")]
mod branch_and_cut;
#[cfg(feature = "gurobi")]
pub use branch_and_cut::BranchAndCutSolver;

// Otherwise provide a lightweight stub so the rest of the codebase can compile
#[cfg(not(feature = "gurobi"))]
mod branch_and_cut_stub {
    use super::{BcConfig, BcReport, SolverError};
    use crate::graph::Graph;
    use crate::path::Path;

    pub struct BranchAndCutSolver {
        pub config: BcConfig,
    }

    impl BranchAndCutSolver {
        pub fn new(config: BcConfig) -> Self {
            BranchAndCutSolver { config }
        }

        pub fn solve(&self, _g: &Graph, _warm_starts: &[Path]) -> Result<BcReport, SolverError> {
            Err(SolverError::Engine("this build has no Gurobi support, rebuild with --features gurobi".to_string()))
        }
    }
}

#[cfg(not(feature = "gurobi"))]
pub use branch_and_cut_stub::BranchAndCutSolver;
