//! Constructive heuristics producing warm-start paths.
//!
//! All heuristics share the insertion primitive from [`insertion`] and are
//! polymorphic over small rule objects: an insertion comparator, a regret
//! score and a request ordering. Every run accumulates its elapsed time to
//! the process-wide heuristics counter.

pub mod best_insertion;
pub mod insertion;
pub mod k_opt;
pub mod max_regret;
pub mod ordered_requests;
pub mod pool;

pub use best_insertion::BestInsertionHeuristic;
pub use insertion::{try_insert, InsertionRule, RegretRule, RequestOrder};
pub use k_opt::KOptHeuristic;
pub use max_regret::MaxRegretHeuristic;
pub use ordered_requests::OrderedRequestsHeuristic;
pub use pool::{HeuristicSolver, InstanceSizeLimit};

use crate::graph::Graph;
use crate::path::Path;

/// A heuristic that builds one feasible path from scratch.
pub trait ConstructionHeuristic {
    fn construct(&self, g: &Graph) -> Result<Path, HeuristicError>;
    fn name(&self) -> &str;
}

/// Failure of a constructive heuristic. Failures are isolated: the caller
/// drops the result and continues with the other heuristics.
#[derive(Debug)]
pub enum HeuristicError {
    /// No remaining request admits any feasible insertion
    NoFeasibleInsertion,
    /// A specific request has no feasible position (ordered insertion)
    RequestNotInsertable(usize),
}

impl std::fmt::Display for HeuristicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeuristicError::NoFeasibleInsertion => {
                write!(f, "no remaining request admits a feasible insertion")
            }
            HeuristicError::RequestNotInsertable(r) => {
                write!(f, "request {} has no feasible insertion position", r)
            }
        }
    }
}

impl std::error::Error for HeuristicError {}
