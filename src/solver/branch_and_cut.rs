//! Gurobi model assembly, warm starts and callback wiring.
//!
//! One binary variable per allowed arc, created in the same row-major
//! forbidden-arc-skipping order as the reduced graph's arc ids, so that a
//! variable's position in the array is exactly its LP column index. The
//! base model uses degree constraints, MTZ position variables with the
//! pickup-before-delivery precedence, and big-M load propagation bounded by
//! the vehicle capacity; the separators strengthen it with user cuts during
//! branch-and-bound.

use crate::counters;
use crate::graph::{Graph, ReducedGraph};
use crate::path::Path;
use crate::solver::callbacks::{
    separate_feasibility_cuts, CutSense, LpSolution, SubtourSeparator,
};
use crate::solver::{BcConfig, BcReport, SolverError};
use grb::callback::{Callback, CbResult, Where};
use grb::prelude::*;
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct BranchAndCutSolver {
    pub config: BcConfig,
}

/// Callback dispatching both separators on fractional node relaxations.
struct CutSeparation<'a> {
    g: &'a Graph,
    gr: &'a ReducedGraph,
    vars: &'a [Var],
    eps: f64,
    rng: ChaCha8Rng,
    /// Eligible invocations seen so far, for the separation cadence
    eligible_calls: u64,
}

impl Callback for CutSeparation<'_> {
    fn callback(&mut self, w: Where) -> CbResult {
        if let Where::MIPNode(ctx) = w {
            if ctx.status()? != Status::Optimal {
                return Ok(());
            }

            self.eligible_calls += 1;
            if (self.eligible_calls - 1) % counters::cut_search_interval() != 0 {
                return Ok(());
            }

            let values = ctx.get_node_rel(self.vars)?;
            let sol = LpSolution::from_column_values(self.gr, &values);

            let mut cuts = separate_feasibility_cuts(self.g, self.gr, &sol, self.eps);
            let mut subtour = SubtourSeparator::new(self.g, self.gr, &sol, self.eps);
            cuts.extend(subtour.separate(&mut self.rng)?);

            if !cuts.is_empty() {
                debug!("adding {} cuts at a fractional node", cuts.len());
                counters::add_cuts(cuts.len() as u64);
            }
            for cut in cuts {
                let lhs = cut
                    .terms
                    .iter()
                    .map(|&(col, coeff)| coeff * self.vars[col])
                    .grb_sum();
                match cut.sense {
                    CutSense::Ge => ctx.add_cut(c!(lhs >= cut.rhs))?,
                    CutSense::Le => ctx.add_cut(c!(lhs <= cut.rhs))?,
                }
            }
        }
        Ok(())
    }
}

impl BranchAndCutSolver {
    pub fn new(config: BcConfig) -> Self {
        BranchAndCutSolver { config }
    }

    /// Build the model, inject the warm starts and run branch-and-cut.
    pub fn solve(&self, g: &Graph, warm_starts: &[Path]) -> Result<BcReport, SolverError> {
        let gr = g.reduced();
        let side = g.num_nodes();

        let env = Env::new("").map_err(engine_err)?;
        let mut model = Model::with_env("tsppd", env).map_err(engine_err)?;

        model.set_param(param::TimeLimit, self.config.time_limit).map_err(engine_err)?;
        model.set_param(param::MIPGap, self.config.mip_gap).map_err(engine_err)?;
        model.set_param(param::Threads, self.config.threads).map_err(engine_err)?;
        if !self.config.verbose {
            model.set_param(param::OutputFlag, 0).map_err(engine_err)?;
        }

        // x[col] = 1 if the col-th allowed arc is used
        let mut x: Vec<Var> = Vec::with_capacity(gr.num_columns());
        for arc in gr.arcs() {
            let var = add_binvar!(model,
                name: &format!("x_{}_{}", arc.from, arc.to),
                obj: g.cost(arc.from, arc.to)
            )
            .map_err(engine_err)?;
            x.push(var);
        }

        // u[i] = position of node i along the path
        let mut u: Vec<Var> = Vec::with_capacity(side);
        for i in 0..side {
            let var = add_ctsvar!(model,
                name: &format!("u_{}", i),
                bounds: 0.0..(side - 1) as f64
            )
            .map_err(engine_err)?;
            u.push(var);
        }

        // q[i] = load after leaving node i, bounded by the capacity
        let mut q: Vec<Var> = Vec::with_capacity(side);
        for i in 0..side {
            let var = add_ctsvar!(model,
                name: &format!("q_{}", i),
                bounds: 0.0..g.capacity as f64
            )
            .map_err(engine_err)?;
            q.push(var);
        }

        model.update().map_err(engine_err)?;

        // Degree constraints: one arc out of every node but the return
        // depot, one arc into every node but the start depot.
        for i in 0..side - 1 {
            let expr = gr
                .arcs()
                .iter()
                .filter(|arc| arc.from == i)
                .map(|arc| x[arc.id])
                .grb_sum();
            model.add_constr(&format!("out_{}", i), c!(expr == 1.0)).map_err(engine_err)?;
        }
        for j in 1..side {
            let expr = gr
                .arcs()
                .iter()
                .filter(|arc| arc.to == j)
                .map(|arc| x[arc.id])
                .grb_sum();
            model.add_constr(&format!("in_{}", j), c!(expr == 1.0)).map_err(engine_err)?;
        }

        // MTZ positions with precedence
        let big_m = side as f64;
        model.add_constr("start_position", c!(u[0] == 0.0)).map_err(engine_err)?;
        for arc in gr.arcs() {
            if arc.to == 0 {
                continue;
            }
            model
                .add_constr(
                    &format!("pos_{}_{}", arc.from, arc.to),
                    c!(u[arc.to] >= u[arc.from] + 1.0 - big_m * (1.0 - x[arc.id])),
                )
                .map_err(engine_err)?;
        }
        for r in 1..=g.n {
            model
                .add_constr(
                    &format!("precedence_{}", r),
                    c!(u[g.pickup(r)] + 1.0 <= u[g.delivery(r)]),
                )
                .map_err(engine_err)?;
        }

        // Load propagation
        let load_m = 2.0 * g.capacity as f64;
        model.add_constr("start_load", c!(q[0] == 0.0)).map_err(engine_err)?;
        for arc in gr.arcs() {
            if arc.to == 0 {
                continue;
            }
            let demand = g.demand(arc.to) as f64;
            model
                .add_constr(
                    &format!("load_lb_{}_{}", arc.from, arc.to),
                    c!(q[arc.to] >= q[arc.from] + demand - load_m * (1.0 - x[arc.id])),
                )
                .map_err(engine_err)?;
            model
                .add_constr(
                    &format!("load_ub_{}_{}", arc.from, arc.to),
                    c!(q[arc.to] <= q[arc.from] + demand + load_m * (1.0 - x[arc.id])),
                )
                .map_err(engine_err)?;
        }

        // One MIP start per heuristic path
        if !warm_starts.is_empty() {
            model
                .set_attr(attr::NumStart, warm_starts.len() as i32)
                .map_err(engine_err)?;
            for (k, path) in warm_starts.iter().enumerate() {
                model.set_attr(attr::StartNumber, k as i32).map_err(engine_err)?;
                for var in &x {
                    model.set_obj_attr(attr::Start, var, 0.0).map_err(engine_err)?;
                }
                for w in path.nodes.windows(2) {
                    if let Some(col) = gr.column(w[0], w[1]) {
                        model.set_obj_attr(attr::Start, &x[col], 1.0).map_err(engine_err)?;
                    }
                }
            }
            info!("injected {} warm starts", warm_starts.len());
        }

        model.update().map_err(engine_err)?;

        let mut separation = CutSeparation {
            g,
            gr: &gr,
            vars: &x,
            eps: self.config.eps,
            rng: ChaCha8Rng::seed_from_u64(self.config.seed),
            eligible_calls: 0,
        };
        model.optimize_with_callback(&mut separation).map_err(engine_err)?;

        let status = model.status().map_err(engine_err)?;
        match status {
            Status::Infeasible => return Err(SolverError::Infeasible),
            Status::Unbounded | Status::InfOrUnbd => return Err(SolverError::Unbounded),
            _ => {}
        }

        let status_str = match status {
            Status::Optimal => "Optimal",
            Status::TimeLimit => "TimeLimit",
            Status::NodeLimit => "NodeLimit",
            Status::SolutionLimit => "SolutionLimit",
            Status::Interrupted => "Interrupted",
            _ => "Unknown",
        };

        let upper_bound = model.get_attr(attr::ObjVal).unwrap_or(f64::INFINITY);
        let lower_bound = model.get_attr(attr::ObjBound).unwrap_or(f64::NEG_INFINITY);
        let gap = model.get_attr(attr::MIPGap).unwrap_or(1.0);
        let nodes_explored = model.get_attr(attr::NodeCount).unwrap_or(0.0) as i64;

        let path = self.extract_path(g, &gr, &model, &x);

        Ok(BcReport {
            path,
            lower_bound,
            upper_bound,
            gap,
            optimal: status == Status::Optimal,
            status: status_str.to_string(),
            nodes_explored,
            counters: counters::snapshot(),
        })
    }

    /// Follow the selected arcs from the start depot and revalidate.
    fn extract_path(
        &self,
        g: &Graph,
        gr: &ReducedGraph,
        model: &Model,
        x: &[Var],
    ) -> Option<Path> {
        let mut nodes = vec![g.start_depot()];
        let mut current = g.start_depot();
        for _ in 0..g.num_nodes() - 1 {
            let next = gr
                .arcs()
                .iter()
                .filter(|arc| arc.from == current)
                .find(|arc| {
                    model.get_obj_attr(attr::X, &x[arc.id]).map(|v| v > 0.5).unwrap_or(false)
                })
                .map(|arc| arc.to)?;
            nodes.push(next);
            current = next;
        }
        Path::from_nodes(g, nodes).ok()
    }
}

fn engine_err(e: grb::Error) -> SolverError {
    SolverError::Engine(e.to_string())
}
