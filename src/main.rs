//! Command line interface for the pickup-and-delivery branch-and-cut solver.

use clap::{Parser, Subcommand};
use tsppd_solver::counters;
use tsppd_solver::graph::Graph;
use tsppd_solver::heuristics::HeuristicSolver;
use tsppd_solver::instance;
use tsppd_solver::report::RunSummary;
use tsppd_solver::solver::{BcConfig, BranchAndCutSolver};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tsppd-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Branch-and-cut solver for the single-vehicle pickup and delivery TSP")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the warm-start heuristics only
    Heuristics {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Write the resulting paths as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run heuristics followed by full branch-and-cut
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Time limit in seconds
        #[arg(short, long, default_value = "3600")]
        time_limit: f64,

        /// MIP gap tolerance
        #[arg(long, default_value = "1e-6")]
        mip_gap: f64,

        /// Number of threads (0 = automatic)
        #[arg(long, default_value = "0")]
        threads: i32,

        /// Random seed for the Groetschel cut shuffling
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Search for cuts every n-th eligible branch-and-bound callback
        /// (overrides the TSPPD_CUT_INTERVAL environment variable)
        #[arg(long)]
        cut_interval: Option<u64>,

        /// Violation tolerance for the separators
        #[arg(long, default_value = "1e-6")]
        eps: f64,

        /// Write the final report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output (includes engine logs)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics about an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Heuristics { instance, output, verbose } => {
            run_heuristics(&instance, output, verbose);
        }
        Commands::Solve {
            instance,
            time_limit,
            mip_gap,
            threads,
            seed,
            cut_interval,
            eps,
            output,
            verbose,
        } => {
            run_solve(
                &instance,
                BcConfig { time_limit, mip_gap, threads, verbose, eps, seed },
                cut_interval,
                output,
                verbose,
            );
        }
        Commands::Analyze { instance } => {
            analyze(&instance);
        }
    }
}

fn load_graph(path: &PathBuf) -> Graph {
    match instance::load(path) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_heuristics(path: &PathBuf, output: Option<PathBuf>, verbose: bool) {
    let g = load_graph(path);
    println!("Loaded {} ({} requests, capacity {})", g.name, g.n, g.capacity);

    let pool = HeuristicSolver::new().solve(&g);
    if pool.is_empty() {
        eprintln!("No heuristic produced a feasible path");
        std::process::exit(1);
    }

    println!("\n========== Heuristic results ==========");
    for path in &pool {
        if verbose {
            println!("  {}", path);
        } else {
            println!("  cost {:.2}", path.total_cost);
        }
    }

    let summary = RunSummary::new(&g.name, &pool);
    println!("{}", summary);

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&pool).unwrap();
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Failed to write output: {}", e);
            std::process::exit(1);
        }
        println!("Paths saved to {:?}", out_path);
    }
}

fn run_solve(
    path: &PathBuf,
    config: BcConfig,
    cut_interval: Option<u64>,
    output: Option<PathBuf>,
    verbose: bool,
) {
    let g = load_graph(path);
    println!("Loaded {} ({} requests, capacity {})", g.name, g.n, g.capacity);

    let interval = cut_interval
        .or_else(|| std::env::var("TSPPD_CUT_INTERVAL").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(1);
    counters::set_cut_search_interval(interval);

    let pool = HeuristicSolver::new().solve(&g);
    println!("Warm-start pool: {} paths", pool.len());

    let solver = BranchAndCutSolver::new(config);
    let report = match solver.solve(&g, &pool) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n========== Results ==========");
    println!("Status: {}", report.status);
    println!("Best cost: {:.2}", report.upper_bound);
    println!("Lower bound: {:.2}", report.lower_bound);
    println!("Gap: {:.4}%", report.gap * 100.0);
    println!("Nodes explored: {}", report.nodes_explored);
    println!("Counters: {}", report.counters);
    if let Some(ref best) = report.path {
        if verbose {
            println!("Path: {}", best);
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&report).unwrap();
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Failed to write output: {}", e);
            std::process::exit(1);
        }
        println!("Report saved to {:?}", out_path);
    }
}

fn analyze(path: &PathBuf) {
    let g = load_graph(path);
    let side = g.num_nodes();

    let mut allowed = 0usize;
    let mut min_cost = f64::INFINITY;
    let mut max_cost: f64 = 0.0;
    let mut total_cost = 0.0;
    for i in 0..side {
        for j in 0..side {
            if g.is_allowed(i, j) {
                allowed += 1;
                min_cost = min_cost.min(g.cost(i, j));
                max_cost = max_cost.max(g.cost(i, j));
                total_cost += g.cost(i, j);
            }
        }
    }

    let max_demand = (1..=g.n).map(|r| g.demand(r)).max().unwrap_or(0);
    let total_demand: i32 = (1..=g.n).map(|r| g.demand(r)).sum();

    println!("========== Instance analysis ==========");
    println!("Instance: {}", g.name);
    println!("  Requests: {} ({} nodes including depots)", g.n, side);
    println!("  Capacity: {}", g.capacity);
    println!("  Max demand: {} ({:.1}% of capacity)", max_demand, 100.0 * max_demand as f64 / g.capacity as f64);
    println!("  Total pickup load: {}", total_demand);
    println!("  Allowed arcs: {} of {}", allowed, side * side);
    if allowed > 0 {
        println!("  Arc cost: min {:.2}, avg {:.2}, max {:.2}", min_cost, total_cost / allowed as f64, max_cost);
    }
}
