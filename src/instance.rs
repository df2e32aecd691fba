//! Instance file parsing.
//!
//! Instances are plain text in a TSP-LIB-like keyword format:
//!
//! ```text
//! NAME: demo
//! COMMENT: three requests
//! REQUESTS: 3
//! CAPACITY: 10
//! NODE_COORD_SECTION
//! 0 0.0 0.0
//! 1 1.0 0.0
//! ...
//! DEMAND_SECTION
//! 1 4
//! 2 3
//! 3 5
//! EOF
//! ```
//!
//! Costs come either from `NODE_COORD_SECTION` (Euclidean, with the
//! structurally impossible arcs forbidden) or from an explicit
//! `EDGE_WEIGHT_SECTION` matrix of side 2n+2 where negative entries mark
//! forbidden arcs. `DEMAND_SECTION` lists one positive demand per request;
//! the paired delivery demands are implied.

use crate::graph::{Graph, GraphError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Errors raised while reading an instance file.
#[derive(Debug)]
pub enum InstanceError {
    Io(std::io::Error),
    Malformed(String),
}

impl std::fmt::Display for InstanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceError::Io(e) => write!(f, "cannot read instance: {}", e),
            InstanceError::Malformed(msg) => write!(f, "malformed instance: {}", msg),
        }
    }
}

impl std::error::Error for InstanceError {}

impl From<std::io::Error> for InstanceError {
    fn from(e: std::io::Error) -> Self {
        InstanceError::Io(e)
    }
}

impl From<GraphError> for InstanceError {
    fn from(e: GraphError) -> Self {
        InstanceError::Malformed(e.to_string())
    }
}

/// Load and validate an instance file, producing the problem [`Graph`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<Graph, InstanceError> {
    let fallback = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string());
    let file = File::open(&path)?;
    parse(&fallback, BufReader::new(file))
}

/// Parse an instance from any buffered reader (used directly by tests).
pub fn parse<R: BufRead>(name_fallback: &str, reader: R) -> Result<Graph, InstanceError> {
    let mut name = name_fallback.to_string();
    let mut n: Option<usize> = None;
    let mut capacity: Option<i32> = None;
    let mut coords: Vec<(usize, f64, f64)> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    let mut demands: Vec<(usize, i32)> = Vec::new();

    let mut section = "";

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let lineno = lineno + 1;

        if line.is_empty() {
            continue;
        }
        if line == "EOF" {
            break;
        }

        if let Some(value) = line.strip_prefix("NAME:") {
            name = value.trim().to_string();
            continue;
        }
        if line.starts_with("COMMENT:") || line.starts_with("EDGE_WEIGHT_TYPE:") {
            continue;
        }
        if let Some(value) = line.strip_prefix("REQUESTS:") {
            n = Some(value.trim().parse().map_err(|_| {
                InstanceError::Malformed(format!("line {}: invalid request count", lineno))
            })?);
            continue;
        }
        if let Some(value) = line.strip_prefix("CAPACITY:") {
            capacity = Some(value.trim().parse().map_err(|_| {
                InstanceError::Malformed(format!("line {}: invalid capacity", lineno))
            })?);
            continue;
        }

        if line.starts_with("NODE_COORD_SECTION") {
            section = "coords";
            continue;
        }
        if line.starts_with("EDGE_WEIGHT_SECTION") {
            section = "weights";
            continue;
        }
        if line.starts_with("DEMAND_SECTION") {
            section = "demands";
            continue;
        }

        match section {
            "coords" => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(InstanceError::Malformed(format!(
                        "line {}: coordinate entry needs `id x y`",
                        lineno
                    )));
                }
                let id = parts[0].parse().map_err(|_| {
                    InstanceError::Malformed(format!("line {}: invalid node id", lineno))
                })?;
                let x = parts[1].parse().map_err(|_| {
                    InstanceError::Malformed(format!("line {}: invalid x coordinate", lineno))
                })?;
                let y = parts[2].parse().map_err(|_| {
                    InstanceError::Malformed(format!("line {}: invalid y coordinate", lineno))
                })?;
                coords.push((id, x, y));
            }
            "weights" => {
                for token in line.split_whitespace() {
                    weights.push(token.parse().map_err(|_| {
                        InstanceError::Malformed(format!("line {}: invalid edge weight", lineno))
                    })?);
                }
            }
            "demands" => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 2 {
                    return Err(InstanceError::Malformed(format!(
                        "line {}: demand entry needs `request amount`",
                        lineno
                    )));
                }
                let request = parts[0].parse().map_err(|_| {
                    InstanceError::Malformed(format!("line {}: invalid request id", lineno))
                })?;
                let amount = parts[1].parse().map_err(|_| {
                    InstanceError::Malformed(format!("line {}: invalid demand", lineno))
                })?;
                demands.push((request, amount));
            }
            _ => {
                return Err(InstanceError::Malformed(format!(
                    "line {}: unexpected data outside any section: `{}`",
                    lineno, line
                )));
            }
        }
    }

    let n = n.ok_or_else(|| InstanceError::Malformed("missing REQUESTS header".into()))?;
    if n == 0 {
        return Err(InstanceError::Malformed("REQUESTS must be at least 1".into()));
    }
    let capacity =
        capacity.ok_or_else(|| InstanceError::Malformed("missing CAPACITY header".into()))?;
    if capacity <= 0 {
        return Err(InstanceError::Malformed("CAPACITY must be positive".into()));
    }

    let side = 2 * n + 2;

    let cost = if !weights.is_empty() {
        if weights.len() != side * side {
            return Err(InstanceError::Malformed(format!(
                "EDGE_WEIGHT_SECTION needs {} values for {} requests, got {}",
                side * side,
                n,
                weights.len()
            )));
        }
        weights.chunks(side).map(|row| row.to_vec()).collect()
    } else {
        cost_matrix_from_coords(n, &coords)?
    };

    let mut pickup_demands = vec![0i32; n];
    let mut given = vec![false; n];
    for (request, amount) in demands {
        if request == 0 || request > n {
            return Err(InstanceError::Malformed(format!(
                "demand listed for unknown request {}",
                request
            )));
        }
        if given[request - 1] {
            return Err(InstanceError::Malformed(format!(
                "demand listed twice for request {}",
                request
            )));
        }
        given[request - 1] = true;
        pickup_demands[request - 1] = amount;
    }
    if let Some(missing) = given.iter().position(|&g| !g) {
        return Err(InstanceError::Malformed(format!(
            "missing demand for request {}",
            missing + 1
        )));
    }

    Ok(Graph::new(name, capacity, cost, pickup_demands)?)
}

/// Euclidean cost matrix with the structurally impossible arcs forbidden.
///
/// An arc is structurally impossible when no feasible depot-to-depot path
/// can ever use it: self loops, arcs into the start depot, arcs out of the
/// return depot, the direct depot-depot arc, arcs from the start depot to a
/// delivery, from a pickup to the return depot, and from a delivery to its
/// own pickup.
fn cost_matrix_from_coords(
    n: usize,
    coords: &[(usize, f64, f64)],
) -> Result<Vec<Vec<f64>>, InstanceError> {
    let side = 2 * n + 2;
    if coords.is_empty() {
        return Err(InstanceError::Malformed(
            "instance needs NODE_COORD_SECTION or EDGE_WEIGHT_SECTION".into(),
        ));
    }

    let mut xy = vec![None; side];
    for &(id, x, y) in coords {
        if id >= side {
            return Err(InstanceError::Malformed(format!(
                "coordinate listed for unknown node {}",
                id
            )));
        }
        if xy[id].is_some() {
            return Err(InstanceError::Malformed(format!(
                "coordinate listed twice for node {}",
                id
            )));
        }
        xy[id] = Some((x, y));
    }
    if let Some(missing) = xy.iter().position(|c| c.is_none()) {
        return Err(InstanceError::Malformed(format!("missing coordinate for node {}", missing)));
    }

    let end = side - 1;
    let mut cost = vec![vec![-1.0; side]; side];
    for i in 0..side {
        for j in 0..side {
            if i == j || j == 0 || i == end {
                continue;
            }
            if i == 0 && (j > n || j == end) {
                continue;
            }
            if j == end && i <= n {
                continue;
            }
            if i > n && i <= 2 * n && j == i - n {
                continue;
            }
            let (xi, yi) = xy[i].unwrap();
            let (xj, yj) = xy[j].unwrap();
            let (dx, dy) = (xi - xj, yi - yj);
            cost[i][j] = (dx * dx + dy * dy).sqrt();
        }
    }

    Ok(cost)
}
