//! Subtour/precedence-cut separation by tabu search over node partitions.
//!
//! Two searches run in parallel over candidate cut sets S, one for the pi
//! family and one for its sigma dual. Each iteration evaluates every
//! non-tabu single-node toggle, commits the one that decreases the
//! violation proxy `lhs = fs - 2*ss - 2*ts` the most, and tries to emit the
//! base cut and the lifted Groetschel cut for the committed set. Removed
//! nodes become tabu for a fixed tenure.
//!
//! The role sets fs/ss/ts classify nodes by whether their pair partner is
//! inside S and by pickup/delivery polarity; the pi and sigma update tables
//! are duals of each other with the roles swapped.

use crate::counters;
use crate::graph::{Graph, ReducedGraph};
use crate::solver::callbacks::{Cut, CutSense, LpSolution, SeparationError};
use log::debug;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Instant;

const TOTAL_ITERATIONS: usize = 25;
const TABU_TENURE: i64 = 10;

/// State of one tabu search: the candidate set S, the derived role sets,
/// the tabu list and the running sums of the violation proxy.
#[derive(Debug, Clone)]
pub struct SetsInfo {
    pub in_s: Vec<bool>,
    pub in_fs: Vec<bool>,
    pub in_ss: Vec<bool>,
    pub in_ts: Vec<bool>,
    pub in_tabu: Vec<bool>,
    pub tabu_start: Vec<i64>,
    pub fs: f64,
    pub ss: f64,
    pub ts: f64,
    pub lhs: f64,
}

impl SetsInfo {
    /// Initial pi state: S empty, every meaningful node in ts.
    fn pi(n: usize) -> Self {
        let side = 2 * n + 2;
        let mut info = SetsInfo {
            in_s: vec![false; side],
            in_fs: vec![false; side],
            in_ss: vec![false; side],
            in_ts: vec![true; side],
            in_tabu: vec![false; side],
            tabu_start: vec![-1; side],
            fs: 0.0,
            ss: 0.0,
            ts: 0.0,
            lhs: 0.0,
        };
        // The depots are padding: permanently tabu, never in any role set.
        info.in_ts[0] = false;
        info.in_tabu[0] = true;
        info.in_ts[side - 1] = false;
        info.in_tabu[side - 1] = true;
        info
    }

    /// Initial sigma state: S empty, every meaningful node in fs.
    fn sigma(n: usize) -> Self {
        let side = 2 * n + 2;
        let mut info = SetsInfo {
            in_s: vec![false; side],
            in_fs: vec![true; side],
            in_ss: vec![false; side],
            in_ts: vec![false; side],
            in_tabu: vec![false; side],
            tabu_start: vec![-1; side],
            fs: 0.0,
            ss: 0.0,
            ts: 0.0,
            lhs: 0.0,
        };
        info.in_fs[0] = false;
        info.in_tabu[0] = true;
        info.in_fs[side - 1] = false;
        info.in_tabu[side - 1] = true;
        info
    }

    pub fn empty_s(&self) -> bool {
        !self.in_s.iter().any(|&b| b)
    }

    pub fn size(&self) -> usize {
        self.in_s.iter().filter(|&&b| b).count()
    }

    fn first_true(&self) -> Option<usize> {
        self.in_s.iter().position(|&b| b)
    }

    fn first_non_tabu(&self, two_n: usize) -> Option<usize> {
        (1..=two_n).find(|&i| !self.in_tabu[i])
    }

    /// Dedup signature: first member index and cardinality of S.
    fn signature(&self) -> (usize, usize) {
        (self.first_true().unwrap_or(0), self.size())
    }
}

/// Toggle node `i` in/out of the pi set, updating the role sets.
fn toggle_pi(pi: &mut SetsInfo, n: usize, i: usize) {
    if pi.in_s[i] {
        // Remove
        if i <= n {
            if pi.in_s[i + n] {
                pi.in_fs[i] = false;
                pi.in_ss[i] = true;
            } else {
                pi.in_ts[i] = true;
            }
        } else if pi.in_s[i - n] {
            pi.in_fs[i - n] = false;
            pi.in_ts[i] = true;
        } else {
            pi.in_ss[i - n] = false;
            pi.in_ts[i - n] = true;
            pi.in_ts[i] = true;
        }
    } else if !pi.in_tabu[i] {
        // Add
        if i <= n {
            if pi.in_s[i + n] {
                pi.in_fs[i] = true;
                pi.in_ss[i] = false;
            } else {
                pi.in_ts[i] = false;
            }
        } else if pi.in_s[i - n] {
            pi.in_fs[i - n] = true;
            pi.in_ts[i] = false;
        } else {
            pi.in_ss[i - n] = true;
            pi.in_ts[i - n] = false;
            pi.in_ts[i] = false;
        }
    }
    pi.in_s[i] = !pi.in_s[i];
}

/// Toggle node `i` in/out of the sigma set; dual of [`toggle_pi`].
fn toggle_sigma(sigma: &mut SetsInfo, n: usize, i: usize) {
    if sigma.in_s[i] {
        // Remove
        if i <= n {
            if sigma.in_s[i + n] {
                sigma.in_fs[i] = true;
                sigma.in_ss[i + n] = false;
            } else {
                sigma.in_fs[i] = true;
                sigma.in_fs[i + n] = true;
                sigma.in_ts[i + n] = false;
            }
        } else if sigma.in_s[i - n] {
            sigma.in_ss[i] = false;
            sigma.in_ts[i] = true;
        } else {
            sigma.in_fs[i] = true;
        }
    } else if !sigma.in_tabu[i] {
        // Add
        if i <= n {
            if sigma.in_s[i + n] {
                sigma.in_fs[i] = false;
                sigma.in_ss[i + n] = true;
            } else {
                sigma.in_fs[i] = false;
                sigma.in_fs[i + n] = false;
                sigma.in_ts[i + n] = true;
            }
        } else if sigma.in_s[i - n] {
            sigma.in_ss[i] = true;
            sigma.in_ts[i] = false;
        } else {
            sigma.in_fs[i] = false;
        }
    }
    sigma.in_s[i] = !sigma.in_s[i];
}

/// Commit the selected toggle and advance the tabu list.
fn commit(set: &mut SetsInfo, best: SetsInfo, toggled: usize, iter: i64, two_n: usize) {
    let removed = set.in_s[toggled];
    *set = best;
    if removed {
        set.in_tabu[toggled] = true;
        set.tabu_start[toggled] = iter;
    }
    for i in 1..=two_n {
        if set.tabu_start[i] == iter - TABU_TENURE {
            set.in_tabu[i] = false;
            set.tabu_start[i] = -1;
        }
    }
}

/// The tabu-search separator for one fractional solution.
pub struct SubtourSeparator<'a> {
    g: &'a Graph,
    gr: &'a ReducedGraph,
    sol: &'a LpSolution,
    eps: f64,
    pi: SetsInfo,
    sigma: SetsInfo,
}

impl<'a> SubtourSeparator<'a> {
    pub fn new(g: &'a Graph, gr: &'a ReducedGraph, sol: &'a LpSolution, eps: f64) -> Self {
        SubtourSeparator { g, gr, sol, eps, pi: SetsInfo::pi(g.n), sigma: SetsInfo::sigma(g.n) }
    }

    /// Run both tabu searches and return every cut they emit.
    pub fn separate(&mut self, rng: &mut ChaCha8Rng) -> Result<Vec<Cut>, SeparationError> {
        let start = Instant::now();
        let two_n = 2 * self.g.n;
        let mut cuts = Vec::new();
        let mut memory_pi: HashSet<(usize, usize)> = HashSet::new();
        let mut memory_sigma: HashSet<(usize, usize)> = HashSet::new();

        for iter in 1..=TOTAL_ITERATIONS as i64 {
            let first_pi = self.pi.first_non_tabu(two_n);
            let first_sigma = self.sigma.first_non_tabu(two_n);
            if first_pi.is_none() && first_sigma.is_none() {
                // Tabu lists saturated on both families: no legal move is
                // left, the search is over for this invocation.
                debug!("tabu lists saturated after {} iterations", iter - 1);
                break;
            }

            let mut best_pi = self.pi.clone();
            let mut best_sigma = self.sigma.clone();
            let mut toggled_pi: Option<usize> = None;
            let mut toggled_sigma: Option<usize> = None;

            for i in 1..=two_n {
                let mut new_pi = self.pi.clone();
                toggle_pi(&mut new_pi, self.g.n, i);
                self.recalculate_pi_sums(&mut new_pi);

                let mut new_sigma = self.sigma.clone();
                toggle_sigma(&mut new_sigma, self.g.n, i);
                self.recalculate_sigma_sums(&mut new_sigma);

                if Some(i) == first_pi
                    || (new_pi.lhs < best_pi.lhs && !self.pi.in_tabu[i] && !new_pi.empty_s())
                {
                    best_pi = new_pi;
                    toggled_pi = Some(i);
                }
                if Some(i) == first_sigma
                    || (new_sigma.lhs < best_sigma.lhs
                        && !self.sigma.in_tabu[i]
                        && !new_sigma.empty_s())
                {
                    best_sigma = new_sigma;
                    toggled_sigma = Some(i);
                }
            }

            let sig_pi = best_pi.signature();
            let seen_pi = memory_pi.contains(&sig_pi);
            let sig_sigma = best_sigma.signature();
            let seen_sigma = memory_sigma.contains(&sig_sigma);

            if first_pi.is_some() {
                // A non-empty candidate set must always select a toggle.
                let toggled = toggled_pi.ok_or(SeparationError::NoAdmissibleMove)?;
                commit(&mut self.pi, best_pi, toggled, iter, two_n);
                if !seen_pi {
                    self.add_pi_cut_if_violated(&mut cuts);
                    self.add_groetschel_pi_cut_if_violated(&mut cuts, rng);
                    memory_pi.insert(sig_pi);
                }
            }

            if first_sigma.is_some() {
                let toggled = toggled_sigma.ok_or(SeparationError::NoAdmissibleMove)?;
                commit(&mut self.sigma, best_sigma, toggled, iter, two_n);
                if !seen_sigma {
                    self.add_sigma_cut_if_violated(&mut cuts);
                    self.add_groetschel_sigma_cut_if_violated(&mut cuts, rng);
                    memory_sigma.insert(sig_sigma);
                }
            }
        }

        if !cuts.is_empty() {
            debug!("subtour separation found {} cuts", cuts.len());
        }
        counters::add_separation_time(start.elapsed());
        Ok(cuts)
    }

    fn recalculate_pi_sums(&self, pi: &mut SetsInfo) {
        pi.fs = 0.0;
        pi.ss = 0.0;
        pi.ts = 0.0;
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let x = self.sol.value(i, j);
            if pi.in_s[i] && !pi.in_s[j] {
                pi.fs += x;
            }
            if !pi.in_s[i] && pi.in_s[j] {
                pi.fs += x;
            }
            if pi.in_fs[i] && pi.in_ts[j] {
                pi.ss += x;
            }
            if pi.in_s[i] && pi.in_ss[j] {
                pi.ts += x;
            }
        }
        pi.lhs = pi.fs - 2.0 * pi.ss - 2.0 * pi.ts;
    }

    fn recalculate_sigma_sums(&self, sigma: &mut SetsInfo) {
        sigma.fs = 0.0;
        sigma.ss = 0.0;
        sigma.ts = 0.0;
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let x = self.sol.value(i, j);
            if sigma.in_s[i] && !sigma.in_s[j] {
                sigma.fs += x;
            }
            if !sigma.in_s[i] && sigma.in_s[j] {
                sigma.fs += x;
            }
            if sigma.in_fs[i] && sigma.in_ss[j] {
                sigma.ss += x;
            }
            if sigma.in_ts[i] && sigma.in_s[j] {
                sigma.ts += x;
            }
        }
        sigma.lhs = sigma.fs - 2.0 * sigma.ss - 2.0 * sigma.ts;
    }

    /// Base pi cut: boundary crossings minus pair-role penalties, >= 2.
    fn add_pi_cut_if_violated(&self, cuts: &mut Vec<Cut>) {
        let pi = &self.pi;
        if pi.lhs >= 2.0 - self.eps {
            return;
        }
        if pi.size() <= 1 {
            return;
        }

        let mut terms = Vec::new();
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let mut coeff = 0.0;
            if pi.in_s[i] && !pi.in_s[j] {
                coeff += 1.0;
            }
            if !pi.in_s[i] && pi.in_s[j] {
                coeff += 1.0;
            }
            if pi.in_fs[i] && pi.in_ts[j] {
                coeff -= 2.0;
            }
            if pi.in_s[i] && pi.in_ss[j] {
                coeff -= 2.0;
            }
            if coeff != 0.0 {
                terms.push((arc.id, coeff));
            }
        }
        cuts.push(Cut { terms, sense: CutSense::Ge, rhs: 2.0 });
    }

    /// Base sigma cut, the dual of the base pi cut.
    fn add_sigma_cut_if_violated(&self, cuts: &mut Vec<Cut>) {
        let sigma = &self.sigma;
        if sigma.lhs >= 2.0 - self.eps {
            return;
        }
        if sigma.size() <= 1 {
            return;
        }

        let mut terms = Vec::new();
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let mut coeff = 0.0;
            if sigma.in_s[i] && !sigma.in_s[j] {
                coeff += 1.0;
            }
            if !sigma.in_s[i] && sigma.in_s[j] {
                coeff += 1.0;
            }
            if sigma.in_fs[i] && sigma.in_ss[j] {
                coeff -= 2.0;
            }
            if sigma.in_ts[i] && sigma.in_s[j] {
                coeff -= 2.0;
            }
            if coeff != 0.0 {
                terms.push((arc.id, coeff));
            }
        }
        cuts.push(Cut { terms, sense: CutSense::Ge, rhs: 2.0 });
    }

    /// Order S with the max-inflow node as anchor, shuffle the rest.
    fn ordered_pi_set(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let two_n = 2 * self.g.n;
        let mut my_s: Vec<usize> = (1..=two_n).filter(|&i| self.pi.in_s[i]).collect();

        let mut inflow = vec![0.0; my_s.len()];
        for (idx, &member) in my_s.iter().enumerate() {
            for j in 1..=two_n {
                let x = self.sol.value(j, member);
                if x > 0.0 {
                    inflow[idx] += x;
                }
            }
        }
        let mut max_idx = 0;
        for idx in 1..inflow.len() {
            if inflow[idx] > inflow[max_idx] {
                max_idx = idx;
            }
        }
        if max_idx != 0 {
            my_s.swap(0, max_idx);
        }
        my_s[1..].shuffle(rng);
        my_s
    }

    /// Order S with the max-outflow node as anchor, shuffle the rest.
    fn ordered_sigma_set(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let two_n = 2 * self.g.n;
        let mut my_s: Vec<usize> = (1..=two_n).filter(|&i| self.sigma.in_s[i]).collect();

        let mut outflow = vec![0.0; my_s.len()];
        for (idx, &member) in my_s.iter().enumerate() {
            for j in 1..=two_n {
                let x = self.sol.value(member, j);
                if x > 0.0 {
                    outflow[idx] += x;
                }
            }
        }
        let mut max_idx = 0;
        for idx in 1..outflow.len() {
            if outflow[idx] > outflow[max_idx] {
                max_idx = idx;
            }
        }
        if max_idx != 0 {
            my_s.swap(0, max_idx);
        }
        my_s[1..].shuffle(rng);
        my_s
    }

    /// Five-summand Groetschel lhs for the ordered pi set.
    fn groetschel_lhs_pi(&self, my_s: &[usize]) -> f64 {
        let two_n = 2 * self.g.n;
        let h = my_s.len();
        let mut lhs = 0.0;

        for k in 0..h {
            if k < h - 1 {
                lhs += self.sol.value(my_s[k], my_s[k + 1]);
            }
            if k >= 2 {
                lhs += 2.0 * self.sol.value(my_s[0], my_s[k]);
            }
            if k >= 3 {
                for l in 2..k {
                    lhs += self.sol.value(my_s[k], my_s[l]);
                }
            }
        }
        for i in 1..=two_n {
            if self.pi.in_ss[i] {
                lhs += self.sol.value(my_s[0], i);
            }
        }
        lhs += self.sol.value(*my_s.last().unwrap(), my_s[0]);

        lhs
    }

    /// Five-summand Groetschel lhs for the ordered sigma set.
    fn groetschel_lhs_sigma(&self, my_s: &[usize]) -> f64 {
        let two_n = 2 * self.g.n;
        let h = my_s.len();
        let mut lhs = 0.0;

        for k in 0..h - 1 {
            lhs += self.sol.value(my_s[k], my_s[k + 1]);
            if k >= 1 {
                lhs += 2.0 * self.sol.value(my_s[k], my_s[0]);
            }
            if k >= 2 {
                for l in 1..k {
                    lhs += self.sol.value(my_s[k], my_s[l]);
                }
            }
        }
        for i in 1..=two_n {
            if self.sigma.in_ts[i] {
                lhs += self.sol.value(i, my_s[0]);
            }
        }
        lhs += self.sol.value(*my_s.last().unwrap(), my_s[0]);

        lhs
    }

    fn add_groetschel_pi_cut_if_violated(&self, cuts: &mut Vec<Cut>, rng: &mut ChaCha8Rng) {
        if self.pi.size() <= 1 {
            return;
        }
        let my_s = self.ordered_pi_set(rng);
        let lhs = self.groetschel_lhs_pi(&my_s);
        if lhs > my_s.len() as f64 - 1.0 + self.eps {
            cuts.push(self.groetschel_pi_cut(&my_s));
        }
    }

    fn add_groetschel_sigma_cut_if_violated(&self, cuts: &mut Vec<Cut>, rng: &mut ChaCha8Rng) {
        if self.sigma.size() <= 1 {
            return;
        }
        let my_s = self.ordered_sigma_set(rng);
        let lhs = self.groetschel_lhs_sigma(&my_s);
        if lhs > my_s.len() as f64 - 1.0 + self.eps {
            cuts.push(self.groetschel_sigma_cut(&my_s));
        }
    }

    /// Emit the pi Groetschel cut with the same five summands as the lhs.
    fn groetschel_pi_cut(&self, my_s: &[usize]) -> Cut {
        let h = my_s.len();
        let mut pos = vec![None; self.gr.num_nodes()];
        for (idx, &member) in my_s.iter().enumerate() {
            pos[member] = Some(idx);
        }

        let mut terms = Vec::new();
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let mut coeff = 0.0;
            if let (Some(a), Some(b)) = (pos[i], pos[j]) {
                if a + 1 == b {
                    coeff += 1.0; // consecutive along the ordering
                }
                if a == h - 1 && b == 0 {
                    coeff += 1.0; // closing arc
                }
                if a == 0 && b >= 2 {
                    coeff += 2.0; // doubled anchor arcs
                }
                if a >= 3 && b >= 2 && b < a {
                    coeff += 1.0; // backward chords
                }
            }
            if pos[i] == Some(0) && self.pi.in_ss[j] {
                coeff += 1.0; // anchor into the split-pair role set
            }
            if coeff != 0.0 {
                terms.push((arc.id, coeff));
            }
        }
        Cut { terms, sense: CutSense::Le, rhs: (h - 1) as f64 }
    }

    /// Emit the sigma Groetschel cut with the same five summands as the lhs.
    fn groetschel_sigma_cut(&self, my_s: &[usize]) -> Cut {
        let h = my_s.len();
        let mut pos = vec![None; self.gr.num_nodes()];
        for (idx, &member) in my_s.iter().enumerate() {
            pos[member] = Some(idx);
        }

        let mut terms = Vec::new();
        for arc in self.gr.arcs() {
            let (i, j) = (arc.from, arc.to);
            let mut coeff = 0.0;
            if let (Some(a), Some(b)) = (pos[i], pos[j]) {
                if a + 1 == b {
                    coeff += 1.0;
                }
                if a == h - 1 && b == 0 {
                    coeff += 1.0;
                }
                if a >= 1 && a < h - 1 && b == 0 {
                    coeff += 2.0;
                }
                if a >= 2 && a < h - 1 && b >= 1 && b < a {
                    coeff += 1.0;
                }
            }
            if self.sigma.in_ts[i] && pos[j] == Some(0) {
                coeff += 1.0;
            }
            if coeff != 0.0 {
                terms.push((arc.id, coeff));
            }
        }
        Cut { terms, sense: CutSense::Le, rhs: (h - 1) as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

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

    /// The pi role sets must always satisfy: fs marks pairs fully inside S,
    /// ss marks pairs with only the delivery inside, ts marks nodes whose
    /// pair does not touch S (and deliveries outside S).
    fn assert_pi_consistent(pi: &SetsInfo, n: usize) {
        for r in 1..=n {
            let p_in = pi.in_s[r];
            let d_in = pi.in_s[r + n];
            assert_eq!(pi.in_fs[r], p_in && d_in, "fs of pair {}", r);
            assert_eq!(pi.in_ss[r], !p_in && d_in, "ss of pair {}", r);
            assert_eq!(pi.in_ts[r], !p_in && !d_in, "ts of pickup {}", r);
            assert_eq!(pi.in_ts[r + n], !d_in, "ts of delivery {}", r);
        }
    }

    /// The sigma role sets are the dual: fs marks pickups outside S (and
    /// untouched pairs), ss marks pairs fully inside, ts marks deliveries
    /// whose pickup alone is inside.
    fn assert_sigma_consistent(sigma: &SetsInfo, n: usize) {
        for r in 1..=n {
            let p_in = sigma.in_s[r];
            let d_in = sigma.in_s[r + n];
            assert_eq!(sigma.in_fs[r], !p_in, "fs of pickup {}", r);
            assert_eq!(sigma.in_fs[r + n], !p_in && !d_in, "fs of delivery {}", r);
            assert_eq!(sigma.in_ss[r + n], p_in && d_in, "ss of pair {}", r);
            assert_eq!(sigma.in_ts[r + n], p_in && !d_in, "ts of pair {}", r);
        }
    }

    #[test]
    fn test_pi_toggle_role_table() {
        let n = 2;
        let mut pi = SetsInfo::pi(n);
        assert_pi_consistent(&pi, n);

        // all four pair states, entered in both orders
        toggle_pi(&mut pi, n, 1); // pickup only
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 3); // both
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 1); // delivery only
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 3); // back to empty
        assert_pi_consistent(&pi, n);

        toggle_pi(&mut pi, n, 4); // delivery first
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 2); // both
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 4); // pickup only
        assert_pi_consistent(&pi, n);
        toggle_pi(&mut pi, n, 2);
        assert_pi_consistent(&pi, n);
        assert!(pi.empty_s());
    }

    #[test]
    fn test_sigma_toggle_role_table() {
        let n = 2;
        let mut sigma = SetsInfo::sigma(n);
        assert_sigma_consistent(&sigma, n);

        toggle_sigma(&mut sigma, n, 1);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 3);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 1);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 3);
        assert_sigma_consistent(&sigma, n);

        toggle_sigma(&mut sigma, n, 4);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 2);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 4);
        assert_sigma_consistent(&sigma, n);
        toggle_sigma(&mut sigma, n, 2);
        assert_sigma_consistent(&sigma, n);
        assert!(sigma.empty_s());
    }

    #[test]
    fn test_two_cycle_yields_violated_base_cut() {
        // a fractional two-cycle between the pickups, outside the
        // pickup-delivery precedence structure
        let g = test_graph(2, 10, vec![4, 3]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(1, 2, 0.75), (2, 1, 0.75)]);

        let mut separator = SubtourSeparator::new(&g, &gr, &sol, 1e-6);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let cuts = separator.separate(&mut rng).unwrap();

        assert!(!cuts.is_empty());
        for cut in &cuts {
            assert!(cut.is_violated(gr.arcs(), &sol, 1e-6), "unviolated cut {:?}", cut);
        }
        // at least one base cut demanding two boundary crossings
        assert!(cuts.iter().any(|c| c.sense == CutSense::Ge && c.rhs == 2.0));
    }

    #[test]
    fn test_no_cuts_on_integral_feasible_path() {
        // the incidence vector of the feasible path 0 -> 1 -> 3 -> 2 -> 4 -> 5
        // satisfies every inequality of both families
        let g = test_graph(2, 10, vec![4, 3]);
        let gr = g.reduced();
        let sol =
            lp_with(&g, &[(0, 1, 1.0), (1, 3, 1.0), (3, 2, 1.0), (2, 4, 1.0), (4, 5, 1.0)]);

        let mut separator = SubtourSeparator::new(&g, &gr, &sol, 1e-6);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let cuts = separator.separate(&mut rng).unwrap();
        assert!(cuts.is_empty(), "feasible point produced cuts: {:?}", cuts);
    }

    #[test]
    fn test_emitted_cuts_avoid_forbidden_arcs() {
        let mut g = test_graph(2, 10, vec![4, 3]);
        g.cost[1][4] = -1.0;
        let gr = g.reduced();
        let sol = lp_with(&g, &[(1, 2, 0.75), (2, 1, 0.75)]);

        let mut separator = SubtourSeparator::new(&g, &gr, &sol, 1e-6);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let cuts = separator.separate(&mut rng).unwrap();
        for cut in &cuts {
            for &(col, _) in &cut.terms {
                let arc = gr.arcs()[col];
                assert!(g.is_allowed(arc.from, arc.to));
            }
        }
    }

    #[test]
    fn test_same_seed_same_cuts() {
        let g = test_graph(3, 10, vec![4, 3, 2]);
        let gr = g.reduced();
        let sol = lp_with(
            &g,
            &[(1, 2, 0.5), (2, 1, 0.5), (3, 4, 0.5), (4, 3, 0.5), (0, 1, 0.5), (5, 6, 0.3)],
        );

        let run = |seed: u64| {
            let mut separator = SubtourSeparator::new(&g, &gr, &sol, 1e-6);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            separator.separate(&mut rng).unwrap()
        };
        let a = run(7);
        let b = run(7);
        assert_eq!(a.len(), b.len());
        for (ca, cb) in a.iter().zip(&b) {
            assert_eq!(ca.terms, cb.terms);
            assert_eq!(ca.rhs, cb.rhs);
        }
    }

    #[test]
    fn test_separation_timer_advances() {
        let g = test_graph(1, 10, vec![4]);
        let gr = g.reduced();
        let sol = lp_with(&g, &[(1, 2, 0.4)]);
        let before = counters::separation_time();
        let mut separator = SubtourSeparator::new(&g, &gr, &sol, 1e-6);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        separator.separate(&mut rng).unwrap();
        assert!(counters::separation_time() >= before);
    }
}
