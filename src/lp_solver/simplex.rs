//! Bounded-variable primal simplex
//!
//! The LP is brought into the form
//!
//! ```text
//! minimize    c·x
//! subject to  A·x - r + D·a = 0
//!             col_lower <= x <= col_upper
//!             row_lower <= r <= row_upper
//!             a >= 0            (phase 1)   a = 0   (phase 2)
//! ```
//!
//! where every constraint row owns one activity column `r` (so equality rows are
//! a single fixed column, not two inequalities) and one artificial column `a`
//! with sign `D = ±1` chosen so the artificials start non-negative. The initial
//! basis is the artificial one; phase 1 drives the sum of artificials to zero and
//! phase 2 optimizes `c·x` from the resulting feasible basis.
//!
//! The tableau `B⁻¹·[A | -I | D]` is kept dense. Nonbasic columns sit exactly at
//! one of their finite bounds, or at zero when free.

use log::{debug, trace};

use super::config::{SolverConfig, Tolerances};

/// Degenerate pivots in a row before switching from Dantzig to Bland pricing
const DEGENERATE_RUN_BEFORE_BLAND: usize = 50;

/// Step lengths below this count as degenerate
const STEP_EPSILON: f64 = 1e-12;

/// Positional LP/MILP data compiled from a [`Model`](super::Model)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LpProblem {
    /// Sparse rows as `(column, coefficient)` pairs
    pub rows: Vec<Vec<(usize, f64)>>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    /// Objective in minimization form
    pub cost: Vec<f64>,
    pub integer: Vec<bool>,
}

impl LpProblem {
    pub fn num_cols(&self) -> usize {
        self.cost.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_integers(&self) -> bool {
        self.integer.iter().any(|&is_int| is_int)
    }

    pub fn objective(&self, x: &[f64]) -> f64 {
        self.cost.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    pub fn row_activities(&self, x: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&(j, a)| a * x[j]).sum())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
    IterationLimit,
    /// The final point violates the original bounds beyond tolerance
    Numerical,
}

#[derive(Debug, Clone)]
pub(crate) struct LpResult {
    pub status: LpStatus,
    /// Column values, only meaningful when `status == Optimal`
    pub x: Vec<f64>,
    /// `cost·x`, only meaningful when `status == Optimal`
    pub objective: f64,
    pub iterations: usize,
}

impl LpResult {
    fn without_point(status: LpStatus, iterations: usize) -> Self {
        Self {
            status,
            x: Vec::new(),
            objective: f64::NAN,
            iterations,
        }
    }
}

/// Solve the relaxation of `problem` with the column bounds replaced by
/// `col_lower` / `col_upper`.
pub(crate) fn solve_lp(
    problem: &LpProblem,
    col_lower: &[f64],
    col_upper: &[f64],
    config: &SolverConfig,
) -> LpResult {
    let mut tableau = Tableau::new(problem, col_lower, col_upper, config);
    let result = tableau.solve(problem);
    trace!(
        "LP finished: {:?} after {} iterations",
        result.status, result.iterations
    );
    result
}

enum Phase {
    Optimal,
    Unbounded,
    IterationLimit,
}

/// Starting value of a nonbasic column
fn resting_value(lower: f64, upper: f64) -> f64 {
    if lower.is_finite() {
        lower
    } else if upper.is_finite() {
        upper
    } else {
        0.0
    }
}

fn violates(value: f64, lower: f64, upper: f64, tolerance: f64) -> bool {
    value < lower - tolerance * (1.0 + lower.abs()) || value > upper + tolerance * (1.0 + upper.abs())
}

struct Tableau {
    rows: usize,
    /// Structural columns
    structural: usize,
    /// Structural + activity + artificial columns
    width: usize,
    /// Row-major `rows × width`
    t: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    x: Vec<f64>,
    basis: Vec<usize>,
    /// Row in which a column is basic
    basic_row: Vec<Option<usize>>,
    tolerances: Tolerances,
    iterations: usize,
    max_iterations: usize,
    /// Largest initial artificial value, used to scale the phase 1 test
    infeasibility_scale: f64,
}

impl Tableau {
    fn new(problem: &LpProblem, col_lower: &[f64], col_upper: &[f64], config: &SolverConfig) -> Self {
        let n = problem.num_cols();
        let m = problem.num_rows();
        let width = n + 2 * m;

        let mut lower = Vec::with_capacity(width);
        lower.extend_from_slice(col_lower);
        lower.extend_from_slice(&problem.row_lower);
        lower.extend(std::iter::repeat(0.0).take(m));

        let mut upper = Vec::with_capacity(width);
        upper.extend_from_slice(col_upper);
        upper.extend_from_slice(&problem.row_upper);
        upper.extend(std::iter::repeat(f64::INFINITY).take(m));

        let mut x: Vec<f64> = lower
            .iter()
            .zip(&upper)
            .map(|(&l, &u)| resting_value(l, u))
            .collect();

        let mut t = vec![0.0; m * width];
        let mut basis = Vec::with_capacity(m);
        let mut basic_row = vec![None; width];
        let mut infeasibility_scale: f64 = 1.0;

        for (i, row) in problem.rows.iter().enumerate() {
            let residual: f64 = row.iter().map(|&(j, a)| a * x[j]).sum::<f64>() - x[n + i];
            let sign = if residual > 0.0 { -1.0 } else { 1.0 };
            let line = &mut t[i * width..(i + 1) * width];
            for &(j, a) in row {
                line[j] += sign * a;
            }
            line[n + i] = -sign;
            line[n + m + i] = 1.0;

            let artificial = n + m + i;
            x[artificial] = residual.abs();
            infeasibility_scale = infeasibility_scale.max(residual.abs());
            basis.push(artificial);
            basic_row[artificial] = Some(i);
        }

        let max_iterations = config
            .max_simplex_iterations
            .unwrap_or_else(|| 10_000.max(20 * (m + width)));

        Self {
            rows: m,
            structural: n,
            width,
            t,
            lower,
            upper,
            x,
            basis,
            basic_row,
            tolerances: config.tolerances,
            iterations: 0,
            max_iterations,
            infeasibility_scale,
        }
    }

    fn artificial_start(&self) -> usize {
        self.structural + self.rows
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        self.t[row * self.width + col]
    }

    fn solve(&mut self, problem: &LpProblem) -> LpResult {
        let artificial_start = self.artificial_start();

        let phase1_cost: Vec<f64> = (0..self.width)
            .map(|j| if j >= artificial_start { 1.0 } else { 0.0 })
            .collect();
        match self.run(&phase1_cost) {
            Phase::Optimal => {}
            // the phase 1 objective is bounded below by zero
            Phase::Unbounded => return LpResult::without_point(LpStatus::Numerical, self.iterations),
            Phase::IterationLimit => {
                return LpResult::without_point(LpStatus::IterationLimit, self.iterations);
            }
        }

        let infeasibility: f64 = self.x[artificial_start..].iter().sum();
        if infeasibility > self.tolerances.feasibility * self.infeasibility_scale {
            debug!(
                "phase 1 ended with infeasibility {:.3e} after {} iterations",
                infeasibility, self.iterations
            );
            return LpResult::without_point(LpStatus::Infeasible, self.iterations);
        }

        for col in artificial_start..self.width {
            self.upper[col] = 0.0;
        }
        self.drive_out_artificials();

        let mut phase2_cost = problem.cost.clone();
        phase2_cost.resize(self.width, 0.0);
        match self.run(&phase2_cost) {
            Phase::Optimal => {}
            Phase::Unbounded => return LpResult::without_point(LpStatus::Unbounded, self.iterations),
            Phase::IterationLimit => {
                return LpResult::without_point(LpStatus::IterationLimit, self.iterations);
            }
        }

        let x = self.x[..self.structural].to_vec();
        if !self.is_primal_feasible(problem, &x) {
            debug!("final point violates bounds beyond tolerance");
            return LpResult::without_point(LpStatus::Numerical, self.iterations);
        }

        LpResult {
            status: LpStatus::Optimal,
            objective: problem.objective(&x),
            x,
            iterations: self.iterations,
        }
    }

    /// Pivot zero-valued artificials out of the basis where a structural or
    /// activity column can replace them. Rows where none can are redundant.
    fn drive_out_artificials(&mut self) {
        let artificial_start = self.artificial_start();
        for row in 0..self.rows {
            let leaving = self.basis[row];
            if leaving < artificial_start {
                continue;
            }

            let mut entering = None;
            let mut magnitude = self.tolerances.pivot.max(1e-7);
            for col in 0..artificial_start {
                let value = self.entry(row, col).abs();
                if self.basic_row[col].is_none() && value > magnitude {
                    entering = Some(col);
                    magnitude = value;
                }
            }

            if let Some(col) = entering {
                self.x[leaving] = 0.0;
                self.pivot(row, col);
            }
        }
    }

    fn is_primal_feasible(&self, problem: &LpProblem, x: &[f64]) -> bool {
        let tolerance = self.tolerances.feasibility;
        let columns_ok = x
            .iter()
            .enumerate()
            .all(|(j, &v)| !violates(v, self.lower[j], self.upper[j], tolerance));

        columns_ok
            && problem
                .row_activities(x)
                .iter()
                .enumerate()
                .all(|(i, &activity)| {
                    !violates(activity, problem.row_lower[i], problem.row_upper[i], tolerance)
                })
    }

    fn run(&mut self, cost: &[f64]) -> Phase {
        let mut degenerate_run = 0;
        let mut bland = false;

        loop {
            if self.iterations >= self.max_iterations {
                return Phase::IterationLimit;
            }

            let Some((entering, direction)) = self.price(cost, bland) else {
                return Phase::Optimal;
            };

            let (step, leaving) = self.ratio_test(entering, direction, bland);
            if step == f64::INFINITY {
                return Phase::Unbounded;
            }

            self.iterations += 1;
            self.step(entering, direction, step, leaving);

            if step <= STEP_EPSILON {
                degenerate_run += 1;
                if degenerate_run > DEGENERATE_RUN_BEFORE_BLAND && !bland {
                    trace!("switching to Bland's rule after {degenerate_run} degenerate pivots");
                    bland = true;
                }
            } else {
                degenerate_run = 0;
                bland = false;
            }
        }
    }

    /// Choose the entering column and its direction of movement (+1 / -1).
    fn price(&self, cost: &[f64], bland: bool) -> Option<(usize, f64)> {
        let mut best = None;
        let mut best_score = 0.0;

        for col in 0..self.width {
            if self.basic_row[col].is_some() {
                continue;
            }

            let reduced = cost[col]
                - self
                    .basis
                    .iter()
                    .enumerate()
                    .map(|(row, &b)| cost[b] * self.entry(row, col))
                    .sum::<f64>();

            let (direction, score) = if reduced < -self.tolerances.optimality
                && self.x[col] < self.upper[col]
            {
                (1.0, -reduced)
            } else if reduced > self.tolerances.optimality && self.x[col] > self.lower[col] {
                (-1.0, reduced)
            } else {
                continue;
            };

            if bland {
                return Some((col, direction));
            }
            if score > best_score {
                best = Some((col, direction));
                best_score = score;
            }
        }

        best
    }

    /// Longest step the entering column can take, and the row whose basic
    /// column blocks it (`None` when the entering column reaches its own bound).
    fn ratio_test(&self, entering: usize, direction: f64, bland: bool) -> (f64, Option<usize>) {
        let mut step = self.upper[entering] - self.lower[entering];
        let mut leaving: Option<usize> = None;
        let mut leaving_alpha: f64 = 0.0;

        for row in 0..self.rows {
            let alpha = direction * self.entry(row, entering);
            if alpha.abs() <= self.tolerances.pivot {
                continue;
            }

            let b = self.basis[row];
            let bound = if alpha > 0.0 {
                self.lower[b]
            } else {
                self.upper[b]
            };
            if bound.is_infinite() {
                continue;
            }
            let ratio = ((self.x[b] - bound) / alpha).max(0.0);

            let replace = match leaving {
                _ if ratio < step - STEP_EPSILON => true,
                Some(current) if (ratio - step).abs() <= STEP_EPSILON => {
                    if bland {
                        b < self.basis[current]
                    } else {
                        alpha.abs() > leaving_alpha.abs()
                    }
                }
                _ => false,
            };

            if replace {
                step = ratio;
                leaving = Some(row);
                leaving_alpha = alpha;
            }
        }

        (step, leaving)
    }

    fn step(&mut self, entering: usize, direction: f64, step: f64, leaving: Option<usize>) {
        if step > 0.0 {
            for row in 0..self.rows {
                let b = self.basis[row];
                self.x[b] -= step * direction * self.entry(row, entering);
            }
            self.x[entering] += direction * step;
        }

        match leaving {
            None => {
                self.x[entering] = if direction > 0.0 {
                    self.upper[entering]
                } else {
                    self.lower[entering]
                };
            }
            Some(row) => {
                let b = self.basis[row];
                let alpha = direction * self.entry(row, entering);
                self.x[b] = if alpha > 0.0 {
                    self.lower[b]
                } else {
                    self.upper[b]
                };
                self.pivot(row, entering);
            }
        }
    }

    /// Make `col` basic in `row`, replacing the current basic column.
    fn pivot(&mut self, row: usize, col: usize) {
        let width = self.width;
        let pivot = self.t[row * width + col];

        let pivot_row: Vec<f64> = self.t[row * width..(row + 1) * width]
            .iter()
            .map(|v| v / pivot)
            .collect();

        for other in 0..self.rows {
            let line = &mut self.t[other * width..(other + 1) * width];
            if other == row {
                line.copy_from_slice(&pivot_row);
                line[col] = 1.0;
                continue;
            }
            let factor = line[col];
            if factor != 0.0 {
                for (value, p) in line.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
                line[col] = 0.0;
            }
        }

        let leaving = self.basis[row];
        self.basic_row[leaving] = None;
        self.basic_row[col] = Some(row);
        self.basis[row] = col;
    }
}
