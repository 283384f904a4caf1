use std::time::{Duration, Instant};

use log::{debug, warn};
use rayon::prelude::*;

use super::branch_and_bound::BranchAndBound;
use super::config::SolverConfig;
use super::model::Model;
use super::simplex::{LpProblem, LpStatus, solve_lp};
use super::solution::{SolveStatistics, Solution};
use super::OptimizationStatus;

/// Solves [`Model`]s with a fixed [`SolverConfig`]
///
/// A solver holds no state between calls; every solve compiles its own
/// positional copy of the model, so one solver can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve `model`, reporting every outcome through the returned status.
    pub fn solve<Brand>(&self, model: &Model<Brand>) -> Solution<Brand> {
        let start = Instant::now();

        if let Err(err) = model.validate() {
            warn!("rejecting model: {}", err);
            return Solution::without_values(
                model,
                OptimizationStatus::ModelInvalid,
                SolveStatistics::default(),
            );
        }

        let problem = compile(model);
        debug!(
            "solving ({:?}) with {} columns ({} integer) and {} rows",
            model.sense(),
            problem.num_cols(),
            problem.integer.iter().filter(|&&is_int| is_int).count(),
            problem.num_rows()
        );

        let solution = if problem.num_cols() == 0 {
            self.solve_constant(model, &problem, start)
        } else if problem.has_integers() {
            self.solve_integer(model, &problem, start)
        } else {
            self.solve_continuous(model, &problem, start)
        };

        debug!(
            "finished with {} (objective {}) in {:?}",
            solution.status(),
            solution.objective_value(),
            solution.statistics().elapsed
        );
        solution
    }

    /// A model without variables: every row has to admit an activity of zero.
    fn solve_constant<Brand>(
        &self,
        model: &Model<Brand>,
        problem: &LpProblem,
        start: Instant,
    ) -> Solution<Brand> {
        let tolerance = self.config.tolerances.feasibility;
        let feasible = problem
            .row_lower
            .iter()
            .zip(&problem.row_upper)
            .all(|(&lower, &upper)| lower <= tolerance && upper >= -tolerance);

        let constant = model.objective_constant();
        let statistics = SolveStatistics {
            elapsed: start.elapsed(),
            best_bound: if feasible { constant } else { f64::NAN },
            ..SolveStatistics::default()
        };

        if feasible {
            Solution::with_values(
                model,
                OptimizationStatus::Optimal,
                constant,
                Vec::new(),
                vec![0.0; problem.num_rows()],
                statistics,
            )
        } else {
            Solution::without_values(model, OptimizationStatus::Infeasible, statistics)
        }
    }

    fn solve_continuous<Brand>(
        &self,
        model: &Model<Brand>,
        problem: &LpProblem,
        start: Instant,
    ) -> Solution<Brand> {
        let result = solve_lp(problem, &problem.col_lower, &problem.col_upper, &self.config);
        let mut statistics = SolveStatistics {
            nodes: 1,
            simplex_iterations: result.iterations,
            ..SolveStatistics::default()
        };

        let status = match result.status {
            LpStatus::Optimal => OptimizationStatus::Optimal,
            LpStatus::Infeasible => OptimizationStatus::Infeasible,
            LpStatus::Unbounded => OptimizationStatus::Unbounded,
            LpStatus::IterationLimit | LpStatus::Numerical => {
                warn!("relaxation failed: {:?}", result.status);
                OptimizationStatus::Abnormal
            }
        };

        statistics.elapsed = start.elapsed();
        if status != OptimizationStatus::Optimal {
            return Solution::without_values(model, status, statistics);
        }

        let objective = to_user_space(model, result.objective);
        statistics.best_bound = objective;
        let activities = problem.row_activities(&result.x);
        Solution::with_values(model, status, objective, result.x, activities, statistics)
    }

    fn solve_integer<Brand>(
        &self,
        model: &Model<Brand>,
        problem: &LpProblem,
        start: Instant,
    ) -> Solution<Brand> {
        let deadline = start.checked_add(self.config.time_limit);
        let outcome = BranchAndBound::new(problem, &self.config, deadline).run();

        let statistics = SolveStatistics {
            nodes: outcome.nodes,
            simplex_iterations: outcome.iterations,
            elapsed: start.elapsed(),
            best_bound: to_user_space(model, outcome.best_bound),
            limit_reached: outcome.limit_reached,
        };

        match outcome.x {
            Some(x) if outcome.status.is_valid() => {
                let objective = to_user_space(model, outcome.objective);
                let activities = problem.row_activities(&x);
                Solution::with_values(model, outcome.status, objective, x, activities, statistics)
            }
            _ => Solution::without_values(model, outcome.status, statistics),
        }
    }
}

/// Map a minimization-form objective back to the model's sense and constant.
fn to_user_space<Brand>(model: &Model<Brand>, objective: f64) -> f64 {
    model.sense().sign() * objective + model.objective_constant()
}

/// Compact the name-keyed model into positional arrays.
///
/// Columns follow declaration order; row entries are sorted by column and
/// zero coefficients are dropped.
fn compile<Brand>(model: &Model<Brand>) -> LpProblem {
    let sign = model.sense().sign();
    let num_cols = model.num_variables();

    let mut col_lower = Vec::with_capacity(num_cols);
    let mut col_upper = Vec::with_capacity(num_cols);
    let mut cost = Vec::with_capacity(num_cols);
    let mut integer = Vec::with_capacity(num_cols);

    for var in model.variables() {
        let (lower, upper) = var.solver_bounds();
        col_lower.push(lower);
        col_upper.push(upper);
        cost.push(sign * var.objective_coefficient());
        integer.push(var.var_type().is_integral());
    }

    let rows = model
        .constraints()
        .iter()
        .map(|row| {
            let mut entries: Vec<(usize, f64)> = row
                .coefficients
                .iter()
                .filter(|(_, value)| **value != 0.0)
                .filter_map(|(name, &value)| model.index.get(name).map(|&col| (col, value)))
                .collect();
            entries.sort_unstable_by_key(|&(col, _)| col);
            entries
        })
        .collect();

    LpProblem {
        rows,
        row_lower: model.constraints().iter().map(|c| c.lower_bound()).collect(),
        row_upper: model.constraints().iter().map(|c| c.upper_bound()).collect(),
        col_lower,
        col_upper,
        cost,
        integer,
    }
}

/// Solve `model` with default settings and the given wall-clock budget.
pub fn solve<Brand>(model: &Model<Brand>, time_limit: Duration) -> Solution<Brand> {
    Solver::new(SolverConfig::default().with_time_limit(time_limit)).solve(model)
}

/// Solve independent models in parallel, one rayon task per model.
///
/// Results are returned in the order of `models`.
pub fn solve_many<Brand>(models: &[Model<Brand>], config: &SolverConfig) -> Vec<Solution<Brand>> {
    let solver = Solver::new(config.clone());
    models.par_iter().map(|model| solver.solve(model)).collect()
}
