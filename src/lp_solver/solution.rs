use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::time::Duration;

use prettytable::*;

use super::model::Model;
use super::{ConstraintId, OptimizationStatus, VariableId};

/// Work counters of a finished solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveStatistics {
    /// Branch-and-bound nodes whose relaxation was solved (1 for a pure LP)
    pub nodes: usize,
    /// Simplex pivots over all relaxations
    pub simplex_iterations: usize,
    pub elapsed: Duration,
    /// Best proven bound on the optimum, in the model's sense. NaN if unknown.
    pub best_bound: f64,
    /// The time or node budget ran out before the search finished
    pub limit_reached: bool,
}

impl Default for SolveStatistics {
    fn default() -> Self {
        Self {
            nodes: 0,
            simplex_iterations: 0,
            elapsed: Duration::ZERO,
            best_bound: f64::NAN,
            limit_reached: false,
        }
    }
}

/// Result of solving a [`Model`]
///
/// Values are only present when [`status`](Self::status) is `Optimal` or
/// `Feasible`; every accessor returns `None` (or NaN for the objective) otherwise.
pub struct Solution<Brand = ()> {
    status: OptimizationStatus,
    objective: f64,
    names: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<f64>,
    activities: Vec<f64>,
    statistics: SolveStatistics,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> Solution<Brand> {
    pub(crate) fn with_values(
        model: &Model<Brand>,
        status: OptimizationStatus,
        objective: f64,
        values: Vec<f64>,
        activities: Vec<f64>,
        statistics: SolveStatistics,
    ) -> Self {
        Self {
            status,
            objective,
            names: model.variables().iter().map(|v| v.name().to_string()).collect(),
            index: model.index.clone(),
            values,
            activities,
            statistics,
            _brand: PhantomData,
        }
    }

    pub(crate) fn without_values(
        model: &Model<Brand>,
        status: OptimizationStatus,
        statistics: SolveStatistics,
    ) -> Self {
        Self::with_values(model, status, f64::NAN, Vec::new(), Vec::new(), statistics)
    }

    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// True iff the status carries a usable solution
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Objective value including the constant term; NaN when not valid
    pub fn objective_value(&self) -> f64 {
        if self.is_valid() {
            self.objective
        } else {
            f64::NAN
        }
    }

    pub fn variable_value(&self, name: &str) -> Option<f64> {
        self.index
            .get(name)
            .and_then(|&idx| self.values.get(idx))
            .copied()
    }

    /// Get the value of a variable
    pub fn get_value(&self, variable: VariableId<Brand>) -> Option<f64> {
        self.values.get(variable.index()).copied()
    }

    /// `(name, value)` pairs in declaration order; empty when not valid
    pub fn values(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, &value)| (name.as_str(), value))
    }

    /// Activity `a·x` of a constraint row at the solution point
    pub fn constraint_activity(&self, id: ConstraintId) -> Option<f64> {
        self.activities.get(id.index()).copied()
    }

    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }

    /// Table of the model's variables next to their values.
    pub fn report(&self, model: &Model<Brand>) -> Table {
        let mut table = Table::new();
        table.set_titles(row!["Variable", "Type", "Lower", "Value", "Upper", "Objective"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        for var in model.variables() {
            let value = self
                .variable_value(var.name())
                .map_or_else(|| "-".to_string(), |v| format!("{}", v));
            table.add_row(row![
                var.name(),
                var.var_type(),
                format!("{}", var.lower_bound()),
                r->value,
                format!("{}", var.upper_bound()),
                format!("{}", var.objective_coefficient()),
            ]);
        }

        table
    }

    /// Table of the model's rows with their activity at the solution point.
    pub fn constraint_report(&self, model: &Model<Brand>) -> Table {
        let mut table = Table::new();
        table.set_titles(row!["#", "Constraint", "Lower", "Activity", "Upper"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        for (idx, constraint) in model.constraints().iter().enumerate() {
            let activity = self
                .activities
                .get(idx)
                .map_or_else(|| "-".to_string(), |v| format!("{}", v));
            table.add_row(row![
                idx,
                constraint.name().unwrap_or(""),
                format!("{}", constraint.lower_bound()),
                r->activity,
                format!("{}", constraint.upper_bound()),
            ]);
        }

        table
    }

    /// Write the summary line followed by the variable and constraint tables.
    pub fn print_report<W: Write>(&self, model: &Model<Brand>, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{}", self)?;
        self.report(model).print(&mut writer)?;
        if model.num_constraints() > 0 {
            writeln!(writer)?;
            self.constraint_report(model).print(&mut writer)?;
        }
        Ok(())
    }
}

impl<Brand> fmt::Display for Solution<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if self.is_valid() {
            write!(f, ": objective = {}", self.objective)?;
        }
        write!(
            f,
            " ({} nodes, {} simplex iterations, {:.3}s)",
            self.statistics.nodes,
            self.statistics.simplex_iterations,
            self.statistics.elapsed.as_secs_f64()
        )
    }
}

// Manual trait implementations that don't require Brand to implement anything
impl<Brand> Clone for Solution<Brand> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            objective: self.objective,
            names: self.names.clone(),
            index: self.index.clone(),
            values: self.values.clone(),
            activities: self.activities.clone(),
            statistics: self.statistics.clone(),
            _brand: PhantomData,
        }
    }
}

impl<Brand> fmt::Debug for Solution<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("status", &self.status)
            .field("objective", &self.objective)
            .field("values", &self.values)
            .field("statistics", &self.statistics)
            .finish()
    }
}
