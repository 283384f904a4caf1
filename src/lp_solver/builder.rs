use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::error::{ModelError, check_bounds};
use super::model::{ConstraintInfo, Model, VariableInfo};
use super::{
    Constraint, ConstraintId, LinearExpression, OptimizationSense, Solution, Solver,
    SolverConfig, VariableId, VariableType,
};

/// Declaration of a variable for [`LPModelBuilder::add_variables`]
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub var_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub objective: f64,
}

impl VariableSpec {
    pub fn new(
        name: impl Into<String>,
        var_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Self {
            name: name.into(),
            var_type,
            lower_bound,
            upper_bound,
            objective: 0.0,
        }
    }

    pub fn continuous(name: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Self {
        Self::new(name, VariableType::Continuous, lower_bound, upper_bound)
    }

    pub fn integer(name: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Self {
        Self::new(name, VariableType::Integer, lower_bound, upper_bound)
    }

    pub fn with_objective(mut self, objective: f64) -> Self {
        self.objective = objective;
        self
    }

    fn check(&self) -> Result<(), ModelError> {
        check_bounds(self.lower_bound, self.upper_bound, || {
            format!("variable `{}`", self.name)
        })
    }

    fn into_info(self) -> VariableInfo {
        VariableInfo {
            name: self.name,
            var_type: self.var_type,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            objective: self.objective,
        }
    }
}

/// Mutable handle to a constraint row, returned by [`LPModelBuilder::add_constraint`]
pub struct ConstraintHandle<'a, Brand> {
    model: &'a mut Model<Brand>,
    id: ConstraintId,
}

impl<Brand> ConstraintHandle<'_, Brand> {
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Set (overwrite) the coefficient of a declared variable in this row.
    ///
    /// Fails with [`ModelError::UnknownVariable`] for names that were never
    /// declared; forward references are not auto-declared.
    pub fn set_coefficient(&mut self, variable: &str, value: f64) -> Result<&mut Self, ModelError> {
        if !self.model.index.contains_key(variable) {
            return Err(ModelError::UnknownVariable(variable.to_string()));
        }
        self.row_mut()
            .coefficients
            .insert(variable.to_string(), value);
        Ok(self)
    }

    /// Coefficient currently stored for `variable` (zero when unset)
    pub fn coefficient(&self, variable: &str) -> f64 {
        self.model.constraints[self.id.0].coefficient(variable)
    }

    /// Replace the row bounds
    pub fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<&mut Self, ModelError> {
        let id = self.id.0;
        check_bounds(lower, upper, || format!("constraint #{id}"))?;
        let row = self.row_mut();
        row.lower_bound = lower;
        row.upper_bound = upper;
        Ok(self)
    }

    fn row_mut(&mut self) -> &mut ConstraintInfo {
        &mut self.model.constraints[self.id.0]
    }
}

/// Incremental builder for LP/MILP models
///
/// The builder owns the [`Model`] it assembles; mutators return `&mut Self` so
/// calls can be chained. Fallible calls leave the model unchanged on error.
///
/// # Examples
///
/// ```rust
/// use linopt::lp_solver::{LPModelBuilder, VariableSpec, VariableType};
///
/// # fn main() -> Result<(), linopt::lp_solver::ModelError> {
/// let mut builder: LPModelBuilder = LPModelBuilder::new();
/// builder.add_variables([
///     VariableSpec::integer("x", 0.0, 1.0).with_objective(1.0),
///     VariableSpec::integer("y", 0.0, 1.0).with_objective(1.0),
/// ])?;
///
/// let row = builder.add_constraint(f64::NEG_INFINITY, 1.5)?.id();
/// builder.set_coefficient(row, "x", 1.0)?.set_coefficient(row, "y", 1.0)?;
/// builder.set_maximization();
///
/// let solution = builder.solve();
/// assert!((solution.objective_value() - 1.0).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
pub struct LPModelBuilder<Brand = ()> {
    model: Model<Brand>,
}

impl<Brand> LPModelBuilder<Brand> {
    /// Create a new builder over an empty minimization model
    pub fn new() -> Self {
        Self {
            model: Model::new(),
        }
    }

    /// Add a variable with a zero objective coefficient.
    ///
    /// Redeclaring an existing name overwrites its bounds, type and objective
    /// coefficient and returns the original handle.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        var_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<VariableId<Brand>, ModelError> {
        self.add_variable_with_objective(name, var_type, lower_bound, upper_bound, 0.0)
    }

    pub fn add_variable_with_objective(
        &mut self,
        name: impl Into<String>,
        var_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
        objective: f64,
    ) -> Result<VariableId<Brand>, ModelError> {
        let spec =
            VariableSpec::new(name, var_type, lower_bound, upper_bound).with_objective(objective);
        spec.check()?;
        Ok(VariableId::new(self.model.upsert_variable(spec.into_info())))
    }

    /// Add several variables at once; nothing is inserted if any element is malformed.
    pub fn add_variables(
        &mut self,
        specs: impl IntoIterator<Item = VariableSpec>,
    ) -> Result<Vec<VariableId<Brand>>, ModelError> {
        let specs: Vec<VariableSpec> = specs.into_iter().collect();
        specs.iter().try_for_each(VariableSpec::check)?;

        Ok(specs
            .into_iter()
            .map(|spec| VariableId::new(self.model.upsert_variable(spec.into_info())))
            .collect())
    }

    /// Append a row `lower <= a·x <= upper` with all coefficients zero
    pub fn add_constraint(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<ConstraintHandle<'_, Brand>, ModelError> {
        self.push_row(None, lower_bound, upper_bound)
    }

    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<ConstraintHandle<'_, Brand>, ModelError> {
        self.push_row(Some(name.into()), lower_bound, upper_bound)
    }

    /// Append several rows at once; nothing is appended if any pair is malformed.
    pub fn add_constraints(
        &mut self,
        bounds: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Vec<ConstraintId>, ModelError> {
        let bounds: Vec<(f64, f64)> = bounds.into_iter().collect();
        let first = self.model.num_constraints();
        for (offset, &(lower, upper)) in bounds.iter().enumerate() {
            check_bounds(lower, upper, || format!("constraint #{}", first + offset))?;
        }

        Ok(bounds
            .into_iter()
            .map(|(lower, upper)| {
                self.model
                    .push_constraint(ConstraintInfo::new(None, lower, upper))
            })
            .collect())
    }

    /// Reopen an existing row for editing
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<ConstraintHandle<'_, Brand>> {
        (id.0 < self.model.num_constraints()).then(|| ConstraintHandle {
            model: &mut self.model,
            id,
        })
    }

    /// Set the coefficient of `variable` in row `id`
    pub fn set_coefficient(
        &mut self,
        id: ConstraintId,
        variable: &str,
        value: f64,
    ) -> Result<&mut Self, ModelError> {
        self.constraint_mut(id)
            .ok_or(ModelError::UnknownConstraint(id.0))?
            .set_coefficient(variable, value)?;
        Ok(self)
    }

    /// Set (overwrite) the objective coefficient of a declared variable
    pub fn set_objective_coefficient(
        &mut self,
        variable: &str,
        value: f64,
    ) -> Result<&mut Self, ModelError> {
        let idx = *self
            .model
            .index
            .get(variable)
            .ok_or_else(|| ModelError::UnknownVariable(variable.to_string()))?;
        self.model.variables[idx].objective = value;
        Ok(self)
    }

    pub fn set_objective_constant(&mut self, value: f64) -> &mut Self {
        self.model.objective_constant = value;
        self
    }

    pub fn set_maximization(&mut self) -> &mut Self {
        self.set_sense(OptimizationSense::Maximize)
    }

    pub fn set_minimization(&mut self) -> &mut Self {
        self.set_sense(OptimizationSense::Minimize)
    }

    pub fn set_sense(&mut self, sense: OptimizationSense) -> &mut Self {
        self.model.sense = sense;
        self
    }

    /// Add a constraint written as a linear expression.
    ///
    /// Terms on the same variable are summed and the expression constant is moved
    /// into the row bounds.
    pub fn add_linear_constraint(
        &mut self,
        constraint: Constraint<Brand>,
    ) -> Result<ConstraintId, ModelError> {
        let (lower, upper) = constraint.row_bounds();
        let id = self.model.num_constraints();
        check_bounds(lower, upper, || format!("constraint #{id}"))?;

        let coefficients = self.collect_terms(&constraint.expression)?;
        let mut row = ConstraintInfo::new(constraint.name, lower, upper);
        row.coefficients = coefficients;
        Ok(self.model.push_constraint(row))
    }

    /// Replace the whole objective with `expression` and set the direction.
    pub fn set_objective(
        &mut self,
        expression: impl Into<LinearExpression<Brand>>,
        sense: OptimizationSense,
    ) -> Result<&mut Self, ModelError> {
        let expression = expression.into();
        let coefficients = self.collect_terms(&expression)?;
        for var in &mut self.model.variables {
            var.objective = coefficients.get(&var.name).copied().unwrap_or(0.0);
        }
        self.model.objective_constant = expression.constant;
        Ok(self.set_sense(sense))
    }

    /// Sum the terms of `expression` per variable name.
    ///
    /// Ids resolve by position, so an unbranded id from another builder binds to
    /// the variable declared at its index here.
    fn collect_terms(
        &self,
        expression: &LinearExpression<Brand>,
    ) -> Result<HashMap<String, f64>, ModelError> {
        let mut coefficients = HashMap::new();
        for term in &expression.terms {
            let idx = term.variable.index();
            let var = self
                .model
                .variables
                .get(idx)
                .ok_or_else(|| ModelError::UnknownVariable(format!("#{idx}")))?;
            *coefficients.entry(var.name.clone()).or_insert(0.0) += term.coefficient;
        }
        Ok(coefficients)
    }

    fn push_row(
        &mut self,
        name: Option<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<ConstraintHandle<'_, Brand>, ModelError> {
        let id = self.model.num_constraints();
        check_bounds(lower_bound, upper_bound, || match &name {
            Some(name) => format!("constraint `{name}`"),
            None => format!("constraint #{id}"),
        })?;
        let id = self
            .model
            .push_constraint(ConstraintInfo::new(name, lower_bound, upper_bound));
        Ok(ConstraintHandle {
            model: &mut self.model,
            id,
        })
    }

    /// The model assembled so far
    pub fn model(&self) -> &Model<Brand> {
        &self.model
    }

    /// Finish building and take ownership of the model
    pub fn build(self) -> Model<Brand> {
        self.model
    }

    /// Solve with the default configuration (30 second time limit)
    pub fn solve(&self) -> Solution<Brand> {
        self.solve_with(&SolverConfig::default())
    }

    pub fn solve_with_time_limit(&self, time_limit: Duration) -> Solution<Brand> {
        self.solve_with(&SolverConfig::default().with_time_limit(time_limit))
    }

    pub fn solve_with(&self, config: &SolverConfig) -> Solution<Brand> {
        Solver::new(config.clone()).solve(&self.model)
    }
}

impl<Brand> Default for LPModelBuilder<Brand> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual trait implementations that don't require Brand

impl<Brand> fmt::Debug for LPModelBuilder<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LPModelBuilder")
            .field("model", &self.model)
            .finish()
    }
}

impl<Brand> fmt::Debug for ConstraintHandle<'_, Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintHandle")
            .field("id", &self.id)
            .field("row", &self.model.constraints().get(self.id.0))
            .finish()
    }
}
