//! Model storage: variables, constraint rows and the objective.
//!
//! Variables are kept in declaration order with a name index on the side, so the
//! solver can compact the name-keyed model into positional arrays once per solve.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use itertools::Itertools;

use super::error::{ModelError, check_bounds, check_finite};
use super::{ConstraintId, OptimizationSense, VariableId, VariableType};

/// A decision variable stored in the model
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub(crate) name: String,
    pub(crate) var_type: VariableType,
    pub(crate) lower_bound: f64,
    pub(crate) upper_bound: f64,
    pub(crate) objective: f64,
}

impl VariableInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn objective_coefficient(&self) -> f64 {
        self.objective
    }

    /// Bounds as seen by the solver; binary variables are clamped to `[0, 1]`.
    pub(crate) fn solver_bounds(&self) -> (f64, f64) {
        match self.var_type {
            VariableType::Binary => (self.lower_bound.max(0.0), self.upper_bound.min(1.0)),
            _ => (self.lower_bound, self.upper_bound),
        }
    }
}

/// A constraint row `lower <= sum(coefficient * variable) <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintInfo {
    pub(crate) name: Option<String>,
    pub(crate) lower_bound: f64,
    pub(crate) upper_bound: f64,
    pub(crate) coefficients: HashMap<String, f64>,
}

impl ConstraintInfo {
    pub(crate) fn new(name: Option<String>, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            name,
            lower_bound,
            upper_bound,
            coefficients: HashMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Coefficient of `variable` in this row; unset coefficients are zero
    pub fn coefficient(&self, variable: &str) -> f64 {
        self.coefficients.get(variable).copied().unwrap_or(0.0)
    }

    /// Non-zero coefficients, sorted by variable name
    pub fn coefficients(&self) -> impl Iterator<Item = (&str, f64)> {
        self.coefficients
            .iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|(name, value)| (name.as_str(), *value))
            .sorted_by(|a, b| a.0.cmp(b.0))
    }
}

/// A linear or mixed-integer program
///
/// Models are created through [`LPModelBuilder`](super::LPModelBuilder) and consumed
/// read-only by the [`Solver`](super::Solver).
pub struct Model<Brand = ()> {
    pub(crate) variables: Vec<VariableInfo>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) constraints: Vec<ConstraintInfo>,
    pub(crate) sense: OptimizationSense,
    pub(crate) objective_constant: f64,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> Model<Brand> {
    /// Create an empty minimization model
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            sense: OptimizationSense::Minimize,
            objective_constant: 0.0,
            _brand: PhantomData,
        }
    }

    /// Variables in declaration order
    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.index.get(name).map(|&idx| &self.variables[idx])
    }

    pub fn variable_id(&self, name: &str) -> Option<VariableId<Brand>> {
        self.index.get(name).map(|&idx| VariableId::new(idx))
    }

    /// Constraint rows in insertion order
    pub fn constraints(&self) -> &[ConstraintInfo] {
        &self.constraints
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&ConstraintInfo> {
        self.constraints.get(id.0)
    }

    pub fn sense(&self) -> OptimizationSense {
        self.sense
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(|v| v.var_type.is_integral())
    }

    /// Insert or replace a variable, returning its position.
    pub(crate) fn upsert_variable(&mut self, info: VariableInfo) -> usize {
        match self.index.get(&info.name) {
            Some(&idx) => {
                self.variables[idx] = info;
                idx
            }
            None => {
                let idx = self.variables.len();
                self.index.insert(info.name.clone(), idx);
                self.variables.push(info);
                idx
            }
        }
    }

    pub(crate) fn push_constraint(&mut self, info: ConstraintInfo) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(info);
        id
    }

    /// Check the accumulated state before solving.
    ///
    /// Every row may only reference declared variables, every bound pair must be
    /// consistent and every coefficient must be finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        for var in &self.variables {
            check_bounds(var.lower_bound, var.upper_bound, || {
                format!("variable `{}`", var.name)
            })?;
            check_finite(var.objective, || {
                format!("objective coefficient of `{}`", var.name)
            })?;
        }

        for (idx, row) in self.constraints.iter().enumerate() {
            check_bounds(row.lower_bound, row.upper_bound, || {
                format!("constraint #{idx}")
            })?;
            for (name, &value) in &row.coefficients {
                if !self.index.contains_key(name) {
                    return Err(ModelError::UnknownVariable(name.clone()));
                }
                check_finite(value, || format!("coefficient of `{name}` in constraint #{idx}"))?;
            }
        }

        check_finite(self.objective_constant, || "objective constant".to_string())
    }
}

impl<Brand> Default for Model<Brand> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual trait implementations that don't require Brand to implement anything
impl<Brand> Clone for Model<Brand> {
    fn clone(&self) -> Self {
        Self {
            variables: self.variables.clone(),
            index: self.index.clone(),
            constraints: self.constraints.clone(),
            sense: self.sense,
            objective_constant: self.objective_constant,
            _brand: PhantomData,
        }
    }
}

impl<Brand> fmt::Debug for Model<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("variables", &self.variables)
            .field("constraints", &self.constraints)
            .field("sense", &self.sense)
            .field("objective_constant", &self.objective_constant)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, lower: f64, upper: f64) -> VariableInfo {
        VariableInfo {
            name: name.to_string(),
            var_type: VariableType::Continuous,
            lower_bound: lower,
            upper_bound: upper,
            objective: 0.0,
        }
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut model: Model = Model::new();
        assert_eq!(model.upsert_variable(variable("x", 0.0, 1.0)), 0);
        assert_eq!(model.upsert_variable(variable("y", 0.0, 1.0)), 1);
        assert_eq!(model.upsert_variable(variable("x", -5.0, 5.0)), 0);

        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.variables()[0].lower_bound(), -5.0);
        assert_eq!(model.variable("y").map(|v| v.upper_bound()), Some(1.0));
    }

    #[test]
    fn test_validate_rejects_dangling_coefficient() {
        let mut model: Model = Model::new();
        model.upsert_variable(variable("x", 0.0, 1.0));
        let mut row = ConstraintInfo::new(None, 0.0, 1.0);
        row.coefficients.insert("ghost".to_string(), 1.0);
        model.push_constraint(row);

        assert_eq!(
            model.validate(),
            Err(ModelError::UnknownVariable("ghost".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let mut model: Model = Model::new();
        model.upsert_variable(variable("x", 0.0, 1.0));
        assert!(model.validate().is_ok());

        model.objective_constant = f64::NAN;
        assert!(matches!(model.validate(), Err(ModelError::NonFinite { .. })));

        model.objective_constant = 0.0;
        let mut row = ConstraintInfo::new(None, 0.0, 1.0);
        row.coefficients.insert("x".to_string(), f64::INFINITY);
        model.push_constraint(row);
        assert!(matches!(model.validate(), Err(ModelError::NonFinite { .. })));
    }

    #[test]
    fn test_binary_solver_bounds() {
        let mut var = variable("b", -3.0, 7.0);
        var.var_type = VariableType::Binary;
        assert_eq!(var.solver_bounds(), (0.0, 1.0));
    }

    #[test]
    fn test_coefficients_sorted_and_skip_zeros() {
        let mut row = ConstraintInfo::new(Some("r".to_string()), 0.0, 1.0);
        row.coefficients.insert("z".to_string(), 3.0);
        row.coefficients.insert("a".to_string(), 1.0);
        row.coefficients.insert("m".to_string(), 0.0);
        let pairs: Vec<_> = row.coefficients().collect();
        assert_eq!(pairs, vec![("a", 1.0), ("z", 3.0)]);
        assert_eq!(row.coefficient("missing"), 0.0);
    }
}
