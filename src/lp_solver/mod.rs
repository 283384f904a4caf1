//! Linear Programming (LP) and Mixed-Integer Linear Programming (MILP) modeling and solving
//!
//! This module provides a name-keyed model builder, a bounded-variable simplex for
//! continuous relaxations and a branch-and-bound search for integer variables.
//!
//! # Building Models
//!
//! Models are assembled incrementally through [`LPModelBuilder`]. Variables are
//! identified by a unique name; redeclaring a name overwrites its bounds, type and
//! objective coefficient instead of creating a duplicate.
//!
//! ```rust
//! use linopt::lp_solver::{LPModelBuilder, OptimizationStatus, VariableType};
//!
//! # fn main() -> Result<(), linopt::lp_solver::ModelError> {
//! let mut builder: LPModelBuilder = LPModelBuilder::new();
//! builder.add_variable("x", VariableType::Continuous, 0.0, 10.0)?;
//! builder.add_variable("y", VariableType::Continuous, 0.0, 5.0)?;
//!
//! // 0 <= 2x + 5y <= 10
//! builder
//!     .add_constraint(0.0, 10.0)?
//!     .set_coefficient("x", 2.0)?
//!     .set_coefficient("y", 5.0)?;
//!
//! builder.set_objective_coefficient("x", 1.0)?;
//! builder.set_objective_coefficient("y", 1.0)?;
//! builder.set_maximization();
//!
//! let solution = builder.solve();
//! assert_eq!(solution.status(), OptimizationStatus::Optimal);
//! # Ok(())
//! # }
//! ```
//!
//! Every constraint is a single row `lower <= a·x <= upper`. One-sided rows use
//! `f64::INFINITY` / `f64::NEG_INFINITY`, and equality rows use `lower == upper`.
//!
//! # Expression Building
//!
//! The builder also accepts constraints written with operator overloading over the
//! [`VariableId`] handles returned by `add_variable`:
//!
//! ```rust
//! use linopt::constraint;
//! use linopt::lp_model_builder;
//! use linopt::lp_solver::{OptimizationSense, VariableType};
//!
//! # fn main() -> Result<(), linopt::lp_solver::ModelError> {
//! let mut builder = lp_model_builder!();
//! let x = builder.add_variable("x", VariableType::Continuous, 0.0, f64::INFINITY)?;
//! let y = builder.add_variable("y", VariableType::Integer, 0.0, f64::INFINITY)?;
//!
//! builder.add_linear_constraint(constraint!((x + y) == 10.0))?;
//! builder.add_linear_constraint(constraint!("capacity", (2.0 * x - y) <= 5.0))?;
//! builder.set_objective(x + 2.0 * y, OptimizationSense::Maximize)?;
//!
//! let _solution = builder.solve();
//! # Ok(())
//! # }
//! ```
//!
//! # Type Safety with Branded Types
//!
//! All handle types carry a `Brand` type parameter. Variables from one builder
//! cannot be used in expressions for another builder created with
//! [`lp_model_builder!`](crate::lp_model_builder), since each macro call creates a
//! distinct zero-sized brand. The brand defaults to `()` so name-keyed code can
//! ignore it entirely.
//!
//! Ids are positional. Two builders that share the default `()` brand accept
//! each other's [`VariableId`]s, and a foreign id resolves to whichever variable
//! was declared at the same index. Only an index past the end of the model is
//! rejected, with [`ModelError::UnknownVariable`]. Use [`lp_model_builder!`](crate::lp_model_builder)
//! when expressions from several models are in scope at once.
//!
//! # Solving
//!
//! [`Solver`] consumes a finished [`Model`] and returns a [`Solution`]. Solving never
//! fails with an error: infeasibility, unboundedness, numerical trouble, exhausted
//! time budgets and structurally invalid models are all reported through
//! [`OptimizationStatus`]. Only builder-time contract violations (bad bounds,
//! unknown names) are returned as [`ModelError`].
//!
//! Solver behaviour is tuned through [`SolverConfig`], which can also be read from
//! the environment:
//! - `LINOPT_TIME_LIMIT` - wall-clock budget in seconds (default 30)
//! - `LINOPT_BRANCHING` - `"first-fractional"` or `"most-fractional"`
//! - `LINOPT_NODE_SELECTION` - `"depth-first"` or `"best-bound"`

use std::fmt;
use std::marker::PhantomData;

mod branch_and_bound;
mod builder;
pub mod config;
mod error;
pub mod macros;
mod model;
pub mod ops;
mod simplex;
mod solution;
mod solver;

pub use builder::{ConstraintHandle, LPModelBuilder, VariableSpec};
pub use config::{BranchingRule, NodeSelection, SolverConfig, Tolerances};
pub use error::ModelError;
pub use model::{ConstraintInfo, Model, VariableInfo};
pub use solution::{SolveStatistics, Solution};
pub use solver::{Solver, solve, solve_many};

/// Variable types supported by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Continuous variable (can take any real value within its bounds)
    Continuous,
    /// Integer variable (can only take integer values)
    Integer,
    /// Binary variable, an integer variable whose bounds are clamped to `[0, 1]`
    Binary,
}

impl VariableType {
    /// Whether the branch-and-bound search has to enforce integrality
    pub fn is_integral(self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Binary)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "continuous"),
            VariableType::Integer => write!(f, "integer"),
            VariableType::Binary => write!(f, "binary"),
        }
    }
}

/// Constraint sense for expression-based constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// Less than or equal to (≤)
    LessEqual,
    /// Equal to (=)
    Equal,
    /// Greater than or equal to (≥)
    GreaterEqual,
}

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationSense {
    /// Minimize the objective function
    #[default]
    Minimize,
    /// Maximize the objective function
    Maximize,
}

impl OptimizationSense {
    /// Factor turning the objective into its minimization form
    pub(crate) fn sign(self) -> f64 {
        match self {
            OptimizationSense::Minimize => 1.0,
            OptimizationSense::Maximize => -1.0,
        }
    }
}

/// Status of the optimization process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationStatus {
    /// The solver has not produced an answer (e.g. the time budget ran out
    /// before any integer-feasible point was found)
    #[default]
    NotSolved,
    /// Optimal solution found
    Optimal,
    /// Feasible solution found, but not proven optimal
    Feasible,
    /// Problem is infeasible (no solution exists)
    Infeasible,
    /// Problem is unbounded
    Unbounded,
    /// Numerical failure (iteration limit, precision breakdown)
    Abnormal,
    /// The model failed structural validation
    ModelInvalid,
}

impl OptimizationStatus {
    /// True iff the status carries a usable solution
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            OptimizationStatus::Optimal | OptimizationStatus::Feasible
        )
    }
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizationStatus::NotSolved => "NOT_SOLVED",
            OptimizationStatus::Optimal => "OPTIMAL",
            OptimizationStatus::Feasible => "FEASIBLE",
            OptimizationStatus::Infeasible => "INFEASIBLE",
            OptimizationStatus::Unbounded => "UNBOUNDED",
            OptimizationStatus::Abnormal => "ABNORMAL",
            OptimizationStatus::ModelInvalid => "MODEL_INVALID",
        };
        f.write_str(name)
    }
}

/// Handle to a variable of a model
///
/// The `Brand` type parameter ensures that variables can only be used with the
/// builder that created them. This is enforced at compile time.
pub struct VariableId<Brand = ()> {
    id: usize,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> VariableId<Brand> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            _brand: PhantomData,
        }
    }

    /// Position of the variable in declaration order
    pub fn index(self) -> usize {
        self.id
    }
}

// Manual trait implementations that don't require Brand to implement anything
impl<Brand> fmt::Debug for VariableId<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableId").field("id", &self.id).finish()
    }
}

impl<Brand> Clone for VariableId<Brand> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Brand> Copy for VariableId<Brand> {}

impl<Brand> PartialEq for VariableId<Brand> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Brand> Eq for VariableId<Brand> {}

impl<Brand> std::hash::Hash for VariableId<Brand> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Handle to a constraint row of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    /// Position of the row in insertion order
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear expression term: coefficient * variable
#[derive(Debug, Clone)]
pub struct LinearTerm<Brand> {
    pub coefficient: f64,
    pub variable: VariableId<Brand>,
}

/// A linear expression: sum of terms plus constant
#[derive(Debug, Clone)]
pub struct LinearExpression<Brand> {
    pub terms: Vec<LinearTerm<Brand>>,
    pub constant: f64,
}

impl<Brand> LinearExpression<Brand> {
    /// Create a new linear expression with a constant term
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Add a term to the expression
    pub fn add_term(&mut self, coefficient: f64, variable: VariableId<Brand>) {
        self.terms.push(LinearTerm {
            coefficient,
            variable,
        });
    }

    /// Create a linear expression from a single variable
    pub fn from_variable(variable: VariableId<Brand>) -> Self {
        Self {
            terms: vec![LinearTerm {
                coefficient: 1.0,
                variable,
            }],
            constant: 0.0,
        }
    }

    /// Evaluate the expression against a solution.
    ///
    /// Returns `None` when the solution carries no values.
    pub fn evaluate(&self, solution: &Solution<Brand>) -> Option<f64> {
        self.terms.iter().try_fold(self.constant, |acc, term| {
            solution
                .get_value(term.variable)
                .map(|value| acc + term.coefficient * value)
        })
    }
}

impl<Brand> From<VariableId<Brand>> for LinearExpression<Brand> {
    fn from(variable: VariableId<Brand>) -> Self {
        Self::from_variable(variable)
    }
}

/// A linear constraint in expression form: `expression <sense> rhs`
///
/// Expression constraints are lowered onto a single model row by
/// [`LPModelBuilder::add_linear_constraint`], with the expression constant moved
/// to the row bounds.
///
/// # Examples
///
/// ```rust
/// use linopt::constraint;
/// use linopt::lp_model_builder;
/// use linopt::lp_solver::{Constraint, ConstraintSense, VariableType};
///
/// # fn main() -> Result<(), linopt::lp_solver::ModelError> {
/// let mut builder = lp_model_builder!();
/// let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0)?;
/// let y = builder.add_variable("y", VariableType::Continuous, 0.0, 10.0)?;
///
/// let _c = constraint!((x + y) == 10.0);
/// let _c = Constraint::eq(x + y, 10.0);
/// let _c = Constraint::new(x + y, ConstraintSense::Equal, 10.0).named("total");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Constraint<Brand> {
    pub(crate) name: Option<String>,
    pub(crate) expression: LinearExpression<Brand>,
    pub(crate) sense: ConstraintSense,
    pub(crate) rhs: f64,
}

impl<Brand> Constraint<Brand> {
    /// Create a new constraint
    pub fn new(
        expression: impl Into<LinearExpression<Brand>>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            name: None,
            expression: expression.into(),
            sense,
            rhs,
        }
    }

    /// Create an equality constraint: expression == rhs
    pub fn eq(expression: impl Into<LinearExpression<Brand>>, rhs: f64) -> Self {
        Self::new(expression, ConstraintSense::Equal, rhs)
    }

    /// Create a less-than-or-equal constraint: expression <= rhs
    pub fn le(expression: impl Into<LinearExpression<Brand>>, rhs: f64) -> Self {
        Self::new(expression, ConstraintSense::LessEqual, rhs)
    }

    /// Create a greater-than-or-equal constraint: expression >= rhs
    pub fn ge(expression: impl Into<LinearExpression<Brand>>, rhs: f64) -> Self {
        Self::new(expression, ConstraintSense::GreaterEqual, rhs)
    }

    /// Attach a name used in reports
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn sense(&self) -> ConstraintSense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Row bounds `(lower, upper)` for the expression's variable part
    pub(crate) fn row_bounds(&self) -> (f64, f64) {
        let rhs = self.rhs - self.expression.constant;
        match self.sense {
            ConstraintSense::LessEqual => (f64::NEG_INFINITY, rhs),
            ConstraintSense::Equal => (rhs, rhs),
            ConstraintSense::GreaterEqual => (rhs, f64::INFINITY),
        }
    }
}
