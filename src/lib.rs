//! Linear and mixed-integer linear programming, in process
//!
//! `linopt` builds optimization models incrementally by variable name and solves
//! them with a bounded-variable primal simplex, wrapped in branch-and-bound when
//! integer or binary variables are present.
//!
//! # Usage Example
//!
//! ```rust
//! use linopt::lp_solver::{LPModelBuilder, OptimizationStatus, VariableType};
//!
//! # fn main() -> Result<(), linopt::ModelError> {
//! // max x + y  s.t.  0 <= 2x + 5y <= 10,  0 <= 10x + 3y <= 20
//! let mut builder: LPModelBuilder = LPModelBuilder::new();
//! builder.add_variable_with_objective("x", VariableType::Continuous, 0.0, 10.0, 1.0)?;
//! builder.add_variable_with_objective("y", VariableType::Continuous, 0.0, 5.0, 1.0)?;
//! builder
//!     .add_constraint(0.0, 10.0)?
//!     .set_coefficient("x", 2.0)?
//!     .set_coefficient("y", 5.0)?;
//! builder
//!     .add_constraint(0.0, 20.0)?
//!     .set_coefficient("x", 10.0)?
//!     .set_coefficient("y", 3.0)?;
//! builder.set_maximization();
//!
//! let solution = builder.solve();
//! assert_eq!(solution.status(), OptimizationStatus::Optimal);
//! assert!((solution.objective_value() - 65.0 / 22.0).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`lp_solver`]**: model builder, expression API, solver and solutions
//!
//! # Re-exports
//!
//! The types needed for the common name-keyed workflow are re-exported at the
//! crate root.

pub mod lp_solver;

pub use lp_solver::{
    LPModelBuilder, Model, ModelError, OptimizationSense, OptimizationStatus, Solution,
    Solver, SolverConfig, VariableType, solve,
};
