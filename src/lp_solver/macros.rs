//! Macros for building branded models and expression constraints

/// Create a new LP model builder with a unique brand
///
/// Each invocation defines a fresh zero-sized brand type, so the
/// [`VariableId`](crate::lp_solver::VariableId)s of one builder cannot be used
/// in expressions or constraints of another.
///
/// # Examples
///
/// ```rust
/// use linopt::lp_model_builder;
/// use linopt::lp_solver::VariableType;
///
/// # fn main() -> Result<(), linopt::lp_solver::ModelError> {
/// // Anonymous brand
/// let mut builder = lp_model_builder!();
/// let _x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0)?;
///
/// // Named brands show up in type errors
/// let mut production = lp_model_builder!(Production);
/// let mut scheduling = lp_model_builder!(Scheduling);
///
/// let _units = production.add_variable("units", VariableType::Integer, 0.0, 100.0)?;
/// let _hours = scheduling.add_variable("hours", VariableType::Continuous, 0.0, 24.0)?;
///
/// // Rejected at compile time, the brands differ:
/// // scheduling.add_linear_constraint(constraint!((_units) <= 50.0));
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! lp_model_builder {
    ($brand:ident) => {{
        struct $brand;
        $crate::lp_solver::LPModelBuilder::<$brand>::new()
    }};

    // `UniqueBrand` lives in the block, so every expansion gets its own type
    () => {{
        struct UniqueBrand;
        $crate::lp_solver::LPModelBuilder::<UniqueBrand>::new()
    }};
}

/// Create a [`Constraint`](crate::lp_solver::Constraint) using comparison syntax
///
/// The left-hand side must be in parentheses. An optional leading string names
/// the row in reports.
///
/// # Examples
///
/// ```rust
/// use linopt::constraint;
/// use linopt::lp_model_builder;
/// use linopt::lp_solver::{ConstraintSense, VariableType};
///
/// # fn main() -> Result<(), linopt::lp_solver::ModelError> {
/// let mut builder = lp_model_builder!(Blend);
/// let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0)?;
/// let y = builder.add_variable("y", VariableType::Continuous, 0.0, 10.0)?;
///
/// let total = constraint!((x + y) == 10.0);
/// assert_eq!(total.sense(), ConstraintSense::Equal);
///
/// builder.add_linear_constraint(total)?;
/// builder.add_linear_constraint(constraint!((2.0 * x) <= 15))?;
/// builder.add_linear_constraint(constraint!("ratio", (x - 3.0 * y) >= 0.0))?;
/// assert_eq!(builder.model().num_constraints(), 3);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! constraint {
    (($lhs:expr) == $rhs:expr) => {
        $crate::constraint!(@sense Equal, $lhs, $rhs)
    };
    (($lhs:expr) <= $rhs:expr) => {
        $crate::constraint!(@sense LessEqual, $lhs, $rhs)
    };
    (($lhs:expr) >= $rhs:expr) => {
        $crate::constraint!(@sense GreaterEqual, $lhs, $rhs)
    };
    (@sense $sense:ident, $lhs:expr, $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $lhs,
            $crate::lp_solver::ConstraintSense::$sense,
            $rhs as f64,
        )
    };
    ($name:expr, ($lhs:expr) $op:tt $rhs:expr) => {
        $crate::constraint!(($lhs) $op $rhs).named($name)
    };
}
