//! Operator overloading for linear expressions
//!
//! [`VariableId`], [`LinearExpression`] and `f64` combine with `+`, `-`, unary `-`,
//! and scaling by `f64` (`*`, `/`). Every combination yields a
//! [`LinearExpression`] carrying the same brand as its operands, so handles of
//! two different builders cannot meet in one expression:
//!
//! ```rust
//! use linopt::lp_model_builder;
//! use linopt::lp_solver::{LinearExpression, VariableType};
//!
//! # fn main() -> Result<(), linopt::lp_solver::ModelError> {
//! let mut builder = lp_model_builder!();
//! let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0)?;
//! let y = builder.add_variable("y", VariableType::Continuous, 0.0, 10.0)?;
//!
//! let expr = 2.0 * x - y / 4.0 + 5.0;
//! assert_eq!(expr.terms.len(), 2);
//! assert_eq!(expr.constant, 5.0);
//!
//! let total: LinearExpression<_> = [x, y].into_iter().sum();
//! assert_eq!(total.terms.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Terms are not merged here; duplicates are summed when the expression is
//! lowered onto a model row.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use super::{LinearExpression, VariableId};

impl<Brand> From<f64> for LinearExpression<Brand> {
    fn from(constant: f64) -> Self {
        Self::new(constant)
    }
}

impl<Brand> Default for LinearExpression<Brand> {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl<Brand, R: Into<LinearExpression<Brand>>> AddAssign<R> for LinearExpression<Brand> {
    fn add_assign(&mut self, rhs: R) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<Brand, R: Into<LinearExpression<Brand>>> SubAssign<R> for LinearExpression<Brand> {
    fn sub_assign(&mut self, rhs: R) {
        *self += -rhs.into();
    }
}

impl<Brand> MulAssign<f64> for LinearExpression<Brand> {
    fn mul_assign(&mut self, factor: f64) {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self.constant *= factor;
    }
}

impl<Brand> Neg for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn neg(mut self) -> Self::Output {
        self *= -1.0;
        self
    }
}

impl<Brand> Neg for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn neg(self) -> Self::Output {
        -LinearExpression::from(self)
    }
}

impl<Brand, T: Into<LinearExpression<Brand>>> Sum<T> for LinearExpression<Brand> {
    fn sum<I: Iterator<Item = T>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, item| {
            acc += item;
            acc
        })
    }
}

/// `+`, `-` and scaling for an expression-like left-hand side
macro_rules! impl_expression_ops {
    ($lhs:ty) => {
        impl<Brand, R: Into<LinearExpression<Brand>>> Add<R> for $lhs {
            type Output = LinearExpression<Brand>;

            fn add(self, rhs: R) -> Self::Output {
                let mut expr = LinearExpression::from(self);
                expr += rhs;
                expr
            }
        }

        impl<Brand, R: Into<LinearExpression<Brand>>> Sub<R> for $lhs {
            type Output = LinearExpression<Brand>;

            fn sub(self, rhs: R) -> Self::Output {
                let mut expr = LinearExpression::from(self);
                expr -= rhs;
                expr
            }
        }

        impl<Brand> Mul<f64> for $lhs {
            type Output = LinearExpression<Brand>;

            fn mul(self, factor: f64) -> Self::Output {
                let mut expr = LinearExpression::from(self);
                expr *= factor;
                expr
            }
        }

        impl<Brand> Div<f64> for $lhs {
            type Output = LinearExpression<Brand>;

            fn div(self, divisor: f64) -> Self::Output {
                self * divisor.recip()
            }
        }

        impl<Brand> Mul<$lhs> for f64 {
            type Output = LinearExpression<Brand>;

            fn mul(self, rhs: $lhs) -> Self::Output {
                rhs * self
            }
        }

        impl<Brand> Add<$lhs> for f64 {
            type Output = LinearExpression<Brand>;

            fn add(self, rhs: $lhs) -> Self::Output {
                rhs + self
            }
        }

        impl<Brand> Sub<$lhs> for f64 {
            type Output = LinearExpression<Brand>;

            fn sub(self, rhs: $lhs) -> Self::Output {
                -rhs + self
            }
        }
    };
}

impl_expression_ops!(LinearExpression<Brand>);
impl_expression_ops!(VariableId<Brand>);
