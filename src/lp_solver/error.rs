use thiserror::Error;

/// Contract violations raised while building a model.
///
/// A builder call that returns an error leaves the model untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// `lower > upper`, a NaN bound, `lower == +inf` or `upper == -inf`
    #[error("invalid bounds [{lower}, {upper}] for {target}")]
    InvalidBounds {
        target: String,
        lower: f64,
        upper: f64,
    },

    /// A variable name that was never declared with `add_variable`
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    /// A constraint id that does not belong to the model
    #[error("unknown constraint #{0}")]
    UnknownConstraint(usize),

    /// NaN or infinite coefficient found while validating a model
    #[error("non-finite value {value} in {target}")]
    NonFinite { target: String, value: f64 },
}

/// Check a `[lower, upper]` pair, using `target` to describe the owner in the error.
pub(crate) fn check_bounds(
    lower: f64,
    upper: f64,
    target: impl FnOnce() -> String,
) -> Result<(), ModelError> {
    let valid = !lower.is_nan()
        && !upper.is_nan()
        && lower <= upper
        && lower != f64::INFINITY
        && upper != f64::NEG_INFINITY;

    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidBounds {
            target: target(),
            lower,
            upper,
        })
    }
}

pub(crate) fn check_finite(value: f64, target: impl FnOnce() -> String) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinite {
            target: target(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        let target = || "variable `x`".to_string();

        assert!(check_bounds(0.0, 1.0, target).is_ok());
        assert!(check_bounds(1.0, 1.0, target).is_ok());
        assert!(check_bounds(f64::NEG_INFINITY, f64::INFINITY, target).is_ok());

        assert!(check_bounds(2.0, 1.0, target).is_err());
        assert!(check_bounds(f64::NAN, 1.0, target).is_err());
        assert!(check_bounds(f64::INFINITY, f64::INFINITY, target).is_err());
        assert!(check_bounds(f64::NEG_INFINITY, f64::NEG_INFINITY, target).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = check_bounds(5.0, 1.0, || "constraint #3".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "invalid bounds [5, 1] for constraint #3");

        let err = ModelError::UnknownVariable("z".to_string());
        assert_eq!(err.to_string(), "unknown variable `z`");
    }
}
