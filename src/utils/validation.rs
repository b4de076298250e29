//! Parameter validation utilities.
//!
//! Small checks shared by the catalog, the generators and the configuration
//! layer. They all report [`GeneratorError`] so that callers can tell the
//! user which parameter to fix.

use crate::error::GeneratorError;

/// Tolerance used when checking that weights or probabilities sum to one
pub const UNITY_TOLERANCE: f64 = 1e-9;

/// Validate that a probability lies in `[0, 1]`
///
/// # Examples
/// ```
/// use plasmagen::utils::validation::validate_probability;
///
/// assert!(validate_probability("p", 0.1).is_ok());
/// assert!(validate_probability("p", 1.5).is_err());
/// assert!(validate_probability("p", f64::NAN).is_err());
/// ```
pub fn validate_probability(name: &str, value: f64) -> Result<f64, GeneratorError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GeneratorError::InvalidProbability {
            name: name.to_string(),
            value,
        })
    }
}

/// Validate a capacity fraction used to rescale a network
pub fn validate_capacity_fraction(fraction: f64) -> Result<f64, GeneratorError> {
    if (0.0..=1.0).contains(&fraction) {
        Ok(fraction)
    } else {
        Err(GeneratorError::InvalidCapacityFraction(fraction))
    }
}

/// Check whether `sum` equals one within [`UNITY_TOLERANCE`]
pub fn sums_to_unity(sum: f64) -> bool {
    (sum - 1.0).abs() < UNITY_TOLERANCE
}

/// Validate the merchant tier probabilities
pub fn validate_merchant_probabilities(
    p_small: f64,
    p_medium: f64,
    p_large: f64,
) -> Result<(), GeneratorError> {
    validate_probability("p_small_merchants", p_small)?;
    validate_probability("p_medium_merchants", p_medium)?;
    validate_probability("p_large_merchants", p_large)?;
    let sum = p_small + p_medium + p_large;
    if !sums_to_unity(sum) {
        return Err(GeneratorError::MerchantProbabilities { sum });
    }
    Ok(())
}

/// Validate that enough intermediaries were requested to give each nation one
pub fn validate_intermediary_count(
    intermediaries: usize,
    nations: usize,
) -> Result<(), GeneratorError> {
    if intermediaries < nations {
        return Err(GeneratorError::TooFewIntermediaries {
            intermediaries,
            nations,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merchant_probabilities() {
        assert!(validate_merchant_probabilities(0.4, 0.3, 0.3).is_ok());
        assert!(matches!(
            validate_merchant_probabilities(0.5, 0.3, 0.3),
            Err(GeneratorError::MerchantProbabilities { .. })
        ));
        assert!(matches!(
            validate_merchant_probabilities(-0.1, 0.8, 0.3),
            Err(GeneratorError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_intermediary_count() {
        assert!(validate_intermediary_count(3, 3).is_ok());
        assert_eq!(
            validate_intermediary_count(2, 3),
            Err(GeneratorError::TooFewIntermediaries { intermediaries: 2, nations: 3 })
        );
    }

    #[test]
    fn test_capacity_fraction_bounds() {
        assert!(validate_capacity_fraction(0.0).is_ok());
        assert!(validate_capacity_fraction(1.0).is_ok());
        assert!(validate_capacity_fraction(1.01).is_err());
    }
}
