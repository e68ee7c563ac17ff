//! Shared threshold validation helpers.
//!
//! Provides reusable range-checking functions used by the configuration
//! and catalog modules.

use crate::error::CoreError;

/// Validate that a value falls within `[0.0, 1.0]`.
///
/// Returns a `CoreError::ConfigurationInvalid` naming the field if out of range.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::ConfigurationInvalid(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a value is finite and `>= 0.0`.
pub fn validate_non_negative(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::ConfigurationInvalid(format!(
            "{name} must be a finite value >= 0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that `low < high` and both are finite.
pub fn validate_ordered(low: f64, high: f64, name: &str) -> Result<(), CoreError> {
    if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(CoreError::ConfigurationInvalid(format!(
            "{name} must satisfy low < high, got {low}..{high}"
        )));
    }
    Ok(())
}
