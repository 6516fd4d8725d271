//! Validation errors and shared range checks.

use thiserror::Error;

/// Result of validating a configuration.
pub type ValidationResult<T> = Result<T, ConfigError>;

/// A rejected configuration option.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{upper} ({upper_value}) must be higher than {lower} ({lower_value})")]
    ThresholdOrder {
        lower: String,
        lower_value: f64,
        upper: String,
        upper_value: f64,
    },

    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum { field: String, min: i64, value: i64 },

    #[error("{field} must be positive")]
    NotPositive { field: String },

    #[error("missing required settings: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

/// Check that a percentage lies in `[0, 100]`.
pub fn check_percent(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 100.0,
            value,
        });
    }
    Ok(())
}

/// Check that `upper` is strictly above `lower`.
pub fn check_ascending(
    lower: &str,
    lower_value: f64,
    upper: &str,
    upper_value: f64,
) -> ValidationResult<()> {
    if lower_value >= upper_value {
        return Err(ConfigError::ThresholdOrder {
            lower: lower.to_string(),
            lower_value,
            upper: upper.to_string(),
            upper_value,
        });
    }
    Ok(())
}

/// Check an integer against an inclusive lower bound and convert it.
pub fn check_at_least(field: &str, value: i64, min: i64) -> ValidationResult<u64> {
    if value < min {
        return Err(ConfigError::BelowMinimum {
            field: field.to_string(),
            min,
            value,
        });
    }
    Ok(value as u64)
}

/// Check that an integer is strictly positive and convert it.
pub fn check_positive(field: &str, value: i64) -> ValidationResult<u64> {
    if value <= 0 {
        return Err(ConfigError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(value as u64)
}

/// Check that a positive integer does not exceed `max` and convert it.
pub fn check_positive_at_most(field: &str, value: i64, max: u64) -> ValidationResult<u64> {
    let value = check_positive(field, value)?;
    if value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            min: 1.0,
            max: max as f64,
            value: value as f64,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_bounds_inclusive() {
        assert!(check_percent("threshold", 0.0).is_ok());
        assert!(check_percent("threshold", 100.0).is_ok());
        assert!(check_percent("threshold", 100.5).is_err());
        assert!(check_percent("threshold", -1.0).is_err());
        assert!(check_percent("threshold", f64::NAN).is_err());
    }

    #[test]
    fn ascending_rejects_equal_values() {
        let err = check_ascending("threshold", 90.0, "critical_threshold", 90.0).unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOrder { .. }));
        assert!(err.to_string().contains("critical_threshold"));
    }

    #[test]
    fn positive_and_minimum_checks() {
        assert_eq!(check_positive("timeout", 5).unwrap(), 5);
        assert!(check_positive("timeout", 0).is_err());
        assert_eq!(check_at_least("interval", 1, 1).unwrap(), 1);
        assert!(check_at_least("interval", 0, 1).is_err());
        assert_eq!(check_positive_at_most("timeout", 3600, 3600).unwrap(), 3600);
        assert!(matches!(
            check_positive_at_most("timeout", 3601, 3600),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            check_positive_at_most("timeout", 0, 3600),
            Err(ConfigError::NotPositive { .. })
        ));
    }

    #[test]
    fn missing_required_lists_fields() {
        let err = ConfigError::MissingRequired(vec!["smtp_server".into(), "password".into()]);
        assert_eq!(
            err.to_string(),
            "missing required settings: smtp_server, password"
        );
    }
}
