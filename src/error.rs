//! Error types for the turbine-doe engine.
//!
//! This module provides error handling using the `thiserror` crate, with
//! specific variants for missing replicate data, degenerate designs,
//! parameter validation, session state, configuration and records.

use thiserror::Error;

use crate::factor::Level;

/// The main error type for the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Data Errors ============
    /// Fewer values than a computation needs.
    #[error("insufficient data: need at least {needed} values, got {actual}")]
    InsufficientData {
        /// Minimum number of values required.
        needed: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A level partition is empty when an effect or coefficient is requested.
    #[error("degenerate design: factor {factor} has no runs at the {level} level")]
    DegenerateDesign {
        /// Factor index (0-based).
        factor: usize,
        /// The level with no runs.
        level: Level,
    },

    /// A reading is negative, non-finite or above the plausibility bound.
    #[error("invalid reading {value}: must be finite and within 0..={max}")]
    InvalidReading {
        /// The rejected reading.
        value: f64,
        /// Upper plausibility bound.
        max: f64,
    },

    /// All replicates of a run are already recorded.
    #[error("run {run} already holds all replicate readings")]
    MeasurementComplete {
        /// Run index (0-based).
        run: usize,
    },

    // ============ Parameter Validation Errors ============
    /// Invalid parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// Index is out of bounds.
    #[error("index {index} is out of bounds for size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The valid size.
        size: usize,
    },

    /// Dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    // ============ Workflow Errors ============
    /// The session is not in a state that allows the operation.
    #[error("invalid session state: {message}")]
    InvalidState {
        /// Description of the conflict.
        message: String,
    },

    // ============ Boundary Errors ============
    /// Configuration could not be parsed or is out of range.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A persisted record could not be parsed or is inconsistent.
    #[error("record error: {message}")]
    Record {
        /// Description of the problem.
        message: String,
    },
}

/// A specialized `Result` type for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `InvalidState` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new `Record` error.
    #[must_use]
    pub fn record(message: impl Into<String>) -> Self {
        Self::Record {
            message: message.into(),
        }
    }

    /// Check a factor index against the five-factor catalogue.
    pub(crate) fn check_factor(index: usize) -> Result<()> {
        if index >= crate::NUM_FACTORS {
            return Err(Self::IndexOutOfBounds {
                index,
                size: crate::NUM_FACTORS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientData {
            needed: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("at least 2"));
        assert!(err.to_string().contains("got 1"));

        let err = Error::DegenerateDesign {
            factor: 3,
            level: Level::High,
        };
        assert!(err.to_string().contains("factor 3"));
        assert!(err.to_string().contains("high"));

        let err = Error::InvalidReading {
            value: -1.5,
            max: 1000.0,
        };
        assert!(err.to_string().contains("-1.5"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::MeasurementComplete { run: 2 };
        let err2 = Error::MeasurementComplete { run: 2 };
        let err3 = Error::MeasurementComplete { run: 5 };

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_check_factor() {
        assert!(Error::check_factor(4).is_ok());
        assert_eq!(
            Error::check_factor(5),
            Err(Error::IndexOutOfBounds { index: 5, size: 5 })
        );
    }
}
