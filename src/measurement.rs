//! Replicate measurements of a single run.
//!
//! A [`MeasurementSet`] is filled reading by reading and freezes once it
//! holds [`REPLICATES`] values. It can be reset and measured again.

use serde::{Deserialize, Serialize};

use crate::doe::{summarize, ReplicateSummary};
use crate::error::{Error, Result};
use crate::REPLICATES;

/// Check a reading against the plausibility bound.
///
/// # Errors
///
/// Returns `InvalidReading` for negative, non-finite or too large values.
pub fn validate_reading(value: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(Error::InvalidReading { value, max });
    }
    Ok(())
}

/// Replicate power readings (µW) of one design run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    readings: Vec<f64>,
}

impl MeasurementSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            readings: Vec::with_capacity(REPLICATES),
        }
    }

    /// Create a set from existing readings.
    ///
    /// # Errors
    ///
    /// Returns an error if there are more than [`REPLICATES`] readings or a
    /// reading is invalid.
    pub fn from_readings(readings: &[f64], max: f64) -> Result<Self> {
        if readings.len() > REPLICATES {
            return Err(Error::DimensionMismatch {
                expected: format!("at most {REPLICATES} readings"),
                actual: format!("{} readings", readings.len()),
            });
        }
        for &value in readings {
            validate_reading(value, max)?;
        }
        Ok(Self {
            readings: readings.to_vec(),
        })
    }

    /// Append a reading. Returns the number of readings now held.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementComplete` if the set is frozen and
    /// `InvalidReading` if the value is rejected. `run` is only used for
    /// the error report.
    pub fn push(&mut self, run: usize, value: f64, max: f64) -> Result<usize> {
        if self.is_complete() {
            return Err(Error::MeasurementComplete { run });
        }
        validate_reading(value, max)?;
        self.readings.push(value);
        Ok(self.readings.len())
    }

    /// Discard all readings.
    pub fn reset(&mut self) {
        self.readings.clear();
    }

    /// Readings recorded so far.
    #[must_use]
    pub fn readings(&self) -> &[f64] {
        &self.readings
    }

    /// Number of readings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether no reading has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Whether all replicates are recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.readings.len() >= REPLICATES
    }

    /// Mean and sample standard deviation of a complete set.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until all replicates are recorded.
    pub fn summary(&self) -> Result<ReplicateSummary> {
        if !self.is_complete() {
            return Err(Error::InsufficientData {
                needed: REPLICATES,
                actual: self.readings.len(),
            });
        }
        summarize(&self.readings)
    }
}
