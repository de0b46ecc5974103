//! Replicate statistics.
//!
//! Arithmetic mean and sample standard deviation (divisor n − 1) of a set of
//! replicate readings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean and spread of one run's replicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSummary {
    /// Number of readings summarized.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
}

/// Arithmetic mean.
///
/// # Errors
///
/// Returns `InsufficientData` for an empty slice.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            actual: 0,
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation, `sqrt(Σ(x − mean)² / (n − 1))`.
///
/// # Errors
///
/// Returns `InsufficientData` if fewer than two values are given.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            actual: values.len(),
        });
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((ss / (values.len() - 1) as f64).sqrt())
}

/// Mean and sample standard deviation together.
///
/// # Errors
///
/// Returns `InsufficientData` if fewer than two values are given.
pub fn summarize(values: &[f64]) -> Result<ReplicateSummary> {
    Ok(ReplicateSummary {
        count: values.len(),
        mean: mean(values)?,
        std_dev: sample_std_dev(values)?,
    })
}
