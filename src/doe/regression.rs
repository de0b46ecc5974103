//! Regression model for the full factorial phase.
//!
//! Fits `y = b0 + b1·x1 + b2·x2 + b3·x3` over the coded levels of the three
//! varied factors. For an orthogonal two-level design the least-squares
//! coefficients reduce to half the main effects, and `b0` to the grand mean.
//!
//! The predicted optimum is `b0 + Σ|b_i|`: each factor is implicitly placed
//! at whichever level adds its coefficient, so the prediction is always the
//! model's best case rather than the mean of a particular measured run.

use tracing::debug;

use super::effects::{check_run_means, level_contrast};
use super::stats::mean;
use super::types::{RegressionCoefficient, RegressionModel};
use crate::design::{Design, DesignKind};
use crate::error::{Error, Result};
use crate::factor::Level;

/// `1 − SSE/SST` clamped to [0, 1]; zero when SST vanishes.
#[must_use]
pub fn coefficient_of_determination(sse: f64, sst: f64) -> f64 {
    if sst.abs() < f64::EPSILON {
        return 0.0;
    }
    (1.0 - sse / sst).clamp(0.0, 1.0)
}

/// Fit the regression model to a full factorial design and its run means.
///
/// # Errors
///
/// Returns an error if the design is not a full factorial plan, if the
/// number of means does not match the runs, or if a varied factor has an
/// empty level partition.
pub fn build_regression(design: &Design, run_means: &[f64]) -> Result<RegressionModel> {
    if design.kind() != DesignKind::FullFactorial {
        return Err(Error::invalid_params(
            "regression requires a full factorial design",
        ));
    }
    check_run_means(design, run_means)?;

    let intercept = mean(run_means)?;

    let coefficients = design
        .free_factors()
        .iter()
        .map(|&factor| {
            let contrast = level_contrast(design, run_means, factor)?;
            let value = contrast.effect / 2.0;
            Ok(RegressionCoefficient {
                factor,
                value,
                optimal_level: if value > 0.0 { Level::High } else { Level::Low },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sse = 0.0;
    let mut sst = 0.0;
    for (run, &actual) in run_means.iter().enumerate() {
        let predicted = intercept
            + coefficients
                .iter()
                .map(|c| c.value * f64::from(design.coded(run, c.factor)))
                .sum::<f64>();
        sse += (actual - predicted).powi(2);
        sst += (actual - intercept).powi(2);
    }

    let r_squared = coefficient_of_determination(sse, sst);
    let predicted_optimum = intercept + coefficients.iter().map(|c| c.value.abs()).sum::<f64>();

    debug!(intercept, r_squared, predicted_optimum, "fitted regression model");

    Ok(RegressionModel {
        intercept,
        coefficients,
        sse,
        sst,
        r_squared,
        predicted_optimum,
    })
}
