//! DOE (Design of Experiments) analysis module.
//!
//! This module turns replicate readings into the tables of the guided
//! experiment:
//! - Replicate statistics (mean and sample standard deviation per run)
//! - Main effects over the fractional screening design
//! - Factor ranking, selection of the three varied factors and fixed levels
//! - Pareto (effect contribution) analysis
//! - Regression model and predicted optimum over the full factorial design
//! - Two-factor interaction grids with missing-cell filling
//!
//! ## Quick Start
//!
//! ```rust
//! use turbine_doe::design::Design;
//! use turbine_doe::doe::{analyze_full_factorial, analyze_screening, DEFAULT_FIX_THRESHOLD};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Fractional screening runs, five replicates each (µW)
//! let screening = vec![
//!     vec![10.0, 11.0, 10.5, 10.2, 10.8],
//!     vec![14.0, 14.5, 13.8, 14.2, 14.1],
//!     vec![9.0, 9.4, 9.1, 8.8, 9.2],
//!     vec![16.0, 15.5, 16.2, 15.9, 16.1],
//!     vec![11.0, 11.3, 10.9, 11.2, 11.1],
//!     vec![15.2, 15.0, 15.4, 15.1, 15.3],
//!     vec![10.1, 9.9, 10.3, 10.0, 10.2],
//!     vec![17.0, 17.2, 16.8, 17.1, 16.9],
//! ];
//!
//! let screening = analyze_screening(&screening, DEFAULT_FIX_THRESHOLD)?;
//! println!("Effects: {:?}", screening.effect_values());
//! println!("Varied factors: {:?}", screening.selection.selected());
//!
//! // Full factorial runs over the selected factors
//! let design = Design::full_factorial(&screening.selection.assignment);
//! let full: Vec<Vec<f64>> = (0..8)
//!     .map(|run| vec![10.0 + run as f64; 5])
//!     .collect();
//!
//! let [first, second, _] = screening.selection.selected();
//! let full = analyze_full_factorial(&design, &full, (first, second))?;
//! println!("R²: {:.3}", full.regression.r_squared);
//! println!("Predicted optimum: {:.2}", full.regression.predicted_optimum);
//! # Ok(())
//! # }
//! ```
//!
//! ## Analysis Types
//!
//! ### Main Effects
//!
//! The effect of a factor is the mean response of its high-level runs minus
//! the mean response of its low-level runs. Factors are ranked by absolute
//! effect; equal magnitudes keep index order.
//!
//! ### Factor Fixing
//!
//! The two factors outside the top three are held constant in the full
//! factorial phase: `High` if their effect exceeds the fix threshold,
//! `Low` otherwise.
//!
//! ### Regression
//!
//! `b0` is the grand mean and each coefficient is half the main effect of a
//! varied factor. The predicted optimum is `b0 + Σ|b_i|`.

mod effects;
mod grading;
mod interaction;
mod pareto;
mod ranking;
mod regression;
mod stats;
mod types;

pub use effects::{estimate_effects, level_contrast, main_effects_plot};
pub use grading::{check_answer, DEFAULT_ANSWER_TOLERANCE};
pub use interaction::{
    default_pair, interpolate_missing, resolve_interaction, unmeasured_grid, FALLBACK_CELLS,
};
pub use pareto::pareto_chart;
pub use ranking::{
    assign_levels, fixed_level, rank_factors, select_factors, DEFAULT_FIX_THRESHOLD,
};
pub use regression::{build_regression, coefficient_of_determination};
pub use stats::{mean, sample_std_dev, summarize, ReplicateSummary};
pub use types::{
    AnswerFeedback, AnswerKind, CellFill, EffectEstimate, FactorRanking, FactorSelection,
    FullFactorialAnalysis, InteractionCell, InteractionGrid, MainEffectsPlot, ParetoChart,
    ParetoEntry, RegressionCoefficient, RegressionModel, ScreeningAnalysis,
};

use tracing::debug;

use crate::config::DEFAULT_MAX_READING;
use crate::design::Design;
use crate::error::{Error, Result};
use crate::measurement::MeasurementSet;

/// Summarize the replicates of every run of a design.
///
/// Every run must hold exactly [`REPLICATES`](crate::REPLICATES) readings within
/// `0..=DEFAULT_MAX_READING`, the same rule a session applies while
/// recording.
///
/// # Errors
///
/// * If `response_data` length doesn't match the design runs
/// * If a run holds fewer or more than [`REPLICATES`](crate::REPLICATES) readings
/// * If a reading is negative, non-finite or above the default bound
pub fn summarize_runs(
    design: &Design,
    response_data: &[Vec<f64>],
) -> Result<Vec<ReplicateSummary>> {
    if response_data.len() != design.runs() {
        return Err(Error::invalid_params(format!(
            "Response data length ({}) doesn't match design runs ({})",
            response_data.len(),
            design.runs()
        )));
    }

    response_data
        .iter()
        .map(|reps| MeasurementSet::from_readings(reps, DEFAULT_MAX_READING)?.summary())
        .collect()
}

/// Run the complete screening analysis on the fractional design.
///
/// # Arguments
/// * `response_data` - Outer vec is runs, inner vec is the replicates of
///   each run
/// * `fix_threshold` - Effect above which a fixed factor is held high
///
/// # Errors
/// * If `response_data` doesn't hold eight runs
/// * If a run doesn't hold exactly five valid readings
pub fn analyze_screening(
    response_data: &[Vec<f64>],
    fix_threshold: f64,
) -> Result<ScreeningAnalysis> {
    let design = Design::fractional();
    let run_summaries = summarize_runs(&design, response_data)?;
    let run_means: Vec<f64> = run_summaries.iter().map(|s| s.mean).collect();

    let grand_mean = mean(&run_means)?;
    let main_effects_plot = main_effects_plot(&design, &run_means)?;
    let effects = main_effects_plot.factors.clone();
    let effect_values: Vec<f64> = effects.iter().map(|e| e.effect).collect();

    let selection = select_factors(&effect_values, fix_threshold)?;
    let pareto = pareto_chart(&effect_values)?;

    debug!(grand_mean, "screening analysis complete");

    Ok(ScreeningAnalysis {
        run_summaries,
        grand_mean,
        effects,
        main_effects_plot,
        selection,
        pareto,
    })
}

/// Run the regression and interaction analysis on a full factorial design.
///
/// # Errors
/// * If `design` is not a full factorial plan
/// * If `response_data` doesn't hold one entry per run
/// * If a run doesn't hold exactly five valid readings
/// * If `pair` is not two distinct factor indices
pub fn analyze_full_factorial(
    design: &Design,
    response_data: &[Vec<f64>],
    pair: (usize, usize),
) -> Result<FullFactorialAnalysis> {
    let run_summaries = summarize_runs(design, response_data)?;
    let run_means: Vec<f64> = run_summaries.iter().map(|s| s.mean).collect();

    let regression = build_regression(design, &run_means)?;
    let interaction = resolve_interaction(design, &run_means, pair.0, pair.1)?;

    Ok(FullFactorialAnalysis {
        run_summaries,
        regression,
        interaction,
    })
}
