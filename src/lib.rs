//! # Turbine DOE
//!
//! Analysis engine for a guided wind-turbine power experiment.
//!
//! ## Overview
//!
//! A student varies five two-level factors of a small turbine apparatus
//! (pitch, rotor size, distance, wind strength, blade count) and records
//! five replicate power readings per run. The experiment has two phases:
//!
//! 1. **Screening**: a fixed 8-run resolution III fractional design over all
//!    five factors (generators D = AB, E = AC). Main effects are estimated,
//!    the factors are ranked by absolute effect, the top three are kept and
//!    the other two are fixed at their better level.
//! 2. **Full factorial**: all 8 combinations of the three selected factors.
//!    A regression model gives coefficients, R² and a predicted optimum, and
//!    interaction grids show two-factor behaviour.
//!
//! This crate provides:
//! - The design tables and an orthogonality check
//! - Replicate statistics, main effects, ranking, Pareto and regression
//! - Interaction grids with the missing-cell filling used by displays
//! - An [`ExperimentSession`] tracking readings across both phases
//! - A JSON [`ExperimentRecord`] for the storage layer
//!
//! ## Quick Start
//!
//! ```rust
//! use turbine_doe::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = ExperimentSession::new(EngineConfig::default())?;
//!
//! // Screening: eight runs, five replicates each
//! for run in 0..NUM_RUNS {
//!     for rep in 0..REPLICATES {
//!         session.record_reading(Stage::Screening, run, 10.0 + run as f64 + rep as f64 * 0.1)?;
//!     }
//! }
//!
//! let selection = session.select_factors()?;
//! println!("Varied factors: {:?}", selection.selected());
//!
//! // Full factorial: eight more runs over the selected factors
//! for run in 0..NUM_RUNS {
//!     for _ in 0..REPLICATES {
//!         session.record_reading(Stage::FullFactorial, run, 12.0 + run as f64)?;
//!     }
//! }
//!
//! let model = session.regression()?;
//! assert!(model.r_squared > 0.99);
//! println!("Predicted optimum: {:.2} µW", model.predicted_optimum);
//! # Ok(())
//! # }
//! ```
//!
//! ## Notation
//!
//! Levels are coded −1 (low) and +1 (high). The effect of a factor is the
//! mean response of its high runs minus that of its low runs; a regression
//! coefficient is half the effect.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod design;
pub mod doe;
pub mod error;
pub mod factor;
pub mod measurement;
pub mod record;
pub mod session;

/// Number of experimental factors.
pub const NUM_FACTORS: usize = 5;

/// Number of runs of either design.
pub const NUM_RUNS: usize = 8;

/// Replicate readings per run.
pub const REPLICATES: usize = 5;

/// Factors varied in the full factorial phase.
pub const NUM_FREE: usize = 3;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::design::{
        verify_orthogonality, Design, DesignKind, FactorAssignment, FactorRole,
        OrthogonalityReport,
    };
    pub use crate::doe::{
        analyze_full_factorial, analyze_screening, AnswerFeedback, AnswerKind, CellFill,
        EffectEstimate, FactorRanking, FactorSelection, InteractionGrid, MainEffectsPlot,
        ParetoChart, RegressionModel, ReplicateSummary,
    };
    pub use crate::error::{Error, Result};
    pub use crate::factor::{Factor, FactorCatalogue, FactorSpec, Level};
    pub use crate::measurement::MeasurementSet;
    pub use crate::record::ExperimentRecord;
    pub use crate::session::{ExperimentReport, ExperimentSession, Stage, StageProgress};
    pub use crate::{NUM_FACTORS, NUM_FREE, NUM_RUNS, REPLICATES};
}

// Re-export commonly used items at crate root
pub use config::EngineConfig;
pub use design::Design;
pub use error::{Error, Result};
pub use factor::Level;
pub use record::ExperimentRecord;
pub use session::{ExperimentSession, Stage};
