//! DOE analysis types.
//!
//! Output tables handed to presentation and export layers. Everything here
//! is plain data and serializes to JSON.

use serde::{Deserialize, Serialize};

use super::stats::ReplicateSummary;
use crate::design::{FactorAssignment, FactorRole};
use crate::factor::Level;

/// Main effect of a single factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEstimate {
    /// Factor index (0-based column in the design).
    pub factor: usize,
    /// Mean response over the low-level runs.
    pub mean_low: f64,
    /// Mean response over the high-level runs.
    pub mean_high: f64,
    /// `mean_high - mean_low`.
    pub effect: f64,
}

/// Data for a main-effects plot of the screening phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainEffectsPlot {
    /// Mean of all run means.
    pub overall_mean: f64,
    /// Lower bound of the display range (10% margin below the lowest level mean).
    pub min_response: f64,
    /// Upper bound of the display range (10% margin above the highest level mean).
    pub max_response: f64,
    /// Level means and effect for each factor, in factor order.
    pub factors: Vec<EffectEstimate>,
}

/// Factors ordered by descending absolute effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRanking {
    /// Factor indices, most influential first. Ties keep index order.
    pub order: Vec<usize>,
    /// Absolute effect of each entry of `order`.
    pub abs_effects: Vec<f64>,
}

impl FactorRanking {
    /// The `n` most influential factors.
    #[must_use]
    pub fn top(&self, n: usize) -> &[usize] {
        &self.order[..n.min(self.order.len())]
    }

    /// 1-based rank of a factor, if present.
    #[must_use]
    pub fn rank_of(&self, factor: usize) -> Option<usize> {
        self.order.iter().position(|&f| f == factor).map(|p| p + 1)
    }
}

/// Result of ranking and fixing: the ranking plus the full factorial assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSelection {
    /// Ranking the selection was taken from.
    pub ranking: FactorRanking,
    /// Varied factors and fixed levels.
    pub assignment: FactorAssignment,
}

impl FactorSelection {
    /// The three varied factors, most influential first.
    #[must_use]
    pub fn selected(&self) -> [usize; crate::NUM_FREE] {
        self.assignment.selected()
    }

    /// Role of a factor during the full factorial phase.
    #[must_use]
    pub fn role(&self, factor: usize) -> FactorRole {
        self.assignment.role(factor)
    }
}

/// A regression coefficient for one varied factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionCoefficient {
    /// Factor index.
    pub factor: usize,
    /// Half the main effect over the full factorial means.
    pub value: f64,
    /// Level that adds `|value|` to the prediction (`High` if `value > 0`).
    pub optimal_level: Level,
}

/// Linear model over the coded levels of the three varied factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    /// Constant term: mean of the eight run means.
    pub intercept: f64,
    /// One coefficient per varied factor, in selection order.
    pub coefficients: Vec<RegressionCoefficient>,
    /// Residual sum of squares.
    pub sse: f64,
    /// Total sum of squares around the grand mean.
    pub sst: f64,
    /// Coefficient of determination, clamped to [0, 1].
    pub r_squared: f64,
    /// `intercept + Σ|b_i|`: the best-case response of the model.
    pub predicted_optimum: f64,
}

impl RegressionModel {
    /// Model prediction for coded levels given in selection order.
    #[must_use]
    pub fn predict(&self, levels: &[Level]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(levels.iter())
                .map(|(c, level)| c.value * f64::from(level.coded()))
                .sum::<f64>()
    }
}

/// One bar of a Pareto chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Factor index.
    pub factor: usize,
    /// Signed effect.
    pub effect: f64,
    /// Absolute effect.
    pub abs_effect: f64,
    /// Share of the total absolute effect, in percent.
    pub percentage: f64,
    /// Running sum of `percentage`.
    pub cumulative: f64,
}

/// Effect-contribution analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoChart {
    /// Σ|effect| over all factors.
    pub total_abs_effect: f64,
    /// Entries in ranked order.
    pub entries: Vec<ParetoEntry>,
}

/// One cell of a 2×2 interaction grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionCell {
    /// Level of the first factor.
    pub first: Level,
    /// Level of the second factor.
    pub second: Level,
    /// Mean response (measured or filled in).
    pub value: f64,
    /// `false` if the value was interpolated or is a fallback.
    pub measured: bool,
}

/// How the missing cells of an interaction grid were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellFill {
    /// All four cells measured.
    Complete,
    /// No cell measured; fixed fallback values.
    Fallback,
    /// One cell missing; filled assuming additivity.
    Parallelogram,
    /// Two diagonal cells present; the difference split evenly.
    Diagonal,
    /// One row present; the other row extrapolated by ±10%.
    RowExtrapolation,
    /// One column present; the other column extrapolated by ±10%.
    ColumnExtrapolation,
    /// One cell present; the rest scaled by fixed multipliers.
    SinglePoint,
}

/// The 2×2 response grid for a factor pair.
///
/// Cells are ordered (low, low), (high, low), (low, high), (high, high),
/// the first level belonging to the first factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionGrid {
    /// The two factor indices.
    pub factors: (usize, usize),
    /// Whether both factors are varied by the full factorial plan.
    pub both_free: bool,
    /// The four cells.
    pub cells: [InteractionCell; 4],
    /// How missing cells were filled.
    pub fill: CellFill,
}

impl InteractionGrid {
    /// Number of cells backed by measurements.
    #[must_use]
    pub fn measured_count(&self) -> usize {
        self.cells.iter().filter(|c| c.measured).count()
    }

    /// Cell at a level combination.
    #[must_use]
    pub fn cell(&self, first: Level, second: Level) -> &InteractionCell {
        &self.cells[first.index() + 2 * second.index()]
    }
}

/// What a student-entered answer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// A run mean.
    Mean,
    /// A run standard deviation.
    StdDev,
    /// A factor main effect.
    Effect,
}

/// Verdict on a student-entered answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    /// What was answered.
    pub kind: AnswerKind,
    /// The value entered.
    pub submitted: f64,
    /// The computed value.
    pub expected: f64,
    /// `|submitted - expected|`.
    pub deviation: f64,
    /// Whether the deviation is below the tolerance.
    pub correct: bool,
}

/// Complete analysis of the fractional screening phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningAnalysis {
    /// Mean and standard deviation of each run.
    pub run_summaries: Vec<ReplicateSummary>,
    /// Mean of the run means.
    pub grand_mean: f64,
    /// Main effect of every factor, in factor order.
    pub effects: Vec<EffectEstimate>,
    /// Main-effects plot data.
    pub main_effects_plot: MainEffectsPlot,
    /// Ranking, varied factors and fixed levels.
    pub selection: FactorSelection,
    /// Effect contributions.
    pub pareto: ParetoChart,
}

impl ScreeningAnalysis {
    /// Signed effects in factor order.
    #[must_use]
    pub fn effect_values(&self) -> Vec<f64> {
        self.effects.iter().map(|e| e.effect).collect()
    }
}

/// Complete analysis of the full factorial phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullFactorialAnalysis {
    /// Mean and standard deviation of each run.
    pub run_summaries: Vec<ReplicateSummary>,
    /// Fitted regression model.
    pub regression: RegressionModel,
    /// Interaction grid of the requested pair.
    pub interaction: InteractionGrid,
}
