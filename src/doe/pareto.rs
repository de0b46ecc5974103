//! Pareto (effect contribution) analysis.
//!
//! Each factor's share of the total absolute effect, in ranked order, with
//! a running cumulative percentage.

use super::ranking::rank_factors;
use super::types::{ParetoChart, ParetoEntry};
use crate::error::Result;

/// Compute the Pareto chart for a set of effects.
///
/// When every effect is zero all percentages are defined as 0.
///
/// # Errors
///
/// Returns an error if `effects` is empty or contains a non-finite value.
pub fn pareto_chart(effects: &[f64]) -> Result<ParetoChart> {
    let ranking = rank_factors(effects)?;
    let total_abs_effect: f64 = ranking.abs_effects.iter().sum();

    let mut cumulative = 0.0;
    let entries = ranking
        .order
        .iter()
        .zip(ranking.abs_effects.iter())
        .enumerate()
        .map(|(pos, (&factor, &abs_effect))| {
            let percentage = if total_abs_effect > 0.0 {
                abs_effect / total_abs_effect * 100.0
            } else {
                0.0
            };
            cumulative += percentage;
            ParetoEntry {
                rank: pos + 1,
                factor,
                effect: effects[factor],
                abs_effect,
                percentage,
                cumulative,
            }
        })
        .collect();

    Ok(ParetoChart {
        total_abs_effect,
        entries,
    })
}
