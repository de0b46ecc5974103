//! Factor ranking and fixing.
//!
//! Ranks factors by absolute main effect, selects the three most influential
//! for the full factorial phase and fixes every other factor at the level
//! its effect favours.

use std::cmp::Ordering;

use tracing::info;

use super::types::{FactorRanking, FactorSelection};
use crate::design::{FactorAssignment, FactorRole};
use crate::error::{Error, Result};
use crate::factor::Level;
use crate::{NUM_FACTORS, NUM_FREE};

/// Default dead band around zero for fixing a factor at its high level.
pub const DEFAULT_FIX_THRESHOLD: f64 = 0.05;

/// Rank factors by descending absolute effect.
///
/// The sort is stable: factors with equal magnitude keep index order.
///
/// # Errors
///
/// Returns an error if `effects` is empty or contains a non-finite value.
pub fn rank_factors(effects: &[f64]) -> Result<FactorRanking> {
    if effects.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            actual: 0,
        });
    }
    if let Some(bad) = effects.iter().position(|e| !e.is_finite()) {
        return Err(Error::invalid_params(format!(
            "effect of factor {bad} is not finite"
        )));
    }

    let mut order: Vec<usize> = (0..effects.len()).collect();
    order.sort_by(|&a, &b| {
        effects[b]
            .abs()
            .partial_cmp(&effects[a].abs())
            .unwrap_or(Ordering::Equal)
    });

    let abs_effects = order.iter().map(|&f| effects[f].abs()).collect();

    Ok(FactorRanking { order, abs_effects })
}

/// Level at which a non-selected factor is held.
///
/// Effects above `+threshold` favour the high level; everything else,
/// including the dead band around zero, falls back to the low level.
#[must_use]
pub fn fixed_level(effect: f64, threshold: f64) -> Level {
    if effect > threshold {
        Level::High
    } else {
        Level::Low
    }
}

/// Build the full factorial assignment for a given set of varied factors.
///
/// # Errors
///
/// Returns an error if `effects` does not hold five values or the
/// selection is invalid.
pub fn assign_levels(
    selected: [usize; NUM_FREE],
    effects: &[f64],
    threshold: f64,
) -> Result<FactorAssignment> {
    if effects.len() != NUM_FACTORS {
        return Err(Error::DimensionMismatch {
            expected: format!("{NUM_FACTORS} effects"),
            actual: format!("{} effects", effects.len()),
        });
    }

    let mut roles = [FactorRole::Free; NUM_FACTORS];
    for (factor, role) in roles.iter_mut().enumerate() {
        if !selected.contains(&factor) {
            *role = FactorRole::Fixed(fixed_level(effects[factor], threshold));
        }
    }

    FactorAssignment::new(selected, roles)
}

/// Rank the five factors, select the top three and fix the other two.
///
/// # Errors
///
/// Returns an error if `effects` does not hold five finite values.
pub fn select_factors(effects: &[f64], threshold: f64) -> Result<FactorSelection> {
    if effects.len() != NUM_FACTORS {
        return Err(Error::DimensionMismatch {
            expected: format!("{NUM_FACTORS} effects"),
            actual: format!("{} effects", effects.len()),
        });
    }

    let ranking = rank_factors(effects)?;
    let selected = [ranking.order[0], ranking.order[1], ranking.order[2]];
    let assignment = assign_levels(selected, effects, threshold)?;

    info!(
        ?selected,
        roles = ?assignment.roles(),
        "selected factors for full factorial phase"
    );

    Ok(FactorSelection {
        ranking,
        assignment,
    })
}
