//! Main effects calculation.
//!
//! The main effect of a factor is the mean response over its high-level runs
//! minus the mean response over its low-level runs.

use tracing::debug;

use super::types::{EffectEstimate, MainEffectsPlot};
use crate::design::Design;
use crate::error::{Error, Result};
use crate::factor::Level;

/// Share of the response span added above and below a main-effects plot.
const PLOT_MARGIN: f64 = 0.1;

/// Check that one mean was supplied per run.
pub(crate) fn check_run_means(design: &Design, run_means: &[f64]) -> Result<()> {
    if run_means.len() != design.runs() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} run means", design.runs()),
            actual: format!("{} run means", run_means.len()),
        });
    }
    Ok(())
}

/// Low/high partition means and their difference for one factor.
///
/// # Errors
///
/// Returns `DegenerateDesign` if the factor has no run at one of its levels
/// (e.g. a fixed factor of a full factorial plan), and `DimensionMismatch`
/// if `run_means` does not hold one value per run.
pub fn level_contrast(design: &Design, run_means: &[f64], factor: usize) -> Result<EffectEstimate> {
    check_run_means(design, run_means)?;
    if factor >= design.factors() {
        return Err(Error::IndexOutOfBounds {
            index: factor,
            size: design.factors(),
        });
    }

    let mut sums = [0.0_f64; 2];
    let mut counts = [0_usize; 2];

    for (run, &value) in run_means.iter().enumerate() {
        let level = design.level(run, factor);
        sums[level.index()] += value;
        counts[level.index()] += 1;
    }

    for level in Level::ALL {
        if counts[level.index()] == 0 {
            return Err(Error::DegenerateDesign { factor, level });
        }
    }

    let mean_low = sums[0] / counts[0] as f64;
    let mean_high = sums[1] / counts[1] as f64;

    Ok(EffectEstimate {
        factor,
        mean_low,
        mean_high,
        effect: mean_high - mean_low,
    })
}

/// Main effects of every factor of a design.
///
/// # Errors
///
/// Propagates [`level_contrast`] errors.
pub fn estimate_effects(design: &Design, run_means: &[f64]) -> Result<Vec<EffectEstimate>> {
    let effects = (0..design.factors())
        .map(|factor| level_contrast(design, run_means, factor))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        effects = ?effects.iter().map(|e| e.effect).collect::<Vec<_>>(),
        "estimated main effects"
    );

    Ok(effects)
}

/// Level means per factor plus a padded display range.
///
/// # Errors
///
/// Propagates [`level_contrast`] errors.
pub fn main_effects_plot(design: &Design, run_means: &[f64]) -> Result<MainEffectsPlot> {
    let factors = estimate_effects(design, run_means)?;
    let overall_mean = super::stats::mean(run_means)?;

    let mut min_response = run_means[0];
    let mut max_response = run_means[0];
    for estimate in &factors {
        min_response = min_response.min(estimate.mean_low).min(estimate.mean_high);
        max_response = max_response.max(estimate.mean_low).max(estimate.mean_high);
    }

    let span = max_response - min_response;

    Ok(MainEffectsPlot {
        overall_mean,
        min_response: min_response - span * PLOT_MARGIN,
        max_response: max_response + span * PLOT_MARGIN,
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{FactorAssignment, FactorRole};

    /// Means that are 10 on the high runs of `factor` and 6 elsewhere.
    fn split_means(design: &Design, factor: usize) -> Vec<f64> {
        (0..8)
            .map(|run| match design.level(run, factor) {
                Level::High => 10.0,
                Level::Low => 6.0,
            })
            .collect()
    }

    #[test]
    fn test_effect_high_minus_low() {
        let design = Design::fractional();

        for factor in 0..5 {
            let means = split_means(&design, factor);
            let effects = estimate_effects(&design, &means).unwrap();

            assert!((effects[factor].effect - 4.0).abs() < 1e-12);
            assert!((effects[factor].mean_high - 10.0).abs() < 1e-12);
            assert!((effects[factor].mean_low - 6.0).abs() < 1e-12);

            // Orthogonality: every other factor sees no effect
            for (other, e) in effects.iter().enumerate() {
                if other != factor {
                    assert!(e.effect.abs() < 1e-12, "factor {other} picked up {}", e.effect);
                }
            }
        }
    }

    #[test]
    fn test_effects_additive_response() {
        let design = Design::fractional();
        // y = 20 + 3·A − 1.5·C + 0.5·E
        let means: Vec<f64> = (0..8)
            .map(|run| {
                20.0 + 3.0 * f64::from(design.coded(run, 0))
                    - 1.5 * f64::from(design.coded(run, 2))
                    + 0.5 * f64::from(design.coded(run, 4))
            })
            .collect();

        let effects = estimate_effects(&design, &means).unwrap();
        let values: Vec<f64> = effects.iter().map(|e| e.effect).collect();
        let expected = [6.0, 0.0, -3.0, 0.0, 1.0];

        for (v, e) in values.iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_wrong_number_of_means() {
        let design = Design::fractional();
        let result = estimate_effects(&design, &[1.0, 2.0]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_fixed_factor_is_degenerate() {
        let assignment = FactorAssignment::new(
            [0, 1, 2],
            [
                FactorRole::Free,
                FactorRole::Free,
                FactorRole::Free,
                FactorRole::Fixed(Level::High),
                FactorRole::Fixed(Level::Low),
            ],
        )
        .unwrap();
        let design = Design::full_factorial(&assignment);
        let means = [1.0; 8];

        assert_eq!(
            level_contrast(&design, &means, 3),
            Err(Error::DegenerateDesign {
                factor: 3,
                level: Level::Low
            })
        );
        assert_eq!(
            level_contrast(&design, &means, 4),
            Err(Error::DegenerateDesign {
                factor: 4,
                level: Level::High
            })
        );
        assert!(level_contrast(&design, &means, 0).is_ok());
    }

    #[test]
    fn test_main_effects_plot_range() {
        let design = Design::fractional();
        let means = split_means(&design, 1);
        let plot = main_effects_plot(&design, &means).unwrap();

        assert!((plot.overall_mean - 8.0).abs() < 1e-12);
        // Level means span 6..10, widened by 10% of 4 on each side
        assert!((plot.min_response - 5.6).abs() < 1e-12);
        assert!((plot.max_response - 10.4).abs() < 1e-12);
        assert_eq!(plot.factors.len(), 5);
    }
}
