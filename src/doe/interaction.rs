//! Two-factor interaction grids.
//!
//! Extracts the 2×2 grid of mean responses for a factor pair from the full
//! factorial runs and fills cells that no run covers.
//!
//! ## Cell order
//!
//! Cell `i` holds first factor level `i & 1` and second factor level
//! `i >> 1`: (low, low), (high, low), (low, high), (high, high).
//!
//! ## Filling missing cells
//!
//! The fill rules are display heuristics with fixed constants, not
//! statistical estimates. Filled cells are always marked unmeasured and
//! measured cells are never overwritten.

use tracing::{debug, warn};

use super::effects::check_run_means;
use super::ranking::rank_factors;
use super::types::{CellFill, InteractionCell, InteractionGrid};
use crate::design::Design;
use crate::error::{Error, Result};
use crate::factor::Level;
use crate::NUM_FACTORS;

/// Cell values used when nothing was measured.
pub const FALLBACK_CELLS: [f64; 4] = [0.5, 0.7, 0.6, 0.9];

/// Multipliers applied to the only measured cell, indexed by target cell.
const SINGLE_POINT_FACTORS: [f64; 4] = [0.8, 1.1, 1.1, 1.2];

const LOWER: f64 = 0.9;
const HIGHER: f64 = 1.1;

/// The pair with the two largest absolute effects, or (0, 1) without effects.
///
/// # Errors
///
/// Returns an error if the effects contain a non-finite value.
pub fn default_pair(effects: Option<&[f64]>) -> Result<(usize, usize)> {
    match effects {
        Some(effects) if effects.len() >= 2 => {
            let ranking = rank_factors(effects)?;
            Ok((ranking.order[0], ranking.order[1]))
        }
        _ => Ok((0, 1)),
    }
}

fn check_pair(first: usize, second: usize) -> Result<()> {
    Error::check_factor(first)?;
    Error::check_factor(second)?;
    if first == second {
        return Err(Error::invalid_params(format!(
            "interaction needs two distinct factors, got {first} twice"
        )));
    }
    Ok(())
}

fn cell_levels(cell: usize) -> (Level, Level) {
    (Level::from_bit(cell, 0), Level::from_bit(cell, 1))
}

fn grid(
    first: usize,
    second: usize,
    both_free: bool,
    values: [f64; 4],
    measured: [bool; 4],
    fill: CellFill,
) -> InteractionGrid {
    let cells = std::array::from_fn(|i| {
        let (a, b) = cell_levels(i);
        InteractionCell {
            first: a,
            second: b,
            value: values[i],
            measured: measured[i],
        }
    });
    InteractionGrid {
        factors: (first, second),
        both_free,
        cells,
        fill,
    }
}

/// Fill the cells not marked as measured, returning the rule applied.
pub fn interpolate_missing(values: &mut [f64; 4], measured: &[bool; 4]) -> CellFill {
    let present: Vec<usize> = (0..4).filter(|&i| measured[i]).collect();

    match present.as_slice() {
        [_, _, _, _] => CellFill::Complete,
        [] => {
            *values = FALLBACK_CELLS;
            CellFill::Fallback
        }
        [_, _, _] => {
            // Parallelogram: adjacent cells differ from the missing one in
            // one factor, the opposite cell in both.
            if let Some(m) = (0..4).find(|&i| !measured[i]) {
                values[m] = values[m ^ 1] + values[m ^ 2] - values[m ^ 3];
            }
            CellFill::Parallelogram
        }
        [a, b] => match (*a, *b) {
            (0, 3) => {
                let diff = (values[3] - values[0]) / 2.0;
                values[1] = values[0] + diff;
                values[2] = values[0] + diff;
                CellFill::Diagonal
            }
            (1, 2) => {
                let diff = (values[2] - values[1]) / 2.0;
                values[0] = values[1] - diff;
                values[3] = values[2] + diff;
                CellFill::Diagonal
            }
            (0, 1) => {
                values[2] = values[0] * LOWER;
                values[3] = values[1] * HIGHER;
                CellFill::RowExtrapolation
            }
            (2, 3) => {
                values[0] = values[2] * LOWER;
                values[1] = values[3] * LOWER;
                CellFill::RowExtrapolation
            }
            (0, 2) => {
                values[1] = values[0] * HIGHER;
                values[3] = values[2] * HIGHER;
                CellFill::ColumnExtrapolation
            }
            _ => {
                // (1, 3)
                values[0] = values[1] * LOWER;
                values[2] = values[3] * LOWER;
                CellFill::ColumnExtrapolation
            }
        },
        [base] => {
            let base_value = values[*base];
            for (i, value) in values.iter_mut().enumerate() {
                if i != *base {
                    *value = base_value * SINGLE_POINT_FACTORS[i];
                }
            }
            CellFill::SinglePoint
        }
        _ => CellFill::Complete,
    }
}

/// Grid for a pair when no full factorial data exists.
///
/// # Errors
///
/// Returns an error for an invalid factor pair.
pub fn unmeasured_grid(first: usize, second: usize) -> Result<InteractionGrid> {
    check_pair(first, second)?;
    let mut values = [0.0; 4];
    let measured = [false; 4];
    let fill = interpolate_missing(&mut values, &measured);
    warn!(first, second, "no full factorial data, using fallback interaction grid");
    Ok(grid(first, second, false, values, measured, fill))
}

/// Extract and complete the interaction grid of a factor pair.
///
/// Every run contributes its mean to the cell of its level combination;
/// cells covered by several runs are averaged.
///
/// # Errors
///
/// Returns an error for an invalid pair or if `run_means` does not match
/// the design.
pub fn resolve_interaction(
    design: &Design,
    run_means: &[f64],
    first: usize,
    second: usize,
) -> Result<InteractionGrid> {
    check_pair(first, second)?;
    check_run_means(design, run_means)?;
    debug_assert_eq!(design.factors(), NUM_FACTORS);

    let mut sums = [0.0_f64; 4];
    let mut counts = [0_usize; 4];

    for (run, &value) in run_means.iter().enumerate() {
        let cell = design.level(run, first).index() + 2 * design.level(run, second).index();
        sums[cell] += value;
        counts[cell] += 1;
    }

    let mut values = [0.0; 4];
    let mut measured = [false; 4];
    for cell in 0..4 {
        if counts[cell] > 0 {
            values[cell] = sums[cell] / counts[cell] as f64;
            measured[cell] = true;
        }
    }

    let fill = interpolate_missing(&mut values, &measured);
    let both_free = design.is_free(first) && design.is_free(second);

    if fill == CellFill::Complete {
        debug!(first, second, "interaction grid fully measured");
    } else {
        warn!(first, second, ?fill, "interaction grid has interpolated cells");
    }

    Ok(grid(first, second, both_free, values, measured, fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{FactorAssignment, FactorRole};

    fn design() -> Design {
        let assignment = FactorAssignment::new(
            [1, 3, 0],
            [
                FactorRole::Free,
                FactorRole::Free,
                FactorRole::Fixed(Level::High),
                FactorRole::Free,
                FactorRole::Fixed(Level::Low),
            ],
        )
        .unwrap();
        Design::full_factorial(&assignment)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_both_free_fully_measured() {
        let design = design();
        let means = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        // factor 1 = bit 0, factor 3 = bit 1
        let grid = resolve_interaction(&design, &means, 1, 3).unwrap();

        assert!(grid.both_free);
        assert_eq!(grid.fill, CellFill::Complete);
        assert_eq!(grid.measured_count(), 4);
        // Runs 0 and 4 share (low, low)
        assert!(close(grid.cell(Level::Low, Level::Low).value, 3.0));
        assert!(close(grid.cell(Level::High, Level::Low).value, 4.0));
        assert!(close(grid.cell(Level::Low, Level::High).value, 5.0));
        assert!(close(grid.cell(Level::High, Level::High).value, 6.0));
    }

    #[test]
    fn test_pair_order_swaps_axes() {
        let design = design();
        let means = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let grid = resolve_interaction(&design, &means, 3, 1).unwrap();
        assert!(close(grid.cell(Level::High, Level::Low).value, 5.0));
        assert!(close(grid.cell(Level::Low, Level::High).value, 4.0));
    }

    #[test]
    fn test_fixed_partner_extrapolates_row() {
        let design = design();
        let means = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        // Factor 4 is fixed low: only the (·, low) row is covered
        let grid = resolve_interaction(&design, &means, 1, 4).unwrap();

        assert!(!grid.both_free);
        assert_eq!(grid.fill, CellFill::RowExtrapolation);
        assert_eq!(grid.measured_count(), 2);
        // Factor 1 low runs: 0, 2, 4, 6
        assert!(close(grid.cells[0].value, 4.0));
        assert!(close(grid.cells[1].value, 5.0));
        assert!(close(grid.cells[2].value, 4.0 * 0.9));
        assert!(close(grid.cells[3].value, 5.0 * 1.1));
        assert!(!grid.cells[2].measured);
    }

    #[test]
    fn test_fixed_high_partner_extrapolates_column() {
        let design = design();
        let means = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        // Factor 2 is fixed high as the first axis: only the (high, ·) column
        let grid = resolve_interaction(&design, &means, 2, 0).unwrap();
        assert_eq!(grid.fill, CellFill::ColumnExtrapolation);
        assert!(grid.cells[1].measured && grid.cells[3].measured);
        assert!(close(grid.cells[0].value, grid.cells[1].value * 0.9));
        assert!(close(grid.cells[2].value, grid.cells[3].value * 0.9));
    }

    #[test]
    fn test_measured_cells_never_overwritten() {
        let original = [2.0, 3.0, 5.0, 7.0];
        let mut values = original;
        let fill = interpolate_missing(&mut values, &[true; 4]);
        assert_eq!(fill, CellFill::Complete);
        assert_eq!(values, original);

        for missing in 0..4 {
            let mut values = original;
            let mut measured = [true; 4];
            measured[missing] = false;
            interpolate_missing(&mut values, &measured);
            for i in (0..4).filter(|&i| i != missing) {
                assert_eq!(values[i], original[i]);
            }
        }
    }

    #[test]
    fn test_parallelogram() {
        let additive = [1.0, 3.0, 2.0, 4.0];
        for missing in 0..4 {
            let mut values = additive;
            values[missing] = -99.0;
            let mut measured = [true; 4];
            measured[missing] = false;
            let fill = interpolate_missing(&mut values, &measured);
            assert_eq!(fill, CellFill::Parallelogram);
            assert!(close(values[missing], additive[missing]), "cell {missing}");
        }
    }

    #[test]
    fn test_diagonals() {
        let mut values = [2.0, 0.0, 0.0, 6.0];
        let fill = interpolate_missing(&mut values, &[true, false, false, true]);
        assert_eq!(fill, CellFill::Diagonal);
        assert!(close(values[1], 4.0));
        assert!(close(values[2], 4.0));

        let mut values = [0.0, 2.0, 6.0, 0.0];
        interpolate_missing(&mut values, &[false, true, true, false]);
        assert!(close(values[0], 0.0));
        assert!(close(values[3], 8.0));
    }

    #[test]
    fn test_rows_and_columns() {
        let mut values = [0.0, 0.0, 10.0, 20.0];
        let fill = interpolate_missing(&mut values, &[false, false, true, true]);
        assert_eq!(fill, CellFill::RowExtrapolation);
        assert!(close(values[0], 9.0));
        assert!(close(values[1], 18.0));

        let mut values = [10.0, 0.0, 20.0, 0.0];
        let fill = interpolate_missing(&mut values, &[true, false, true, false]);
        assert_eq!(fill, CellFill::ColumnExtrapolation);
        assert!(close(values[1], 11.0));
        assert!(close(values[3], 22.0));
    }

    #[test]
    fn test_single_point() {
        for base in 0..4 {
            let mut values = [0.0; 4];
            values[base] = 10.0;
            let mut measured = [false; 4];
            measured[base] = true;
            let fill = interpolate_missing(&mut values, &measured);
            assert_eq!(fill, CellFill::SinglePoint);
            for i in 0..4 {
                let expected = if i == base { 10.0 } else { 10.0 * SINGLE_POINT_FACTORS[i] };
                assert!(close(values[i], expected));
            }
        }
    }

    #[test]
    fn test_unmeasured_grid_uses_fallback() {
        let grid = unmeasured_grid(2, 4).unwrap();
        assert_eq!(grid.fill, CellFill::Fallback);
        assert_eq!(grid.measured_count(), 0);
        let values: Vec<f64> = grid.cells.iter().map(|c| c.value).collect();
        assert_eq!(values, FALLBACK_CELLS.to_vec());
    }

    #[test]
    fn test_invalid_pairs() {
        let design = design();
        let means = [0.0; 8];
        assert!(resolve_interaction(&design, &means, 2, 2).is_err());
        assert!(resolve_interaction(&design, &means, 0, 5).is_err());
        assert!(unmeasured_grid(1, 1).is_err());
    }

    #[test]
    fn test_default_pair() {
        assert_eq!(default_pair(Some(&[0.1, -0.9, 0.3, 0.9, 0.0])).unwrap(), (1, 3));
        assert_eq!(default_pair(None).unwrap(), (0, 1));
    }
}
