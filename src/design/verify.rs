//! Design orthogonality verification.
//!
//! Checks that every pair of varied columns is orthogonal (dot product of
//! the coded level vectors is zero) and that each varied column is
//! balanced (equal number of low and high runs).

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::Design;

/// A specific issue found during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrthogonalityIssue {
    /// Two varied columns are correlated.
    CorrelatedColumns {
        /// The two factor indices.
        columns: (usize, usize),
        /// Their dot product (0 for orthogonal columns).
        dot_product: i32,
    },
    /// A varied column does not split the runs evenly.
    ImbalancedColumn {
        /// Factor index.
        column: usize,
        /// Number of high-level runs.
        high_runs: usize,
        /// Number of low-level runs.
        low_runs: usize,
    },
}

/// Result of verifying a design.
#[derive(Debug, Clone)]
pub struct OrthogonalityReport {
    /// Whether all varied columns are balanced and pairwise orthogonal.
    pub is_orthogonal: bool,
    /// Dot products between all columns, shape (factors, factors).
    pub dot_products: Array2<i32>,
    /// Details about any issues found.
    pub issues: Vec<OrthogonalityIssue>,
}

/// Verify the varied columns of a design.
///
/// Fixed columns of a full factorial plan are constant by construction and
/// are reported in `dot_products` but never flagged.
#[must_use]
pub fn verify_orthogonality(design: &Design) -> OrthogonalityReport {
    let factors = design.factors();
    let mut dot_products = Array2::zeros((factors, factors));

    for i in 0..factors {
        for j in 0..factors {
            dot_products[[i, j]] = design
                .column(i)
                .iter()
                .zip(design.column(j).iter())
                .map(|(&a, &b)| i32::from(a) * i32::from(b))
                .sum();
        }
    }

    let mut issues = Vec::new();
    let free = design.free_factors();

    for &column in free {
        let high_runs = design.column(column).iter().filter(|&&v| v > 0).count();
        let low_runs = design.runs() - high_runs;
        if high_runs != low_runs {
            issues.push(OrthogonalityIssue::ImbalancedColumn {
                column,
                high_runs,
                low_runs,
            });
        }
    }

    for (pos, &a) in free.iter().enumerate() {
        for &b in &free[pos + 1..] {
            let dot_product = dot_products[[a, b]];
            if dot_product != 0 {
                issues.push(OrthogonalityIssue::CorrelatedColumns {
                    columns: (a, b),
                    dot_product,
                });
            }
        }
    }

    OrthogonalityReport {
        is_orthogonal: issues.is_empty(),
        dot_products,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{DesignKind, FactorAssignment, FactorRole};
    use crate::factor::Level;

    #[test]
    fn test_fractional_is_orthogonal() {
        let report = verify_orthogonality(&Design::fractional());
        assert!(report.is_orthogonal);
        assert!(report.issues.is_empty());

        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 8 } else { 0 };
                assert_eq!(report.dot_products[[i, j]], expected, "columns {i}, {j}");
            }
        }
    }

    #[test]
    fn test_full_factorial_free_columns_orthogonal() {
        let assignment = FactorAssignment::new(
            [1, 4, 0],
            [
                FactorRole::Free,
                FactorRole::Free,
                FactorRole::Fixed(Level::Low),
                FactorRole::Fixed(Level::High),
                FactorRole::Free,
            ],
        )
        .unwrap();
        let design = Design::full_factorial(&assignment);
        let report = verify_orthogonality(&design);

        assert!(report.is_orthogonal);
        // Fixed columns are constant
        assert_eq!(report.dot_products[[2, 3]], -8);
    }

    #[test]
    fn test_detects_correlated_columns() {
        let mut design = Design::fractional();
        // Make column 4 a copy of column 0
        for run in 0..8 {
            let value = design.data[[run, 0]];
            design.data[[run, 4]] = value;
        }
        assert_eq!(design.kind(), DesignKind::Fractional);

        let report = verify_orthogonality(&design);
        assert!(!report.is_orthogonal);
        assert!(report.issues.contains(&OrthogonalityIssue::CorrelatedColumns {
            columns: (0, 4),
            dot_product: 8,
        }));
    }

    #[test]
    fn test_detects_imbalance() {
        let mut design = Design::fractional();
        design.data[[0, 2]] = 1;

        let report = verify_orthogonality(&design);
        assert!(!report.is_orthogonal);
        assert!(report.issues.contains(&OrthogonalityIssue::ImbalancedColumn {
            column: 2,
            high_runs: 5,
            low_runs: 3,
        }));
    }
}
