//! Design tables: the fixed fractional screening plan and the full
//! factorial plan generated from a factor selection.
//!
//! ## Overview
//!
//! - [`Design`]: an 8-run × 5-factor matrix of coded levels (−1/+1)
//! - [`FRACTIONAL_PLAN`]: the resolution-III 2^(5−2) screening table
//! - [`FactorAssignment`]: which factors are varied and where the rest are fixed
//!
//! ## Notation
//!
//! Runs are numbered 0..8 in standard order. In the fractional plan the
//! first three columns follow the run bits directly and the last two are
//! the generated columns D = AB and E = AC. In a full factorial plan the
//! i-th selected factor follows bit i of the run index.

mod verify;

pub use verify::{verify_orthogonality, OrthogonalityIssue, OrthogonalityReport};

use std::fmt;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::factor::Level;
use crate::{NUM_FACTORS, NUM_FREE, NUM_RUNS};

/// Fractional factorial screening plan, 8 runs over 5 factors.
pub const FRACTIONAL_PLAN: [[i8; NUM_FACTORS]; NUM_RUNS] = [
    [-1, -1, -1, 1, 1],
    [1, -1, -1, -1, -1],
    [-1, 1, -1, -1, 1],
    [1, 1, -1, 1, -1],
    [-1, -1, 1, 1, -1],
    [1, -1, 1, -1, 1],
    [-1, 1, 1, -1, -1],
    [1, 1, 1, 1, 1],
];

/// Which experimental phase a design belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignKind {
    /// The fixed 2^(5−2) screening plan.
    Fractional,
    /// The 2^3 plan over the three selected factors.
    FullFactorial,
}

/// Role of a factor during the full factorial phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "level")]
pub enum FactorRole {
    /// Varied across the eight runs.
    Free,
    /// Held constant at the given level.
    Fixed(Level),
}

impl FactorRole {
    /// The fixed level, if any.
    #[must_use]
    pub fn fixed_level(self) -> Option<Level> {
        match self {
            Self::Free => None,
            Self::Fixed(level) => Some(level),
        }
    }
}

/// The three varied factors plus the constant level of every other factor.
///
/// Deserialization goes through [`FactorAssignment::new`], so a parsed
/// assignment is as consistent as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssignmentFields")]
pub struct FactorAssignment {
    selected: [usize; NUM_FREE],
    roles: [FactorRole; NUM_FACTORS],
}

/// Unchecked wire form of a [`FactorAssignment`].
#[derive(Deserialize)]
struct AssignmentFields {
    selected: [usize; NUM_FREE],
    roles: [FactorRole; NUM_FACTORS],
}

impl TryFrom<AssignmentFields> for FactorAssignment {
    type Error = Error;

    fn try_from(fields: AssignmentFields) -> Result<Self> {
        Self::new(fields.selected, fields.roles)
    }
}

impl FactorAssignment {
    /// Create an assignment from the selected factors and a fixed level for
    /// every other factor.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected index is out of range or repeated, or
    /// if the roles do not mark exactly the selected factors as free.
    pub fn new(selected: [usize; NUM_FREE], roles: [FactorRole; NUM_FACTORS]) -> Result<Self> {
        for (i, &factor) in selected.iter().enumerate() {
            Error::check_factor(factor)?;
            if selected[..i].contains(&factor) {
                return Err(Error::invalid_params(format!(
                    "factor {factor} is selected twice"
                )));
            }
        }

        for (factor, role) in roles.iter().enumerate() {
            let is_selected = selected.contains(&factor);
            match (role, is_selected) {
                (FactorRole::Free, false) => {
                    return Err(Error::invalid_params(format!(
                        "factor {factor} is free but not selected"
                    )));
                }
                (FactorRole::Fixed(_), true) => {
                    return Err(Error::invalid_params(format!(
                        "factor {factor} is selected but fixed"
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { selected, roles })
    }

    /// The varied factors; position i drives bit i of the run index.
    #[must_use]
    pub fn selected(&self) -> [usize; NUM_FREE] {
        self.selected
    }

    /// Role of every factor, indexed by factor.
    #[must_use]
    pub fn roles(&self) -> &[FactorRole; NUM_FACTORS] {
        &self.roles
    }

    /// Role of one factor.
    #[must_use]
    pub fn role(&self, factor: usize) -> FactorRole {
        self.roles[factor]
    }
}

/// A two-level design matrix, shape (8 runs, 5 factors), values −1/+1.
#[derive(Clone, PartialEq, Eq)]
pub struct Design {
    data: Array2<i8>,
    kind: DesignKind,
    free: Vec<usize>,
}

impl Design {
    /// The fixed fractional screening plan.
    #[must_use]
    pub fn fractional() -> Self {
        let data = Array2::from_shape_fn((NUM_RUNS, NUM_FACTORS), |(run, factor)| {
            FRACTIONAL_PLAN[run][factor]
        });
        Self {
            data,
            kind: DesignKind::Fractional,
            free: (0..NUM_FACTORS).collect(),
        }
    }

    /// Generate the full factorial plan for an assignment.
    ///
    /// Selected factor i takes the level given by bit i of the run index;
    /// fixed factors hold their assigned level in every run.
    #[must_use]
    pub fn full_factorial(assignment: &FactorAssignment) -> Self {
        let mut data = Array2::zeros((NUM_RUNS, NUM_FACTORS));
        for (factor, role) in assignment.roles().iter().enumerate() {
            if let FactorRole::Fixed(level) = role {
                data.column_mut(factor).fill(level.coded());
            }
        }
        // An assignment marks exactly the selected factors free, so every
        // column is written by one of the two loops.
        for (bit, &factor) in assignment.selected().iter().enumerate() {
            for (run, cell) in data.column_mut(factor).iter_mut().enumerate() {
                *cell = Level::from_bit(run, bit).coded();
            }
        }
        debug!(selected = ?assignment.selected(), "generated full factorial plan");
        Self {
            data,
            kind: DesignKind::FullFactorial,
            free: assignment.selected().to_vec(),
        }
    }

    /// Get the number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.data.nrows()
    }

    /// Get the number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.data.ncols()
    }

    /// Which phase this design belongs to.
    #[must_use]
    pub fn kind(&self) -> DesignKind {
        self.kind
    }

    /// Factors varied by this design, in bit order for full factorial plans.
    #[must_use]
    pub fn free_factors(&self) -> &[usize] {
        &self.free
    }

    /// Whether `factor` varies across the runs.
    #[must_use]
    pub fn is_free(&self, factor: usize) -> bool {
        self.free.contains(&factor)
    }

    /// Coded value at a position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn coded(&self, run: usize, factor: usize) -> i8 {
        self.data[[run, factor]]
    }

    /// Level at a position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn level(&self, run: usize, factor: usize) -> Level {
        if self.data[[run, factor]] > 0 {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Get a reference to the underlying matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<i8> {
        &self.data
    }

    /// Get one factor column.
    #[must_use]
    pub fn column(&self, factor: usize) -> ArrayView1<'_, i8> {
        self.data.column(factor)
    }

    /// Iterate over runs.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, i8>> {
        self.data.rows().into_iter()
    }

    /// Runs at which `factor` sits at `level`.
    #[must_use]
    pub fn runs_at(&self, factor: usize, level: Level) -> Vec<usize> {
        (0..self.runs())
            .filter(|&run| self.level(run, factor) == level)
            .collect()
    }

    /// The matrix as plain nested rows, for serialization.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<i8>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} design with data {:?}", self.kind, self.data)
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?} ({} runs, {} factors)", self.kind, self.runs(), self.factors())?;
        for row in self.data.rows() {
            let row_str: Vec<String> = row
                .iter()
                .map(|&v| if v > 0 { "+".to_string() } else { "-".to_string() })
                .collect();
            writeln!(f, "  {}", row_str.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> FactorAssignment {
        FactorAssignment::new(
            [3, 0, 2],
            [
                FactorRole::Free,
                FactorRole::Fixed(Level::High),
                FactorRole::Free,
                FactorRole::Free,
                FactorRole::Fixed(Level::Low),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fractional_shape() {
        let design = Design::fractional();
        assert_eq!(design.runs(), 8);
        assert_eq!(design.factors(), 5);
        assert_eq!(design.kind(), DesignKind::Fractional);
        assert_eq!(design.free_factors(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fractional_generators() {
        // D = AB and E = AC
        let design = Design::fractional();
        for run in 0..8 {
            let a = design.coded(run, 0);
            let b = design.coded(run, 1);
            let c = design.coded(run, 2);
            assert_eq!(design.coded(run, 3), a * b);
            assert_eq!(design.coded(run, 4), a * c);
        }
    }

    #[test]
    fn test_fractional_balance() {
        let design = Design::fractional();
        for factor in 0..5 {
            assert_eq!(design.runs_at(factor, Level::Low).len(), 4);
            assert_eq!(design.runs_at(factor, Level::High).len(), 4);
        }
    }

    #[test]
    fn test_full_factorial_bits() {
        let design = Design::full_factorial(&assignment());
        assert_eq!(design.kind(), DesignKind::FullFactorial);
        assert_eq!(design.free_factors(), &[3, 0, 2]);

        for run in 0..8 {
            assert_eq!(design.level(run, 3), Level::from_bit(run, 0));
            assert_eq!(design.level(run, 0), Level::from_bit(run, 1));
            assert_eq!(design.level(run, 2), Level::from_bit(run, 2));
            assert_eq!(design.level(run, 1), Level::High);
            assert_eq!(design.level(run, 4), Level::Low);
        }
    }

    #[test]
    fn test_full_factorial_all_combinations() {
        let design = Design::full_factorial(&assignment());
        let mut seen: Vec<Vec<i8>> = design
            .rows()
            .map(|row| vec![row[3], row[0], row[2]])
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_assignment_validation() {
        let roles = [
            FactorRole::Free,
            FactorRole::Free,
            FactorRole::Free,
            FactorRole::Fixed(Level::Low),
            FactorRole::Fixed(Level::Low),
        ];
        assert!(FactorAssignment::new([0, 1, 2], roles).is_ok());
        assert!(FactorAssignment::new([0, 1, 1], roles).is_err());
        assert!(FactorAssignment::new([0, 1, 3], roles).is_err());
        assert!(FactorAssignment::new([0, 1, 7], roles).is_err());
    }

    #[test]
    fn test_assignment_serde() {
        let original = assignment();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: FactorAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(Design::full_factorial(&parsed), Design::full_factorial(&original));
    }

    #[test]
    fn test_assignment_deserialize_rejects_inconsistent() {
        let all_free = r#"{"role":"free"}"#;
        let repeated = format!(
            r#"{{"selected":[0,0,0],"roles":[{all_free},{all_free},{all_free},{all_free},{all_free}]}}"#
        );
        assert!(serde_json::from_str::<FactorAssignment>(&repeated).is_err());

        // Factor 4 is free but not selected
        let unselected_free = r#"{"selected":[0,1,2],"roles":[
            {"role":"free"},{"role":"free"},{"role":"free"},
            {"role":"fixed","level":"low"},{"role":"free"}]}"#;
        assert!(serde_json::from_str::<FactorAssignment>(unselected_free).is_err());

        let valid = r#"{"selected":[0,1,2],"roles":[
            {"role":"free"},{"role":"free"},{"role":"free"},
            {"role":"fixed","level":"low"},{"role":"fixed","level":"high"}]}"#;
        let parsed: FactorAssignment = serde_json::from_str(valid).unwrap();
        assert_eq!(parsed.role(4), FactorRole::Fixed(Level::High));
    }

    #[test]
    fn test_display() {
        let text = format!("{}", Design::fractional());
        assert!(text.starts_with("Fractional (8 runs, 5 factors)"));
        assert!(text.contains("- - - + +"));
    }
}
