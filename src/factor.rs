//! Experimental factors and their two levels.
//!
//! The apparatus has five two-level factors. Each factor carries a display
//! name and a label for each level; the labels are only used by
//! presentation layers, all computations work on coded levels (−1/+1).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::NUM_FACTORS;

/// A coded two-level factor setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Coded as −1.
    Low,
    /// Coded as +1.
    High,
}

impl Level {
    /// Both levels, low first.
    pub const ALL: [Level; 2] = [Level::Low, Level::High];

    /// The coded value, −1 or +1.
    #[must_use]
    pub fn coded(self) -> i8 {
        match self {
            Self::Low => -1,
            Self::High => 1,
        }
    }

    /// Level selected by bit `bit` of a run index in standard order.
    #[must_use]
    pub fn from_bit(run: usize, bit: usize) -> Self {
        if run & (1 << bit) != 0 {
            Self::High
        } else {
            Self::Low
        }
    }

    /// Index into a two-element table (low = 0, high = 1).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}

/// An experimental factor: display name plus the label of each level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// Factor index (0–4).
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Label shown for the low level.
    pub low_label: String,
    /// Label shown for the high level.
    pub high_label: String,
}

impl Factor {
    /// Label for the given level.
    #[must_use]
    pub fn label(&self, level: Level) -> &str {
        match level {
            Level::Low => &self.low_label,
            Level::High => &self.high_label,
        }
    }
}

/// Name and level labels for one factor, as given in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorSpec {
    /// Display name.
    pub name: String,
    /// Label for the low level.
    pub low: String,
    /// Label for the high level.
    pub high: String,
}

const DEFAULT_FACTORS: [(&str, &str, &str); NUM_FACTORS] = [
    ("Pitch", "4", "6"),
    ("Rotor size", "7 in", "8 in"),
    ("Distance", "30 cm", "60 cm"),
    ("Wind strength", "Stage 1", "Stage 3"),
    ("Blade count", "2 blades", "3 blades"),
];

/// The five factors of the apparatus, immutable for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCatalogue {
    factors: Vec<Factor>,
}

impl FactorCatalogue {
    /// Build a catalogue from exactly five factor specs.
    ///
    /// # Errors
    ///
    /// Returns an error if `specs` does not hold exactly five entries or a
    /// name is empty.
    pub fn from_specs(specs: &[FactorSpec]) -> Result<Self> {
        if specs.len() != NUM_FACTORS {
            return Err(Error::DimensionMismatch {
                expected: format!("{NUM_FACTORS} factors"),
                actual: format!("{} factors", specs.len()),
            });
        }

        let factors = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                if spec.name.trim().is_empty() {
                    return Err(Error::invalid_params(format!(
                        "factor {index} has an empty name"
                    )));
                }
                Ok(Factor {
                    index,
                    name: spec.name.clone(),
                    low_label: spec.low.clone(),
                    high_label: spec.high.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { factors })
    }

    /// Get a factor by index.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not in 0..5.
    pub fn get(&self, index: usize) -> Result<&Factor> {
        self.factors.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            size: NUM_FACTORS,
        })
    }

    /// Iterate over the factors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Factor> {
        self.factors.iter()
    }
}

impl Default for FactorCatalogue {
    fn default() -> Self {
        let factors = DEFAULT_FACTORS
            .iter()
            .enumerate()
            .map(|(index, (name, low, high))| Factor {
                index,
                name: (*name).to_string(),
                low_label: (*low).to_string(),
                high_label: (*high).to_string(),
            })
            .collect();
        Self { factors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_coding() {
        assert_eq!(Level::Low.coded(), -1);
        assert_eq!(Level::High.coded(), 1);
    }

    #[test]
    fn test_level_from_bit() {
        assert_eq!(Level::from_bit(0b101, 0), Level::High);
        assert_eq!(Level::from_bit(0b101, 1), Level::Low);
        assert_eq!(Level::from_bit(0b101, 2), Level::High);
    }

    #[test]
    fn test_default_catalogue() {
        let catalogue = FactorCatalogue::default();
        assert_eq!(catalogue.iter().count(), 5);
        let blades = catalogue.get(4).unwrap();
        assert_eq!(blades.label(Level::High), "3 blades");
        assert!(catalogue.get(5).is_err());
    }

    #[test]
    fn test_catalogue_from_specs_wrong_len() {
        let specs = vec![FactorSpec {
            name: "Only".into(),
            low: "a".into(),
            high: "b".into(),
        }];
        assert!(FactorCatalogue::from_specs(&specs).is_err());
    }
}
