//! Persisted experiment record.
//!
//! The record is the shape the storage layer keeps: raw replicates of both
//! phases, the derived means, standard deviations and effects, and the
//! three selected factors. Derived values are informational; a session
//! rebuilt from a record recomputes them from the readings.
//!
//! The JSON keys are the storage layer's own (`teilfaktoriellMessungen`,
//! `effekte`, `ausgewaehlteVollfaktoren`, ...). That writer always emits
//! every field and zero-fills what has not been measured, so a run whose
//! readings are all zero is read back as unmeasured. This crate omits the
//! full factorial fields until that phase has started.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::measurement::validate_reading;
use crate::{NUM_FACTORS, NUM_FREE, NUM_RUNS, REPLICATES};

/// Record format version written by this crate.
pub const RECORD_VERSION: &str = "2.0";

/// Default description of a record.
pub const RECORD_DESCRIPTION: &str = "Wind turbine power experiment";

/// Serializable snapshot of an experiment session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Time the storage layer saved the record, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Format version, `"2.0"`.
    pub version: String,
    /// Replicates of the eight screening runs.
    #[serde(rename = "teilfaktoriellMessungen")]
    pub fractional_readings: Vec<Vec<f64>>,
    /// Screening run means, once every run is complete.
    #[serde(
        rename = "teilfaktoriellMittelwerte",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fractional_means: Option<Vec<f64>>,
    /// Screening run standard deviations, once every run is complete.
    #[serde(
        rename = "teilfaktoriellStandardabweichungen",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fractional_std_devs: Option<Vec<f64>>,
    /// Replicates of the eight full factorial runs.
    #[serde(
        rename = "vollfaktoriellMessungen",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_readings: Option<Vec<Vec<f64>>>,
    /// Full factorial run means, once every run is complete.
    #[serde(
        rename = "vollfaktoriellMittelwerte",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_means: Option<Vec<f64>>,
    /// Full factorial run standard deviations, once every run is complete.
    #[serde(
        rename = "vollfaktoriellStandardabweichungen",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_std_devs: Option<Vec<f64>>,
    /// Main effects, once every screening run is complete.
    #[serde(rename = "effekte", default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<f64>>,
    /// The varied factors of the full factorial phase.
    #[serde(
        rename = "ausgewaehlteVollfaktoren",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_factors: Option<[usize; NUM_FREE]>,
}

impl Default for ExperimentRecord {
    fn default() -> Self {
        Self {
            timestamp: None,
            description: RECORD_DESCRIPTION.to_string(),
            version: RECORD_VERSION.to_string(),
            fractional_readings: vec![Vec::new(); NUM_RUNS],
            fractional_means: None,
            fractional_std_devs: None,
            effects: None,
            selected_factors: None,
            full_readings: None,
            full_means: None,
            full_std_devs: None,
        }
    }
}

/// Whether a run holds only the zero placeholder of an unmeasured run.
fn is_placeholder(reps: &[f64]) -> bool {
    reps.iter().all(|&value| value == 0.0)
}

/// Readings of every run with zero placeholders replaced by empty runs.
fn measured(readings: &[Vec<f64>]) -> Vec<Vec<f64>> {
    readings
        .iter()
        .map(|reps| {
            if is_placeholder(reps) {
                Vec::new()
            } else {
                reps.clone()
            }
        })
        .collect()
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::record(format!(
            "{field} holds {actual} entries, expected {expected}"
        )));
    }
    Ok(())
}

fn check_readings(field: &str, readings: &[Vec<f64>], max_reading: f64) -> Result<()> {
    check_len(field, readings.len(), NUM_RUNS)?;
    for (run, reps) in readings.iter().enumerate() {
        if reps.len() > REPLICATES {
            return Err(Error::record(format!(
                "{field}[{run}] holds {} readings, at most {REPLICATES} allowed",
                reps.len()
            )));
        }
        for &value in reps {
            validate_reading(value, max_reading)?;
        }
    }
    Ok(())
}

fn check_optional(field: &str, values: Option<&Vec<f64>>, expected: usize) -> Result<()> {
    match values {
        Some(values) => check_len(field, values.len(), expected),
        None => Ok(()),
    }
}

impl ExperimentRecord {
    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Record` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::record(e.to_string()))
    }

    /// Parse a record from JSON. The record is not validated.
    ///
    /// # Errors
    ///
    /// Returns `Error::Record` for malformed JSON or a missing field.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::record(e.to_string()))
    }

    /// Whether the full factorial phase has at least one measured run.
    #[must_use]
    pub fn has_full_factorial(&self) -> bool {
        self.full_readings
            .as_ref()
            .is_some_and(|full| full.iter().any(|reps| !is_placeholder(reps)))
    }

    /// Screening readings per run; all-zero runs come back empty.
    #[must_use]
    pub fn measured_fractional(&self) -> Vec<Vec<f64>> {
        measured(&self.fractional_readings)
    }

    /// Full factorial readings per run, if that phase is in the record;
    /// all-zero runs come back empty.
    #[must_use]
    pub fn measured_full(&self) -> Option<Vec<Vec<f64>>> {
        self.full_readings.as_deref().map(measured)
    }

    /// Check shapes, reading ranges and the factor selection.
    ///
    /// # Errors
    ///
    /// Returns `Error::Record` for a malformed record and `InvalidReading`
    /// for an out-of-range reading.
    pub fn validate(&self, max_reading: f64) -> Result<()> {
        if self.version.split('.').next() != RECORD_VERSION.split('.').next() {
            return Err(Error::record(format!(
                "unsupported record version {}",
                self.version
            )));
        }

        check_readings("teilfaktoriellMessungen", &self.fractional_readings, max_reading)?;
        check_optional("teilfaktoriellMittelwerte", self.fractional_means.as_ref(), NUM_RUNS)?;
        check_optional(
            "teilfaktoriellStandardabweichungen",
            self.fractional_std_devs.as_ref(),
            NUM_RUNS,
        )?;
        check_optional("effekte", self.effects.as_ref(), NUM_FACTORS)?;

        if let Some(selected) = self.selected_factors {
            for (i, &factor) in selected.iter().enumerate() {
                if factor >= NUM_FACTORS {
                    return Err(Error::record(format!(
                        "selected factor {factor} is out of range"
                    )));
                }
                if selected[..i].contains(&factor) {
                    return Err(Error::record(format!(
                        "factor {factor} is selected twice"
                    )));
                }
            }
        }

        if let Some(full) = &self.full_readings {
            if self.selected_factors.is_none() {
                return Err(Error::record(
                    "full factorial readings present without selected factors",
                ));
            }
            check_readings("vollfaktoriellMessungen", full, max_reading)?;
        }
        check_optional("vollfaktoriellMittelwerte", self.full_means.as_ref(), NUM_RUNS)?;
        check_optional(
            "vollfaktoriellStandardabweichungen",
            self.full_std_devs.as_ref(),
            NUM_RUNS,
        )?;

        Ok(())
    }
}
