//! Engine configuration loaded from TOML.
//!
//! Every key is optional; missing keys take the built-in defaults.
//!
//! ```toml
//! fix_threshold = 0.05
//! answer_tolerance = 0.1
//! max_reading = 1000.0
//!
//! [[factors]]
//! name = "Pitch"
//! low = "4"
//! high = "6"
//! # ... exactly five entries when present
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::doe::{DEFAULT_ANSWER_TOLERANCE, DEFAULT_FIX_THRESHOLD};
use crate::error::{Error, Result};
use crate::factor::{FactorCatalogue, FactorSpec};

/// Default upper bound of a plausible power reading (µW).
pub const DEFAULT_MAX_READING: f64 = 1000.0;

/// Tunable constants of the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Effect above which a non-selected factor is fixed at its high level.
    pub fix_threshold: f64,
    /// Absolute tolerance for grading student answers.
    pub answer_tolerance: f64,
    /// Largest accepted reading.
    pub max_reading: f64,
    /// Optional override of the factor names and level labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<Vec<FactorSpec>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fix_threshold: DEFAULT_FIX_THRESHOLD,
            answer_tolerance: DEFAULT_ANSWER_TOLERANCE,
            max_reading: DEFAULT_MAX_READING,
            factors: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed or a value is
    /// out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.fix_threshold.is_finite() || self.fix_threshold < 0.0 {
            return Err(Error::config(format!(
                "fix_threshold must be finite and non-negative, got {}",
                self.fix_threshold
            )));
        }
        if !self.answer_tolerance.is_finite() || self.answer_tolerance <= 0.0 {
            return Err(Error::config(format!(
                "answer_tolerance must be finite and positive, got {}",
                self.answer_tolerance
            )));
        }
        if !self.max_reading.is_finite() || self.max_reading <= 0.0 {
            return Err(Error::config(format!(
                "max_reading must be finite and positive, got {}",
                self.max_reading
            )));
        }
        self.catalogue()
            .map(|_| ())
            .map_err(|e| Error::config(format!("factors: {e}")))
    }

    /// The factor catalogue: the override if present, the defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the override does not describe five named factors.
    pub fn catalogue(&self) -> Result<FactorCatalogue> {
        match &self.factors {
            Some(specs) => FactorCatalogue::from_specs(specs),
            None => Ok(FactorCatalogue::default()),
        }
    }
}
