//! The experiment session: measurement state plus on-demand analysis.
//!
//! A session owns the replicate readings of both phases and the factor
//! selection. Every table (effects, ranking, regression, ...) is recomputed
//! from the readings when requested, so repeated calls on unchanged data
//! return identical results.
//!
//! The session has no interior locking. Callers serialize writes
//! (recording a reading, finalizing the selection) and reads; wrap it in a
//! `Mutex` if it is shared between threads.
//!
//! ## Lifecycle
//!
//! 1. Record five readings for each of the eight screening runs.
//! 2. [`ExperimentSession::select_factors`] ranks the effects, keeps the top
//!    three factors varied and fixes the other two. Screening readings are
//!    frozen from then on.
//! 3. Record five readings for each of the eight full factorial runs.
//! 4. Query the regression model and interaction grids.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::design::Design;
use crate::doe::{
    self, AnswerFeedback, AnswerKind, EffectEstimate, FactorRanking, FactorSelection,
    InteractionGrid, MainEffectsPlot, ParetoChart, RegressionModel, ReplicateSummary,
};
use crate::error::{Error, Result};
use crate::factor::{Factor, FactorCatalogue};
use crate::measurement::MeasurementSet;
use crate::record::{ExperimentRecord, RECORD_DESCRIPTION, RECORD_VERSION};
use crate::{NUM_FREE, NUM_RUNS, REPLICATES};

/// Tolerance when comparing stored effects with recomputed ones.
const EFFECT_DRIFT: f64 = 1e-6;

/// The two measurement phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fractional design over all five factors.
    Screening,
    /// Full factorial design over the three selected factors.
    FullFactorial,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screening => write!(f, "screening"),
            Self::FullFactorial => write!(f, "full factorial"),
        }
    }
}

/// How far the measurements of a stage have come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    /// The stage.
    pub stage: Stage,
    /// Runs holding all replicates.
    pub completed_runs: usize,
    /// Runs in the design.
    pub total_runs: usize,
    /// First run still missing readings.
    pub next_run: Option<usize>,
    /// Readings already held by `next_run`; measuring resumes here.
    pub next_replicate: usize,
}

impl StageProgress {
    /// Whether every run is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_runs == self.total_runs
    }
}

/// Every table that can currently be computed. Missing tables are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Factor names and level labels.
    pub factors: Vec<Factor>,
    /// Per-run summary of the screening phase; `None` for incomplete runs.
    pub screening_summaries: Vec<Option<ReplicateSummary>>,
    /// Level means, effects and display range.
    pub main_effects_plot: Option<MainEffectsPlot>,
    /// Factors by descending absolute effect.
    pub ranking: Option<FactorRanking>,
    /// Effect contributions.
    pub pareto: Option<ParetoChart>,
    /// Varied factors and fixed levels.
    pub selection: Option<FactorSelection>,
    /// Coded full factorial plan, one row per run.
    pub full_design: Option<Vec<Vec<i8>>>,
    /// Per-run summary of the full factorial phase.
    pub full_summaries: Option<Vec<Option<ReplicateSummary>>>,
    /// Regression model over the full factorial runs.
    pub regression: Option<RegressionModel>,
    /// Interaction grid of the two most influential factors.
    pub interaction: Option<InteractionGrid>,
}

impl ExperimentReport {
    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Record` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::record(e.to_string()))
    }
}

fn readings(sets: &[MeasurementSet]) -> Vec<Vec<f64>> {
    sets.iter().map(|s| s.readings().to_vec()).collect()
}

/// State of one guided experiment.
#[derive(Debug, Clone)]
pub struct ExperimentSession {
    config: EngineConfig,
    catalogue: FactorCatalogue,
    description: String,
    timestamp: Option<u64>,
    fractional: Design,
    screening: Vec<MeasurementSet>,
    selection: Option<FactorSelection>,
    full_design: Option<Design>,
    full: Vec<MeasurementSet>,
}

impl Default for ExperimentSession {
    fn default() -> Self {
        Self::with_catalogue(EngineConfig::default(), FactorCatalogue::default())
    }
}

impl ExperimentSession {
    /// Create an empty session.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalogue = config.catalogue()?;
        Ok(Self::with_catalogue(config, catalogue))
    }

    fn with_catalogue(config: EngineConfig, catalogue: FactorCatalogue) -> Self {
        Self {
            config,
            catalogue,
            description: RECORD_DESCRIPTION.to_string(),
            timestamp: None,
            fractional: Design::fractional(),
            screening: vec![MeasurementSet::new(); NUM_RUNS],
            selection: None,
            full_design: None,
            full: vec![MeasurementSet::new(); NUM_RUNS],
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Factor names and level labels.
    #[must_use]
    pub fn catalogue(&self) -> &FactorCatalogue {
        &self.catalogue
    }

    /// Description stored in records.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description stored in records.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Save time of the record this session was restored from.
    #[must_use]
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// The stage currently being measured.
    #[must_use]
    pub fn phase(&self) -> Stage {
        if self.selection.is_some() {
            Stage::FullFactorial
        } else {
            Stage::Screening
        }
    }

    /// The finalized selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&FactorSelection> {
        self.selection.as_ref()
    }

    /// Design of a stage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for the full factorial stage before selection.
    pub fn design(&self, stage: Stage) -> Result<&Design> {
        match stage {
            Stage::Screening => Ok(&self.fractional),
            Stage::FullFactorial => self
                .full_design
                .as_ref()
                .ok_or_else(|| Error::invalid_state("factors have not been selected yet")),
        }
    }

    fn check_run(stage: Stage, run: usize) -> Result<()> {
        if run >= NUM_RUNS {
            warn!(%stage, run, "run index out of range");
            return Err(Error::IndexOutOfBounds {
                index: run,
                size: NUM_RUNS,
            });
        }
        Ok(())
    }

    /// Replicates recorded for a run.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid run or an unavailable stage.
    pub fn measurements(&self, stage: Stage, run: usize) -> Result<&MeasurementSet> {
        Self::check_run(stage, run)?;
        self.design(stage)?;
        Ok(match stage {
            Stage::Screening => &self.screening[run],
            Stage::FullFactorial => &self.full[run],
        })
    }

    fn measurements_mut(&mut self, stage: Stage, run: usize) -> Result<&mut MeasurementSet> {
        Self::check_run(stage, run)?;
        match stage {
            Stage::Screening if self.selection.is_some() => Err(Error::invalid_state(
                "screening readings are frozen once factors are selected",
            )),
            Stage::Screening => Ok(&mut self.screening[run]),
            Stage::FullFactorial if self.selection.is_none() => {
                Err(Error::invalid_state("factors have not been selected yet"))
            }
            Stage::FullFactorial => Ok(&mut self.full[run]),
        }
    }

    /// Append one replicate reading. Returns the number of readings the run
    /// now holds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReading`, `MeasurementComplete`, `IndexOutOfBounds`
    /// or `InvalidState` (screening after selection, full factorial before).
    pub fn record_reading(&mut self, stage: Stage, run: usize, value: f64) -> Result<usize> {
        let max = self.config.max_reading;
        let result = self
            .measurements_mut(stage, run)
            .and_then(|set| set.push(run, value, max));

        match result {
            Ok(count) if count == REPLICATES => {
                info!(%stage, run, "run complete");
                Ok(count)
            }
            Ok(count) => {
                debug!(%stage, run, value, count, "recorded reading");
                Ok(count)
            }
            Err(e) => {
                warn!(%stage, run, value, error = %e, "rejected reading");
                Err(e)
            }
        }
    }

    /// Discard the readings of a run so it can be measured again.
    ///
    /// # Errors
    ///
    /// Same state rules as [`ExperimentSession::record_reading`].
    pub fn reset_run(&mut self, stage: Stage, run: usize) -> Result<()> {
        self.measurements_mut(stage, run)?.reset();
        info!(%stage, run, "run reset");
        Ok(())
    }

    /// Completed runs and where to resume.
    #[must_use]
    pub fn progress(&self, stage: Stage) -> StageProgress {
        let sets = match stage {
            Stage::Screening => &self.screening,
            Stage::FullFactorial => &self.full,
        };
        let next = sets.iter().position(|s| !s.is_complete());
        StageProgress {
            stage,
            completed_runs: sets.iter().filter(|s| s.is_complete()).count(),
            total_runs: sets.len(),
            next_run: next,
            next_replicate: next.map_or(0, |run| sets[run].len()),
        }
    }

    /// Mean and standard deviation of one complete run.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` while the run is incomplete.
    pub fn run_summary(&self, stage: Stage, run: usize) -> Result<ReplicateSummary> {
        self.measurements(stage, run)?.summary()
    }

    /// Summaries of every run of a stage.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` unless every run is complete.
    pub fn run_summaries(&self, stage: Stage) -> Result<Vec<ReplicateSummary>> {
        self.design(stage)?;
        let progress = self.progress(stage);
        if !progress.is_complete() {
            return Err(Error::InsufficientData {
                needed: progress.total_runs,
                actual: progress.completed_runs,
            });
        }
        (0..NUM_RUNS).map(|run| self.run_summary(stage, run)).collect()
    }

    /// Means of every run of a stage.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` unless every run is complete.
    pub fn run_means(&self, stage: Stage) -> Result<Vec<f64>> {
        Ok(self
            .run_summaries(stage)?
            .iter()
            .map(|s| s.mean)
            .collect())
    }

    fn partial_summaries(&self, stage: Stage) -> Vec<Option<ReplicateSummary>> {
        (0..NUM_RUNS)
            .map(|run| self.run_summary(stage, run).ok())
            .collect()
    }

    /// Main effects of the screening phase.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until every screening run is complete.
    pub fn effects(&self) -> Result<Vec<EffectEstimate>> {
        doe::estimate_effects(&self.fractional, &self.run_means(Stage::Screening)?)
    }

    /// Signed screening effects in factor order.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until every screening run is complete.
    pub fn effect_values(&self) -> Result<Vec<f64>> {
        Ok(self.effects()?.iter().map(|e| e.effect).collect())
    }

    /// Main-effects plot data of the screening phase.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until every screening run is complete.
    pub fn main_effects_plot(&self) -> Result<MainEffectsPlot> {
        doe::main_effects_plot(&self.fractional, &self.run_means(Stage::Screening)?)
    }

    /// Factors by descending absolute screening effect.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until every screening run is complete.
    pub fn ranking(&self) -> Result<FactorRanking> {
        doe::rank_factors(&self.effect_values()?)
    }

    /// Pareto chart of the screening effects.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` until every screening run is complete.
    pub fn pareto(&self) -> Result<ParetoChart> {
        doe::pareto_chart(&self.effect_values()?)
    }

    /// Rank the screening effects and finalize the top three factors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if a selection already exists and
    /// `InsufficientData` while screening is incomplete.
    pub fn select_factors(&mut self) -> Result<&FactorSelection> {
        self.check_unselected()?;
        let effects = self.effect_values()?;
        let selection = doe::select_factors(&effects, self.config.fix_threshold)?;
        Ok(self.finalize_selection(selection))
    }

    /// Finalize a selection decided outside the engine. The remaining
    /// factors are fixed from the screening effects.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if a selection already exists,
    /// `InsufficientData` while screening is incomplete and `InvalidParams`
    /// for an invalid selection.
    pub fn apply_selection(&mut self, selected: [usize; NUM_FREE]) -> Result<&FactorSelection> {
        self.check_unselected()?;
        let effects = self.effect_values()?;
        let assignment = doe::assign_levels(selected, &effects, self.config.fix_threshold)?;
        let selection = FactorSelection {
            ranking: doe::rank_factors(&effects)?,
            assignment,
        };
        Ok(self.finalize_selection(selection))
    }

    fn check_unselected(&self) -> Result<()> {
        if self.selection.is_some() {
            return Err(Error::invalid_state(
                "factor selection is already finalized; reset it first",
            ));
        }
        Ok(())
    }

    fn finalize_selection(&mut self, selection: FactorSelection) -> &FactorSelection {
        self.full_design = Some(Design::full_factorial(&selection.assignment));
        self.full = vec![MeasurementSet::new(); NUM_RUNS];
        info!(
            selected = ?selection.selected(),
            "factor selection finalized, full factorial phase started"
        );
        self.selection.insert(selection)
    }

    /// Drop the selection and every full factorial reading.
    pub fn reset_selection(&mut self) {
        if self.selection.take().is_some() {
            info!("factor selection reset, full factorial readings discarded");
        }
        self.full_design = None;
        self.full = vec![MeasurementSet::new(); NUM_RUNS];
    }

    /// Regression model over the full factorial runs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before selection and `InsufficientData` until
    /// every full factorial run is complete.
    pub fn regression(&self) -> Result<RegressionModel> {
        let design = self.design(Stage::FullFactorial)?;
        doe::build_regression(design, &self.run_means(Stage::FullFactorial)?)
    }

    /// Interaction grid of a factor pair.
    ///
    /// Without a pair the two factors with the largest absolute screening
    /// effect are used, or (0, 1) before screening is complete. Without
    /// complete full factorial data the grid holds fallback values only.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid pair.
    pub fn interaction(&self, pair: Option<(usize, usize)>) -> Result<InteractionGrid> {
        let (first, second) = match pair {
            Some(pair) => pair,
            None => doe::default_pair(self.effect_values().ok().as_deref())?,
        };

        match (&self.full_design, self.run_means(Stage::FullFactorial)) {
            (Some(design), Ok(means)) => doe::resolve_interaction(design, &means, first, second),
            _ => doe::unmeasured_grid(first, second),
        }
    }

    /// Grade a student-entered value.
    ///
    /// `index` is a run for `Mean` and `StdDev` and a factor for `Effect`.
    /// Effects of the full factorial stage are taken over its runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the expected value cannot be computed yet.
    pub fn check_answer(
        &self,
        kind: AnswerKind,
        stage: Stage,
        index: usize,
        submitted: f64,
    ) -> Result<AnswerFeedback> {
        let expected = match kind {
            AnswerKind::Mean => self.run_summary(stage, index)?.mean,
            AnswerKind::StdDev => self.run_summary(stage, index)?.std_dev,
            AnswerKind::Effect => {
                Error::check_factor(index)?;
                let design = self.design(stage)?;
                doe::level_contrast(design, &self.run_means(stage)?, index)?.effect
            }
        };
        let feedback = doe::check_answer(kind, submitted, expected, self.config.answer_tolerance);
        debug!(?kind, %stage, index, correct = feedback.correct, "graded answer");
        Ok(feedback)
    }

    /// Collect every table that can currently be computed.
    #[must_use]
    pub fn report(&self) -> ExperimentReport {
        let regression = self.regression().ok();
        let interaction = if regression.is_some() {
            self.interaction(None).ok()
        } else {
            None
        };

        ExperimentReport {
            factors: self.catalogue.iter().cloned().collect(),
            screening_summaries: self.partial_summaries(Stage::Screening),
            main_effects_plot: self.main_effects_plot().ok(),
            ranking: self.ranking().ok(),
            pareto: self.pareto().ok(),
            selection: self.selection.clone(),
            full_design: self.full_design.as_ref().map(Design::to_rows),
            full_summaries: self
                .selection
                .as_ref()
                .map(|_| self.partial_summaries(Stage::FullFactorial)),
            regression,
            interaction,
        }
    }

    /// Snapshot the session as a persisted record.
    #[must_use]
    pub fn to_record(&self) -> ExperimentRecord {
        let screening = self.run_summaries(Stage::Screening).ok();
        let full = self.run_summaries(Stage::FullFactorial).ok();

        ExperimentRecord {
            timestamp: self.timestamp,
            description: self.description.clone(),
            version: RECORD_VERSION.to_string(),
            fractional_readings: readings(&self.screening),
            fractional_means: screening
                .as_ref()
                .map(|s| s.iter().map(|x| x.mean).collect()),
            fractional_std_devs: screening
                .as_ref()
                .map(|s| s.iter().map(|x| x.std_dev).collect()),
            effects: self.effect_values().ok(),
            selected_factors: self.selection.as_ref().map(FactorSelection::selected),
            full_readings: self.selection.as_ref().map(|_| readings(&self.full)),
            full_means: full.as_ref().map(|s| s.iter().map(|x| x.mean).collect()),
            full_std_devs: full.as_ref().map(|s| s.iter().map(|x| x.std_dev).collect()),
        }
    }

    /// Rebuild a session from a persisted record.
    ///
    /// Derived values are recomputed from the readings; stored effects that
    /// disagree are logged and ignored. Runs holding only zeros are the
    /// storage layer's placeholder and come back unmeasured. A stored
    /// selection is ignored while screening is incomplete and no full
    /// factorial run was measured.
    ///
    /// The record keeps only the selected factors, so the fixed levels of
    /// the other two are recomputed with this configuration's
    /// `fix_threshold`. A threshold other than the default can put a fixed
    /// factor at a different level from the one its readings were taken
    /// at; each such factor is logged with `warn!`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the record is invalid, or
    /// if full factorial readings are stored for incomplete screening data.
    pub fn from_record(config: EngineConfig, record: &ExperimentRecord) -> Result<Self> {
        let mut session = Self::new(config)?;
        let max = session.config.max_reading;
        record.validate(max)?;

        session.description.clone_from(&record.description);
        session.timestamp = record.timestamp;
        for (set, reps) in session.screening.iter_mut().zip(record.measured_fractional()) {
            *set = MeasurementSet::from_readings(&reps, max)?;
        }

        if let Some(selected) = record.selected_factors {
            let screened = session.screening.iter().all(MeasurementSet::is_complete);
            if screened || record.has_full_factorial() {
                session.apply_selection(selected)?;
                session.check_fixed_levels()?;
                let full = record.measured_full().unwrap_or_default();
                for (set, reps) in session.full.iter_mut().zip(full) {
                    *set = MeasurementSet::from_readings(&reps, max)?;
                }
            } else {
                debug!(?selected, "ignoring stored selection of an incomplete screening");
            }
        }

        if let (Some(stored), Ok(computed)) = (&record.effects, session.effect_values()) {
            let drifted = stored
                .iter()
                .zip(&computed)
                .any(|(a, b)| (a - b).abs() > EFFECT_DRIFT);
            if drifted {
                warn!(?stored, ?computed, "stored effects differ from the readings");
            }
        }

        info!(
            screening = session.progress(Stage::Screening).completed_runs,
            full = session.progress(Stage::FullFactorial).completed_runs,
            "restored session from record"
        );
        Ok(session)
    }

    /// Warn about fixed levels that differ from the ones the default
    /// threshold gives.
    fn check_fixed_levels(&self) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        if (self.config.fix_threshold - doe::DEFAULT_FIX_THRESHOLD).abs() < f64::EPSILON {
            return Ok(());
        }
        let effects = self.effect_values()?;
        for (factor, role) in selection.assignment.roles().iter().enumerate() {
            if let Some(level) = role.fixed_level() {
                let default_level = doe::fixed_level(effects[factor], doe::DEFAULT_FIX_THRESHOLD);
                if level != default_level {
                    warn!(
                        factor,
                        %level,
                        %default_level,
                        fix_threshold = self.config.fix_threshold,
                        "fixed level differs from the one the default threshold gives"
                    );
                }
            }
        }
        Ok(())
    }
}
