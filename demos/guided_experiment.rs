//! Guided experiment walkthrough for the turbine-doe engine.
//!
//! Simulates a student measuring both phases of the wind-turbine
//! experiment and prints every table the engine produces. Set `RUST_LOG`
//! (e.g. `RUST_LOG=turbine_doe=debug`) to see the engine's log output.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use turbine_doe::prelude::*;

/// Simulated apparatus: additive response plus a fixed replicate pattern.
fn simulated_reading(design: &Design, run: usize, replicate: usize) -> f64 {
    let coefficients = [6.0, 2.5, -4.0, 9.0, 1.5];
    let noise = [-0.4, 0.2, 0.0, 0.3, -0.1];
    let response: f64 = (0..NUM_FACTORS)
        .map(|f| coefficients[f] * f64::from(design.coded(run, f)))
        .sum();
    60.0 + response + noise[replicate]
}

fn measure(session: &mut ExperimentSession, stage: Stage) -> Result<()> {
    let design = session.design(stage)?.clone();
    let progress = session.progress(stage);
    for run in progress.next_run.unwrap_or(NUM_RUNS)..NUM_RUNS {
        let start = session.measurements(stage, run)?.len();
        for replicate in start..REPLICATES {
            session.record_reading(stage, run, simulated_reading(&design, run, replicate))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    println!("Turbine DOE - Guided Experiment Example\n");

    let mut session = ExperimentSession::new(EngineConfig::default())?;

    let report = verify_orthogonality(session.design(Stage::Screening)?);
    println!("Screening design:");
    println!("{}", session.design(Stage::Screening)?);
    if report.is_orthogonal {
        println!("✓ Columns are balanced and pairwise orthogonal");
    } else {
        for issue in &report.issues {
            println!("  Issue: {issue:?}");
        }
    }
    println!();

    // Phase 1: screening
    measure(&mut session, Stage::Screening)?;
    for run in 0..NUM_RUNS {
        let summary = session.run_summary(Stage::Screening, run)?;
        println!(
            "  Run {}: mean {:7.2} µW, std dev {:.3}",
            run + 1,
            summary.mean,
            summary.std_dev
        );
    }
    println!();

    println!("Main effects:");
    for estimate in session.effects()? {
        let factor = session.catalogue().get(estimate.factor)?;
        println!(
            "  {:<14} low {:7.2}  high {:7.2}  effect {:+.2}",
            factor.name, estimate.mean_low, estimate.mean_high, estimate.effect
        );
    }
    println!();

    println!("Pareto:");
    for entry in session.pareto()?.entries {
        let factor = session.catalogue().get(entry.factor)?;
        println!(
            "  {}. {:<14} {:5.1}%  cumulative {:5.1}%",
            entry.rank, factor.name, entry.percentage, entry.cumulative
        );
    }
    println!();

    // Check a student's hand-computed mean of run 1
    let feedback = session.check_answer(AnswerKind::Mean, Stage::Screening, 0, 42.0)?;
    println!(
        "Answer check: entered {:.2}, expected {:.2} -> {}",
        feedback.submitted,
        feedback.expected,
        if feedback.correct { "correct" } else { "try again" }
    );
    println!();

    // Phase 2: full factorial over the selected factors
    let selection = session.select_factors()?.clone();
    println!("Selected factors:");
    for factor in session.catalogue().iter() {
        match selection.role(factor.index) {
            FactorRole::Free => println!("  {:<14} varied", factor.name),
            FactorRole::Fixed(level) => {
                println!("  {:<14} fixed at {}", factor.name, factor.label(level));
            }
        }
    }
    println!();

    measure(&mut session, Stage::FullFactorial)?;

    let model = session.regression()?;
    println!("Regression model:");
    println!("  b0 = {:.3}", model.intercept);
    for coefficient in &model.coefficients {
        let factor = session.catalogue().get(coefficient.factor)?;
        println!(
            "  b({}) = {:+.3}  optimal: {}",
            factor.name,
            coefficient.value,
            factor.label(coefficient.optimal_level)
        );
    }
    println!("  R² = {:.4}", model.r_squared);
    println!("  Predicted optimum: {:.2} µW", model.predicted_optimum);
    println!();

    let grid = session.interaction(None)?;
    let (first, second) = grid.factors;
    println!(
        "Interaction {} × {} ({:?}):",
        session.catalogue().get(first)?.name,
        session.catalogue().get(second)?.name,
        grid.fill
    );
    for cell in &grid.cells {
        println!(
            "  ({}, {}) {:7.2}{}",
            cell.first,
            cell.second,
            cell.value,
            if cell.measured { "" } else { " (interpolated)" }
        );
    }
    println!();

    let record = session.to_record();
    println!("Record ({} bytes of JSON)", record.to_json()?.len());

    Ok(())
}
