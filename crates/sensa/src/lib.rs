//! Command-line harness for sensa_core.
//!
//! Loads an analysis file (factors, a built-in analytic model and the method
//! to run), builds the design, evaluates the model on every row in parallel
//! and renders the resulting indices as a plain-text table.

pub mod config;
pub mod logging;
pub mod models;
pub mod report;

pub use config::{AnalysisConfig, AnalysisFile, Method};
pub use logging::init_logging;
pub use models::TestModel;

use color_eyre::eyre::{WrapErr, eyre};
use sensa_core::{ConvergenceCurve, Design, SensitivityResult, SensitivitySession};

/// Everything produced by one analysis run
#[derive(Debug)]
pub struct Analysis {
    pub design: Design,
    pub result: SensitivityResult,
    pub convergence: Option<Vec<ConvergenceCurve>>,
}

/// Run the analysis described by `file`.
pub fn run(file: &AnalysisFile) -> color_eyre::Result<Analysis> {
    let session = SensitivitySession::new(file.parameters.clone())
        .wrap_err("invalid parameter list")?;
    file.model
        .check_arity(session.space().len())
        .map_err(|msg| eyre!(msg))?;

    let method = file.analysis.method()?;
    let design = match method {
        Method::Morris => session.optimized_groups(&file.analysis.morris)?,
        Method::Sample(sampling) => {
            let mut options = file.analysis.sample.clone();
            options.method = sampling;
            session.prepare_sample(file.analysis.samples, &options)?
        }
    };
    tracing::info!(
        method = %file.analysis.method,
        rows = design.rows(),
        "design ready, evaluating model"
    );

    let outputs = file.model.evaluate_design(&design);
    let result = session.compute_sensitivity(&design, &outputs)?;

    let convergence = match (file.analysis.convergence_step, &result) {
        (Some(step), SensitivityResult::Sobol(_)) => {
            Some(session.sobol_convergence(&design, &outputs, step)?)
        }
        _ => None,
    };

    Ok(Analysis {
        design,
        result,
        convergence,
    })
}
