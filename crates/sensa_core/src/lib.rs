//! Global sensitivity analysis engine
//!
//! This crate designs samples of a bounded factor space and estimates, from
//! model outputs supplied by the caller, how strongly each factor drives the
//! output. It supports:
//! - Factor descriptors with uniform, triangular, trapezoidal, normal and
//!   log-normal distributions
//! - A resumable Sobol low-discrepancy sequence (up to 40 dimensions)
//! - Morris screening with optimized trajectory selection and factor groups
//! - Sobol first-order, total and pairwise total indices, with replicates,
//!   conditional sampling and a convergence diagnostic
//! - Local one-at-a-time derivatives and correlation on random or Latin
//!   Hypercube samples
//!
//! The model itself is never run here: build a [`Design`], evaluate every row
//! of its matrix, and pass the outputs back in row order.
//!
//! ```ignore
//! use sensa_core::{ParameterDescriptor, SampleOptions, SensitivitySession};
//!
//! let session = SensitivitySession::new(vec![
//!     ParameterDescriptor::uniform("x1", 0.0, 1.0)?,
//!     ParameterDescriptor::uniform("x2", 0.0, 1.0)?,
//! ])?;
//! let design = session.prepare_sample(1024, &SampleOptions::default())?;
//! let outputs: Vec<f64> = design.matrix().iter_rows().map(|x| x[0] + 2.0 * x[1]).collect();
//! let result = session.compute_sensitivity(&design, &outputs)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod correlation;
pub mod design;
pub mod distribution;
pub mod error;
pub mod local;
pub mod metrics;
pub mod morris;
pub mod parameter;
pub mod quasi;
pub mod results;
pub mod sampling;
pub mod session;
pub mod sobol;

// ============================================================================
// Configuration
// ============================================================================

pub mod options;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use design::{Design, DesignKind, DesignMatrix};
pub use distribution::{Distribution, inverse_standard_normal};
pub use error::{Result, SensitivityError};
pub use metrics::MetricKind;
pub use morris::{GroupMatrix, MorrisIndices};
pub use options::{
    DifferenceMode, MorrisOptions, SampleOptions, SamplingMethod, SobolConstraint,
};
pub use parameter::{ParameterDescriptor, ParameterSpace};
pub use quasi::{SeedState, SobolSequence};
pub use results::SensitivityResult;
pub use session::SensitivitySession;
pub use sobol::{ConvergenceCurve, SobolIndices};
