//! Option sets accepted by the design builders.
//!
//! Everything here is plain serde data with defaults, so an analysis can be
//! described in a config file and handed straight to the session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SensitivityError;
use crate::morris::GroupMatrix;
use crate::quasi::SeedState;

/// How `prepare_sample` fills the design matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMethod {
    /// Saltelli A/B/C blocks from a Sobol sequence, for variance decomposition
    #[default]
    Sobol,
    /// Independent pseudo-random draws from each factor's distribution
    Random,
    /// One stratified sample per row and factor (uniform factors only)
    LatinHypercube,
    /// One-at-a-time perturbation around the optimal guess
    Local,
}

impl SamplingMethod {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SamplingMethod::Sobol => "sobol",
            SamplingMethod::Random => "random",
            SamplingMethod::LatinHypercube => "latin_hypercube",
            SamplingMethod::Local => "local",
        }
    }
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SamplingMethod {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sobol" | "saltelli" => Ok(SamplingMethod::Sobol),
            "random" | "monte_carlo" => Ok(SamplingMethod::Random),
            "lhs" | "latin_hypercube" | "latin-hypercube" => Ok(SamplingMethod::LatinHypercube),
            "local" | "oat" => Ok(SamplingMethod::Local),
            other => Err(SensitivityError::UnsupportedConfiguration(format!(
                "unknown sampling method {other:?}"
            ))),
        }
    }
}

/// Finite-difference scheme for local designs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceMode {
    /// (y(x + h) − y(x − h)) / 2h
    #[default]
    Central,
    /// (y(x + h) − y(x)) / h
    Single,
}

impl FromStr for DifferenceMode {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "central" => Ok(DifferenceMode::Central),
            "single" | "forward" => Ok(DifferenceMode::Single),
            other => Err(SensitivityError::UnsupportedConfiguration(format!(
                "unknown difference mode {other:?}, expected \"central\" or \"single\""
            ))),
        }
    }
}

/// Ordering constraint `lesser < greater` between two named factors,
/// enforced by rejection in conditional Sobol sampling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SobolConstraint {
    pub lesser: String,
    pub greater: String,
}

impl SobolConstraint {
    pub fn new(lesser: impl Into<String>, greater: impl Into<String>) -> Self {
        Self {
            lesser: lesser.into(),
            greater: greater.into(),
        }
    }
}

/// Options for `SensitivitySession::prepare_sample`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOptions {
    #[serde(default)]
    pub method: SamplingMethod,
    /// Independent Sobol replicates
    #[serde(default = "default_replicates")]
    pub replicates: usize,
    /// Relative step for local designs (h = perturbation·|x₀|)
    #[serde(default = "default_perturbation")]
    pub perturbation: f64,
    #[serde(default)]
    pub difference: DifferenceMode,
    /// Quasi-random seed to start from; Sobol designs default to 1 (skips the origin)
    #[serde(default)]
    pub start_seed: Option<SeedState>,
    /// Seed for pseudo-random methods
    #[serde(default)]
    pub rng_seed: u64,
    /// Conditional Sobol sampling
    #[serde(default)]
    pub constraint: Option<SobolConstraint>,
    /// Draws allowed per accepted row under a constraint
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_replicates() -> usize {
    1
}

fn default_perturbation() -> f64 {
    0.01
}

fn default_max_attempts() -> usize {
    1000
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            method: SamplingMethod::default(),
            replicates: default_replicates(),
            perturbation: default_perturbation(),
            difference: DifferenceMode::default(),
            start_seed: None,
            rng_seed: 0,
            constraint: None,
            max_attempts: default_max_attempts(),
        }
    }
}

impl SampleOptions {
    #[must_use]
    pub fn with_method(method: SamplingMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Continue a quasi-random sequence where an earlier design stopped
    #[must_use]
    pub fn resume_from(mut self, seed: SeedState) -> Self {
        self.start_seed = Some(seed);
        self
    }
}

/// Options for `SensitivitySession::optimized_groups`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorrisOptions {
    /// Candidate trajectories generated before optimization (N)
    #[serde(default = "default_candidates")]
    pub candidates: usize,
    /// Grid levels per factor (p)
    #[serde(default = "default_levels")]
    pub levels: usize,
    /// Trajectories kept after optimization (r)
    #[serde(default = "default_trajectories")]
    pub trajectories: usize,
    /// Step size in unit space; defaults to p / (2·(p − 1))
    #[serde(default)]
    pub delta: Option<f64>,
    /// Factors that move together
    #[serde(default)]
    pub groups: Option<GroupMatrix>,
    #[serde(default)]
    pub rng_seed: u64,
}

fn default_candidates() -> usize {
    100
}

fn default_levels() -> usize {
    4
}

fn default_trajectories() -> usize {
    10
}

impl Default for MorrisOptions {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            levels: default_levels(),
            trajectories: default_trajectories(),
            delta: None,
            groups: None,
            rng_seed: 0,
        }
    }
}

impl MorrisOptions {
    /// Step size actually used
    #[must_use]
    pub fn effective_delta(&self) -> f64 {
        self.delta
            .unwrap_or_else(|| self.levels as f64 / (2.0 * (self.levels as f64 - 1.0)))
    }
}
