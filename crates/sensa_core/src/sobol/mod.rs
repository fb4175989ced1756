//! Variance-based (Sobol) sensitivity analysis.
//!
//! The design stacks, per replicate, the Saltelli blocks [A; B; C₁; …; C_k]
//! where C_i is A with column i taken from B. The estimator reads the
//! outputs back in that exact order.

pub mod design;
pub mod estimate;

pub use design::build_design;
pub use estimate::{ConvergenceCurve, ReplicateSummary, SobolIndices, convergence, estimate};

use serde::{Deserialize, Serialize};

use crate::options::SobolConstraint;
use crate::quasi::SeedState;

/// Block layout of a Sobol design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolLayout {
    /// Rows per A/B block (N)
    pub samples: usize,
    pub replicates: usize,
    /// Number of factors (k)
    pub factors: usize,
    /// Seed the first row was drawn from
    pub start_seed: SeedState,
    pub constraint: Option<SobolConstraint>,
}

impl SobolLayout {
    /// Rows in one replicate, N·(k+2)
    #[must_use]
    pub fn replicate_rows(&self) -> usize {
        self.samples * (self.factors + 2)
    }

    /// Rows in the whole design
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.replicate_rows() * self.replicates
    }
}
