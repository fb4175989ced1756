//! Analytic test functions with known sensitivity indices.

use rayon::prelude::*;
use sensa_core::Design;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestModel {
    /// y = c₀ + Σ cᵢ·xᵢ (coefficients list one weight per factor)
    Linear {
        #[serde(default)]
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// y = sin x₁ + a·sin² x₂ + b·x₃⁴·sin x₁, on [−π, π]³
    Ishigami {
        #[serde(default = "default_ishigami_a")]
        a: f64,
        #[serde(default = "default_ishigami_b")]
        b: f64,
    },
    /// Sobol g-function on [0, 1]^k: Π (|4xᵢ − 2| + aᵢ) / (1 + aᵢ)
    GFunction { a: Vec<f64> },
}

fn default_ishigami_a() -> f64 {
    7.0
}

fn default_ishigami_b() -> f64 {
    0.1
}

impl TestModel {
    /// Number of factors the model reads
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Self::Linear { coefficients, .. } => coefficients.len(),
            Self::Ishigami { .. } => 3,
            Self::GFunction { a } => a.len(),
        }
    }

    pub fn check_arity(&self, factors: usize) -> Result<(), String> {
        if self.arity() == factors {
            Ok(())
        } else {
            Err(format!(
                "model reads {} factors but {factors} parameters are defined",
                self.arity()
            ))
        }
    }

    #[must_use]
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        match self {
            Self::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            Self::Ishigami { a, b } => {
                x[0].sin() + a * x[1].sin().powi(2) + b * x[2].powi(4) * x[0].sin()
            }
            Self::GFunction { a } => a
                .iter()
                .zip(x)
                .map(|(ai, xi)| ((4.0 * xi - 2.0).abs() + ai) / (1.0 + ai))
                .product(),
        }
    }

    /// Evaluate every design row in parallel, keeping row order.
    #[must_use]
    pub fn evaluate_design(&self, design: &Design) -> Vec<f64> {
        let matrix = design.matrix();
        matrix
            .as_slice()
            .par_chunks_exact(matrix.cols())
            .map(|row| self.evaluate(row))
            .collect()
    }
}
