//! Analysis file format.
//!
//! ```yaml
//! model:
//!   type: ishigami
//! parameters:
//!   - { name: x1, lower: -3.1416, upper: 3.1416, optimal_guess: 0.0 }
//! analysis:
//!   method: sobol
//!   samples: 1024
//! ```

use std::path::Path;

use color_eyre::eyre::WrapErr;
use sensa_core::{MorrisOptions, ParameterDescriptor, SampleOptions, SamplingMethod};
use serde::{Deserialize, Serialize};

use crate::models::TestModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFile {
    pub model: TestModel,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl AnalysisFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&content).wrap_err_with(|| format!("failed to parse {}", path.display()))
    }
}

/// Which builder to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Morris,
    Sample(SamplingMethod),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// "morris" or any sampling method name ("sobol", "random", "lhs", "local")
    #[serde(default = "default_method")]
    pub method: String,
    /// Base sample size for sampling methods
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub sample: SampleOptions,
    #[serde(default)]
    pub morris: MorrisOptions,
    /// Report a Sobol convergence curve with this step
    #[serde(default)]
    pub convergence_step: Option<usize>,
}

fn default_method() -> String {
    "sobol".to_string()
}

fn default_samples() -> usize {
    1024
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            samples: default_samples(),
            sample: SampleOptions::default(),
            morris: MorrisOptions::default(),
            convergence_step: None,
        }
    }
}

impl AnalysisConfig {
    pub fn method(&self) -> sensa_core::Result<Method> {
        if self.method.trim().eq_ignore_ascii_case("morris") {
            Ok(Method::Morris)
        } else {
            self.method.parse().map(Method::Sample)
        }
    }
}
