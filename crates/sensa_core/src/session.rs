//! Entry point tying parameter spaces, design builders and estimators together.
//!
//! A session only owns its `ParameterSpace`. Designs are returned to the
//! caller, evaluated externally, and handed back with their outputs, so any
//! number of designs (and sessions) can be in flight at once.

use tracing::{info, info_span};

use crate::design::{Design, DesignKind};
use crate::error::{Result, SensitivityError};
use crate::options::{MorrisOptions, SampleOptions, SamplingMethod};
use crate::parameter::{ParameterDescriptor, ParameterSpace};
use crate::results::SensitivityResult;
use crate::sobol::ConvergenceCurve;
use crate::{correlation, local, morris, sampling, sobol};

#[derive(Debug, Clone)]
pub struct SensitivitySession {
    space: ParameterSpace,
}

impl SensitivitySession {
    /// Validate the parameter list and open a session over it.
    pub fn new(parameters: Vec<ParameterDescriptor>) -> Result<Self> {
        Ok(Self::from_space(ParameterSpace::new(parameters)?))
    }

    #[must_use]
    pub fn from_space(space: ParameterSpace) -> Self {
        info!(factors = space.len(), "sensitivity session opened");
        Self { space }
    }

    #[must_use]
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    /// Build a sample design of `n` base rows.
    ///
    /// For Sobol designs the matrix holds `n·(k+2)` rows per replicate; local
    /// designs ignore `n` and always hold `1 + k` (single) or `1 + 2k`
    /// (central) rows.
    pub fn prepare_sample(&self, n: usize, options: &SampleOptions) -> Result<Design> {
        let _span = info_span!("prepare_sample", method = %options.method, n).entered();
        match options.method {
            SamplingMethod::Sobol => sobol::build_design(&self.space, n, options),
            SamplingMethod::Random | SamplingMethod::LatinHypercube => {
                sampling::build_design(&self.space, n, options.method, options.rng_seed)
            }
            SamplingMethod::Local => {
                local::build_design(&self.space, options.perturbation, options.difference)
            }
        }
    }

    /// Build an optimized Morris screening design.
    pub fn optimized_groups(&self, options: &MorrisOptions) -> Result<Design> {
        morris::build_design(&self.space, options)
    }

    /// Estimate sensitivities from outputs aligned row-for-row with `design`.
    pub fn compute_sensitivity(
        &self,
        design: &Design,
        outputs: &[f64],
    ) -> Result<SensitivityResult> {
        self.check_design(design, outputs)?;
        let _span = info_span!("compute_sensitivity", kind = design.kind().name()).entered();

        let result = match design.kind() {
            DesignKind::Sobol(_) => SensitivityResult::Sobol(sobol::estimate(design, outputs)?),
            DesignKind::Morris(_) => SensitivityResult::Morris(morris::estimate(design, outputs)?),
            DesignKind::Local(_) => SensitivityResult::Local(local::estimate(design, outputs)?),
            DesignKind::Sampled { .. } => {
                SensitivityResult::Correlation(correlation::estimate(design, outputs)?)
            }
        };
        info!(outputs = outputs.len(), "sensitivity computed");
        Ok(result)
    }

    /// Sobol indices of the first replicate at growing sample sizes.
    pub fn sobol_convergence(
        &self,
        design: &Design,
        outputs: &[f64],
        step: usize,
    ) -> Result<Vec<ConvergenceCurve>> {
        self.check_design(design, outputs)?;
        sobol::convergence(design, outputs, step)
    }

    fn check_design(&self, design: &Design, outputs: &[f64]) -> Result<()> {
        let same_factors = design.factor_names().len() == self.space.len()
            && design
                .factor_names()
                .iter()
                .zip(self.space.iter())
                .all(|(name, param)| name == param.name());
        if !same_factors {
            return Err(SensitivityError::Configuration(format!(
                "design was built for factors {:?}, session has {:?}",
                design.factor_names(),
                self.space.names()
            )));
        }
        design.check_outputs(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(names: &[&str]) -> SensitivitySession {
        SensitivitySession::new(
            names
                .iter()
                .map(|n| ParameterDescriptor::uniform(*n, 0.0, 1.0).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let params = vec![
            ParameterDescriptor::uniform("a", 0.0, 1.0).unwrap(),
            ParameterDescriptor::uniform("a", 0.0, 2.0).unwrap(),
        ];
        assert_eq!(
            SensitivitySession::new(params).unwrap_err(),
            SensitivityError::DuplicateName("a".to_string())
        );
        assert!(SensitivitySession::new(Vec::new()).is_err());
    }

    #[test]
    fn test_dispatch_by_method() {
        let s = session(&["a", "b"]);
        let sobol = s.prepare_sample(4, &SampleOptions::default()).unwrap();
        assert_eq!(sobol.rows(), 16);

        let local = s
            .prepare_sample(4, &SampleOptions::with_method(SamplingMethod::Local))
            .unwrap();
        assert_eq!(local.rows(), 5);

        let lhs = s
            .prepare_sample(7, &SampleOptions::with_method(SamplingMethod::LatinHypercube))
            .unwrap();
        assert_eq!(lhs.rows(), 7);
        let y: Vec<f64> = lhs.matrix().iter_rows().map(|x| x[0]).collect();
        let result = s.compute_sensitivity(&lhs, &y).unwrap();
        let SensitivityResult::Correlation(c) = result else {
            panic!("expected correlation indices");
        };
        assert!((c.pearson[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_foreign_design_rejected() {
        let ab = session(&["a", "b"]);
        let ac = session(&["a", "c"]);
        let design = ab.prepare_sample(4, &SampleOptions::default()).unwrap();
        let y = vec![0.0; design.rows()];
        assert!(matches!(
            ac.compute_sensitivity(&design, &y),
            Err(SensitivityError::Configuration(_))
        ));
        assert!(ab.compute_sensitivity(&design, &y).is_ok());
    }
}
