//! Estimator output, one variant per analysis family.

use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationIndices;
use crate::local::LocalSensitivities;
use crate::metrics::MetricKind;
use crate::morris::MorrisIndices;
use crate::sobol::SobolIndices;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "indices", rename_all = "snake_case")]
pub enum SensitivityResult {
    Morris(MorrisIndices),
    /// One entry per replicate
    Sobol(Vec<SobolIndices>),
    Local(LocalSensitivities),
    Correlation(CorrelationIndices),
}

impl SensitivityResult {
    /// Factor (or group) names the values are reported for
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Morris(m) => &m.names,
            Self::Sobol(replicates) => replicates
                .first()
                .map(|r| r.names.as_slice())
                .unwrap_or_default(),
            Self::Local(l) => &l.names,
            Self::Correlation(c) => &c.names,
        }
    }

    /// Per-factor values of a metric, if this result carries it.
    ///
    /// Sobol results report the first replicate; `SecondOrderTotal` is a
    /// matrix and is read from [`SobolIndices::stij`] directly.
    #[must_use]
    pub fn values(&self, metric: MetricKind) -> Option<&[f64]> {
        match (self, metric) {
            (Self::Morris(m), MetricKind::Mu) => m.mu.as_deref(),
            (Self::Morris(m), MetricKind::MuStar) => Some(&m.mu_star),
            (Self::Morris(m), MetricKind::Sigma) => m.sigma.as_deref(),
            (Self::Sobol(r), MetricKind::FirstOrder) => r.first().map(|s| s.si.as_slice()),
            (Self::Sobol(r), MetricKind::TotalOrder) => r.first().map(|s| s.st.as_slice()),
            (Self::Local(l), MetricKind::Derivative) => Some(&l.derivative),
            (Self::Local(l), MetricKind::NormalizedDerivative) => Some(&l.normalized),
            (Self::Correlation(c), MetricKind::Correlation) => Some(&c.pearson),
            _ => None,
        }
    }
}
