//! Statistic kinds reported by the estimators, with display metadata.

use serde::{Deserialize, Serialize};

use crate::results::SensitivityResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Mu,
    MuStar,
    Sigma,
    FirstOrder,
    TotalOrder,
    SecondOrderTotal,
    Correlation,
    Derivative,
    NormalizedDerivative,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        Self::Mu,
        Self::MuStar,
        Self::Sigma,
        Self::FirstOrder,
        Self::TotalOrder,
        Self::SecondOrderTotal,
        Self::Correlation,
        Self::Derivative,
        Self::NormalizedDerivative,
    ];

    /// Short column header
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Mu => "mu",
            Self::MuStar => "mu*",
            Self::Sigma => "sigma",
            Self::FirstOrder => "Si",
            Self::TotalOrder => "STi",
            Self::SecondOrderTotal => "STij",
            Self::Correlation => "r",
            Self::Derivative => "dy/dx",
            Self::NormalizedDerivative => "dy/dx*x/y",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mu => "Mean elementary effect",
            Self::MuStar => "Mean absolute elementary effect",
            Self::Sigma => "Elementary effect standard deviation",
            Self::FirstOrder => "First-order index",
            Self::TotalOrder => "Total-order index",
            Self::SecondOrderTotal => "Pairwise total index",
            Self::Correlation => "Pearson correlation",
            Self::Derivative => "Local derivative",
            Self::NormalizedDerivative => "Normalized local derivative",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Mu => {
                "Average signed change in output per unit step of the factor; \
                 opposite signs across the space can cancel out"
            }
            Self::MuStar => {
                "Average magnitude of the output change per unit step; ranks \
                 factors by overall influence"
            }
            Self::Sigma => {
                "Spread of the elementary effects; large values indicate \
                 non-linearity or interactions with other factors"
            }
            Self::FirstOrder => {
                "Share of output variance explained by the factor alone"
            }
            Self::TotalOrder => {
                "Share of output variance involving the factor, including all \
                 of its interactions"
            }
            Self::SecondOrderTotal => {
                "Share of output variance involving either factor of a pair, \
                 including their interactions; equals STi + STj for an additive \
                 model, so read the pair interaction matrix (STi + STj - STij) \
                 for the effect of the pair acting together"
            }
            Self::Correlation => {
                "Linear correlation between the sampled factor values and the output"
            }
            Self::Derivative => "Partial derivative of the output at the optimal guess",
            Self::NormalizedDerivative => {
                "Partial derivative scaled by factor value over output, i.e. the \
                 relative output change per relative factor change"
            }
        }
    }

    /// Metrics carried by `result`, in reporting order.
    #[must_use]
    pub fn for_result(result: &SensitivityResult) -> Vec<MetricKind> {
        match result {
            SensitivityResult::Morris(m) if m.mu.is_some() => {
                vec![Self::Mu, Self::MuStar, Self::Sigma]
            }
            SensitivityResult::Morris(_) => vec![Self::MuStar],
            SensitivityResult::Sobol(_) => {
                vec![Self::FirstOrder, Self::TotalOrder, Self::SecondOrderTotal]
            }
            SensitivityResult::Local(_) => vec![Self::Derivative, Self::NormalizedDerivative],
            SensitivityResult::Correlation(_) => vec![Self::Correlation],
        }
    }
}
