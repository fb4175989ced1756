//! One-at-a-time local sensitivities around the optimal guess.
//!
//! Row 0 of the design is the base point x₀; each factor then contributes
//! x₀ + h·eᵢ (and x₀ − h·eᵢ in central mode), with h = perturbation·|x₀ᵢ|.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::design::{Design, DesignKind, DesignMatrix};
use crate::error::{Result, SensitivityError};
use crate::options::DifferenceMode;
use crate::parameter::ParameterSpace;
use crate::quasi::SeedState;

/// Base point and per-factor steps of a local design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalLayout {
    pub base: Vec<f64>,
    pub steps: Vec<f64>,
    pub difference: DifferenceMode,
}

impl LocalLayout {
    fn rows_per_factor(&self) -> usize {
        match self.difference {
            DifferenceMode::Central => 2,
            DifferenceMode::Single => 1,
        }
    }
}

/// Derivatives at the base point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSensitivities {
    pub names: Vec<String>,
    pub base_output: f64,
    /// dy/dxᵢ
    pub derivative: Vec<f64>,
    /// dy/dxᵢ · x₀ᵢ / y₀
    pub normalized: Vec<f64>,
}

fn step_for(x0: f64, perturbation: f64) -> f64 {
    if x0 == 0.0 {
        perturbation
    } else {
        perturbation * x0.abs()
    }
}

pub fn build_design(
    space: &ParameterSpace,
    perturbation: f64,
    difference: DifferenceMode,
) -> Result<Design> {
    let _span = info_span!("local_design", k = space.len(), perturbation).entered();
    if !(perturbation.is_finite() && perturbation > 0.0) {
        return Err(SensitivityError::Configuration(format!(
            "perturbation must be positive, got {perturbation}"
        )));
    }

    let base = space.optimal_guesses();
    let mut steps = Vec::with_capacity(space.len());
    let mut rows = vec![base.clone()];

    for (i, param) in space.iter().enumerate() {
        let h = step_for(base[i], perturbation);
        let mut offsets = vec![h];
        if difference == DifferenceMode::Central {
            offsets.push(-h);
        }
        for offset in offsets {
            let value = base[i] + offset;
            if !param.contains(value) {
                return Err(SensitivityError::Configuration(format!(
                    "perturbed value {value} of {:?} leaves [{}, {}]",
                    param.name(),
                    param.lower(),
                    param.upper()
                )));
            }
            let mut row = base.clone();
            row[i] = value;
            rows.push(row);
        }
        steps.push(h);
    }
    debug!(rows = rows.len(), "local design built");

    let matrix = DesignMatrix::from_rows(rows, space.len())?;
    let layout = LocalLayout {
        base,
        steps,
        difference,
    };
    Ok(Design::new(
        matrix,
        space.names(),
        DesignKind::Local(layout),
        SeedState::default(),
    ))
}

pub fn estimate(design: &Design, outputs: &[f64]) -> Result<LocalSensitivities> {
    let DesignKind::Local(layout) = design.kind() else {
        return Err(SensitivityError::UnsupportedConfiguration(format!(
            "local estimator cannot read a {} design",
            design.kind().name()
        )));
    };
    design.check_outputs(outputs)?;

    let y0 = outputs[0];
    let per_factor = layout.rows_per_factor();
    let derivative: Vec<f64> = layout
        .steps
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let plus = outputs[1 + i * per_factor];
            match layout.difference {
                DifferenceMode::Central => (plus - outputs[2 + i * per_factor]) / (2.0 * h),
                DifferenceMode::Single => (plus - y0) / h,
            }
        })
        .collect();
    let normalized = derivative
        .iter()
        .zip(&layout.base)
        .map(|(d, x0)| d * x0 / y0)
        .collect();

    Ok(LocalSensitivities {
        names: design.factor_names().to_vec(),
        base_output: y0,
        derivative,
        normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::parameter::ParameterDescriptor;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterDescriptor::new("a", 0.0, 10.0, 2.0, Distribution::Uniform).unwrap(),
            ParameterDescriptor::new("b", -1.0, 1.0, 0.0, Distribution::Uniform).unwrap(),
        ])
        .unwrap()
    }

    fn run(design: &Design, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
        design.matrix().iter_rows().map(f).collect()
    }

    #[test]
    fn test_central_design_layout() {
        let design = build_design(&space(), 0.1, DifferenceMode::Central).unwrap();
        let rows = design.matrix().to_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], vec![2.0, 0.0]);
        assert!((rows[1][0] - 2.2).abs() < 1e-12);
        assert!((rows[2][0] - 1.8).abs() < 1e-12);
        // b sits at zero, so its step is the raw perturbation
        assert_eq!(rows[3], vec![2.0, 0.1]);
        assert_eq!(rows[4], vec![2.0, -0.1]);
    }

    #[test]
    fn test_linear_derivatives() {
        for mode in [DifferenceMode::Central, DifferenceMode::Single] {
            let design = build_design(&space(), 0.05, mode).unwrap();
            let y = run(&design, |x| 3.0 * x[0] - 4.0 * x[1] + 1.0);
            let result = estimate(&design, &y).unwrap();

            assert!((result.derivative[0] - 3.0).abs() < 1e-9);
            assert!((result.derivative[1] + 4.0).abs() < 1e-9);
            // y0 = 7, x0 = (2, 0)
            assert!((result.normalized[0] - 6.0 / 7.0).abs() < 1e-9);
            assert_eq!(result.normalized[1], 0.0);
        }
    }

    #[test]
    fn test_perturbation_out_of_bounds() {
        assert!(matches!(
            build_design(&space(), 5.0, DifferenceMode::Single),
            Err(SensitivityError::Configuration(_))
        ));
        assert!(build_design(&space(), 0.0, DifferenceMode::Central).is_err());
    }
}
