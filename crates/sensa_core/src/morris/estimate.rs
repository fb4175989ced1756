//! Elementary effects and their summary statistics.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use super::MorrisLayout;
use crate::design::{Design, DesignKind};
use crate::error::{Result, SensitivityError, ensure_len};

/// Morris screening statistics, one entry per factor (or group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorrisIndices {
    pub names: Vec<String>,
    /// Mean signed effect; `None` for grouped designs
    pub mu: Option<Vec<f64>>,
    /// Mean absolute effect
    pub mu_star: Vec<f64>,
    /// Sample standard deviation of signed effects; `None` for grouped designs
    pub sigma: Option<Vec<f64>>,
    /// Raw elementary effects per unit, in trajectory order
    pub effects: Vec<Vec<f64>>,
}

/// Compute Morris statistics from outputs aligned row-for-row with `design`.
pub fn estimate(design: &Design, outputs: &[f64]) -> Result<MorrisIndices> {
    let DesignKind::Morris(layout) = design.kind() else {
        return Err(SensitivityError::UnsupportedConfiguration(format!(
            "morris estimator cannot read a {} design",
            design.kind().name()
        )));
    };
    design.check_outputs(outputs)?;
    from_layout(layout, outputs)
}

pub(crate) fn from_layout(layout: &MorrisLayout, outputs: &[f64]) -> Result<MorrisIndices> {
    let _span = info_span!("morris_estimate", trajectories = layout.trajectories.len()).entered();

    let per_trajectory = layout.points_per_trajectory();
    ensure_len(
        "morris outputs",
        layout.trajectories.len() * per_trajectory,
        outputs.len(),
    )?;

    let units = layout.unit_names.len();
    let mut effects = vec![Vec::with_capacity(layout.trajectories.len()); units];
    for (t, (trajectory, y)) in layout
        .trajectories
        .iter()
        .zip(outputs.chunks_exact(per_trajectory))
        .enumerate()
    {
        for (step, change) in trajectory.changes().iter().enumerate() {
            let effect = change.direction.sign() * (y[step + 1] - y[step]) / layout.delta;
            effects[change.index].push(effect);
        }
        debug!(trajectory = t, "elementary effects computed");
    }

    let mu_star: Vec<f64> = effects
        .iter()
        .map(|e| mean(non_nan(e).map(f64::abs)))
        .collect();

    let (mu, sigma) = if layout.groups.is_some() {
        (None, None)
    } else {
        let mu = effects.iter().map(|e| mean(non_nan(e))).collect();
        let sigma = effects.iter().map(|e| sample_std(e)).collect();
        (Some(mu), Some(sigma))
    };

    Ok(MorrisIndices {
        names: layout.unit_names.clone(),
        mu,
        mu_star,
        sigma,
        effects,
    })
}

fn non_nan(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

fn sample_std(values: &[f64]) -> f64 {
    let kept: Vec<f64> = non_nan(values).collect();
    if kept.len() < 2 {
        return f64::NAN;
    }
    let m = mean(kept.iter().copied());
    let ss: f64 = kept.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (kept.len() - 1) as f64).sqrt()
}
