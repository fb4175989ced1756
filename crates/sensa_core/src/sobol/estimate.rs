//! Saltelli estimators for first-order, total and pairwise total indices.
//!
//! Per replicate, with Vtot the population variance of the 2N A/B outputs:
//!
//! - `Si   = mean(yB · (yC_i − yA)) / Vtot`
//! - `STi  = mean((yA − yC_i)²) / (2 · Vtot)`
//! - `STij = mean((yC_i − yC_j)²) / (2 · Vtot)` for i < j
//!
//! STij is the total index of the pair taken together, so for additive models
//! it equals STi + STj. The pure pair interaction `STi + STj − STij` is
//! reported alongside it and vanishes when i and j do not interact.
//!
//! NaN outputs are not filtered; they propagate into the indices they touch.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use super::SobolLayout;
use crate::design::{Design, DesignKind};
use crate::error::{Result, SensitivityError, ensure_len};

/// Indices for one replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolIndices {
    pub names: Vec<String>,
    /// First-order indices
    pub si: Vec<f64>,
    /// Total-order indices
    pub st: Vec<f64>,
    /// k×k matrix; entries with i < j hold STij, the rest are zero
    pub stij: Vec<Vec<f64>>,
    /// k×k matrix; entries with i < j hold STi + STj − STij, the rest are zero
    pub interaction: Vec<Vec<f64>>,
}

/// Mean and sample standard deviation of indices across replicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSummary {
    pub names: Vec<String>,
    pub replicates: usize,
    pub si_mean: Vec<f64>,
    pub si_std: Vec<f64>,
    pub st_mean: Vec<f64>,
    pub st_std: Vec<f64>,
}

/// First-order and total indices of one factor at growing sample sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceCurve {
    pub name: String,
    pub sample_sizes: Vec<usize>,
    pub si: Vec<f64>,
    pub st: Vec<f64>,
}

impl SobolIndices {
    /// Aggregate replicate results factor by factor.
    pub fn summarize(replicates: &[SobolIndices]) -> Result<ReplicateSummary> {
        let Some(first) = replicates.first() else {
            return Err(SensitivityError::Configuration(
                "no replicates to summarize".to_string(),
            ));
        };
        let k = first.names.len();
        for r in replicates {
            ensure_len("replicate first-order indices", k, r.si.len())?;
            ensure_len("replicate total indices", k, r.st.len())?;
        }

        let mut summary = ReplicateSummary {
            names: first.names.clone(),
            replicates: replicates.len(),
            si_mean: Vec::with_capacity(k),
            si_std: Vec::with_capacity(k),
            st_mean: Vec::with_capacity(k),
            st_std: Vec::with_capacity(k),
        };
        for i in 0..k {
            let si: Vec<f64> = replicates.iter().map(|r| r.si[i]).collect();
            let st: Vec<f64> = replicates.iter().map(|r| r.st[i]).collect();
            summary.si_mean.push(mean(&si));
            summary.si_std.push(sample_std(&si));
            summary.st_mean.push(mean(&st));
            summary.st_std.push(sample_std(&st));
        }
        Ok(summary)
    }

    /// Sum of first-order indices; close to 1 for additive models
    #[must_use]
    pub fn first_order_sum(&self) -> f64 {
        self.si.iter().sum()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn layout_of(design: &Design) -> Result<&SobolLayout> {
    match design.kind() {
        DesignKind::Sobol(layout) => Ok(layout),
        other => Err(SensitivityError::UnsupportedConfiguration(format!(
            "sobol estimator cannot read a {} design",
            other.name()
        ))),
    }
}

/// One replicate's outputs, split into its Saltelli blocks
struct Blocks<'a> {
    y: &'a [f64],
    n: usize,
    k: usize,
}

impl Blocks<'_> {
    fn a(&self, used: usize) -> &[f64] {
        &self.y[..used]
    }

    fn b(&self, used: usize) -> &[f64] {
        &self.y[self.n..self.n + used]
    }

    fn c(&self, i: usize, used: usize) -> &[f64] {
        let start = (2 + i) * self.n;
        &self.y[start..start + used]
    }

    /// Population variance over the first `used` rows of A and B
    fn total_variance(&self, used: usize) -> f64 {
        let pooled = || self.a(used).iter().chain(self.b(used));
        let count = (2 * used) as f64;
        let m = pooled().sum::<f64>() / count;
        pooled().map(|v| (v - m) * (v - m)).sum::<f64>() / count
    }

    fn first_order(&self, i: usize, used: usize, vtot: f64) -> f64 {
        let sum: f64 = self
            .b(used)
            .iter()
            .zip(self.c(i, used))
            .zip(self.a(used))
            .map(|((yb, yc), ya)| yb * (yc - ya))
            .sum();
        sum / used as f64 / vtot
    }

    fn total_order(&self, i: usize, used: usize, vtot: f64) -> f64 {
        let sum: f64 = self
            .a(used)
            .iter()
            .zip(self.c(i, used))
            .map(|(ya, yc)| (ya - yc) * (ya - yc))
            .sum();
        sum / used as f64 / (2.0 * vtot)
    }

    fn pair_total(&self, i: usize, j: usize, vtot: f64) -> f64 {
        let sum: f64 = self
            .c(i, self.n)
            .iter()
            .zip(self.c(j, self.n))
            .map(|(yi, yj)| (yi - yj) * (yi - yj))
            .sum();
        sum / self.n as f64 / (2.0 * vtot)
    }

    fn indices(&self, names: &[String]) -> SobolIndices {
        let vtot = self.total_variance(self.n);
        let si = (0..self.k).map(|i| self.first_order(i, self.n, vtot)).collect();
        let st: Vec<f64> = (0..self.k).map(|i| self.total_order(i, self.n, vtot)).collect();
        let mut stij = vec![vec![0.0; self.k]; self.k];
        let mut interaction = vec![vec![0.0; self.k]; self.k];
        for i in 0..self.k {
            for j in (i + 1)..self.k {
                stij[i][j] = self.pair_total(i, j, vtot);
                interaction[i][j] = st[i] + st[j] - stij[i][j];
            }
        }
        SobolIndices {
            names: names.to_vec(),
            si,
            st,
            stij,
            interaction,
        }
    }
}

/// Indices for every replicate of `design`, in replicate order.
pub fn estimate(design: &Design, outputs: &[f64]) -> Result<Vec<SobolIndices>> {
    let layout = layout_of(design)?;
    design.check_outputs(outputs)?;
    ensure_len("sobol outputs", layout.total_rows(), outputs.len())?;
    let _span = info_span!(
        "sobol_estimate",
        n = layout.samples,
        k = layout.factors,
        replicates = layout.replicates
    )
    .entered();

    let results: Vec<SobolIndices> = outputs
        .chunks_exact(layout.replicate_rows())
        .map(|y| {
            Blocks {
                y,
                n: layout.samples,
                k: layout.factors,
            }
            .indices(design.factor_names())
        })
        .collect();

    for (r, indices) in results.iter().enumerate() {
        debug!(
            replicate = r,
            first_order_sum = indices.first_order_sum(),
            "replicate estimated"
        );
    }
    Ok(results)
}

/// Si and STi of the first replicate recomputed on its first
/// `step, 2·step, …, N` rows.
pub fn convergence(design: &Design, outputs: &[f64], step: usize) -> Result<Vec<ConvergenceCurve>> {
    let layout = layout_of(design)?;
    design.check_outputs(outputs)?;
    ensure_len("sobol outputs", layout.total_rows(), outputs.len())?;
    if step == 0 {
        return Err(SensitivityError::Configuration(
            "convergence step must be positive".to_string(),
        ));
    }
    let _span = info_span!("sobol_convergence", n = layout.samples, step).entered();

    let blocks = Blocks {
        y: &outputs[..layout.replicate_rows()],
        n: layout.samples,
        k: layout.factors,
    };
    let mut sizes: Vec<usize> = (step..=layout.samples).step_by(step).collect();
    if sizes.last() != Some(&layout.samples) {
        sizes.push(layout.samples);
    }

    let mut curves: Vec<ConvergenceCurve> = design
        .factor_names()
        .iter()
        .map(|name| ConvergenceCurve {
            name: name.clone(),
            sample_sizes: sizes.clone(),
            si: Vec::with_capacity(sizes.len()),
            st: Vec::with_capacity(sizes.len()),
        })
        .collect();

    for &used in &sizes {
        let vtot = blocks.total_variance(used);
        for (i, curve) in curves.iter_mut().enumerate() {
            curve.si.push(blocks.first_order(i, used, vtot));
            curve.st.push(blocks.total_order(i, used, vtot));
        }
    }
    Ok(curves)
}
