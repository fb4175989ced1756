//! Optimal trajectory subset selection.
//!
//! Distance rows and greedy searches are independent per candidate, so both
//! run on rayon when the `parallel` feature is enabled.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Trajectory;

/// Indices of the first occurrence of every distinct trajectory in `pool`.
#[must_use]
pub fn unique_trajectories(pool: &[Trajectory]) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(pool.len());
    for (i, candidate) in pool.iter().enumerate() {
        if !kept
            .iter()
            .any(|&j| pool[j].aligned_distance(candidate) == 0.0)
        {
            kept.push(i);
        }
    }
    kept
}

fn distance_row(pool: &[Trajectory], a: usize) -> Vec<f64> {
    pool.iter()
        .enumerate()
        .map(|(b, other)| if a == b { 0.0 } else { pool[a].distance(other) })
        .collect()
}

/// Symmetric N×N matrix of trajectory distances (zero diagonal).
#[must_use]
pub fn distance_matrix(pool: &[Trajectory]) -> Vec<Vec<f64>> {
    #[cfg(feature = "parallel")]
    let rows = (0..pool.len())
        .into_par_iter()
        .map(|a| distance_row(pool, a))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows = (0..pool.len()).map(|a| distance_row(pool, a)).collect();

    rows
}

/// Chosen trajectory indices and their spread score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Indices into the pool, ascending
    pub indices: Vec<usize>,
    /// Sum of squared pairwise distances within the subset
    pub score: f64,
}

fn grow_from(distances: &[Vec<f64>], seed: usize, size: usize) -> Selection {
    let n = distances.len();
    let mut taken = vec![false; n];
    taken[seed] = true;
    let mut indices = vec![seed];
    let mut aggregate: Vec<f64> = distances[seed].iter().map(|d| d * d).collect();
    let mut score = 0.0;

    while indices.len() < size {
        let mut best: Option<usize> = None;
        for t in (0..n).filter(|&t| !taken[t]) {
            if best.is_none_or(|b| aggregate[t] > aggregate[b]) {
                best = Some(t);
            }
        }
        let Some(next) = best else { break };

        score += aggregate[next];
        taken[next] = true;
        indices.push(next);
        for (agg, d) in aggregate.iter_mut().zip(&distances[next]) {
            *agg += d * d;
        }
    }

    indices.sort_unstable();
    Selection { indices, score }
}

/// Greedy search for the `size` trajectories with maximal summed squared
/// distance, restarted from every candidate; ties keep the earliest seed.
#[must_use]
pub fn select_optimal(distances: &[Vec<f64>], size: usize) -> Selection {
    let n = distances.len();
    let size = size.min(n);
    if size == 0 {
        return Selection {
            indices: Vec::new(),
            score: 0.0,
        };
    }

    #[cfg(feature = "parallel")]
    let candidates: Vec<Selection> = (0..n)
        .into_par_iter()
        .map(|seed| grow_from(distances, seed, size))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let candidates: Vec<Selection> = (0..n).map(|seed| grow_from(distances, seed, size)).collect();

    let mut best: Option<Selection> = None;
    for selection in candidates {
        if best.as_ref().is_none_or(|b| selection.score > b.score) {
            best = Some(selection);
        }
    }
    best.unwrap_or(Selection {
        indices: Vec::new(),
        score: 0.0,
    })
}

/// How evenly trajectory points cover the p grid levels, 1.0 being perfect.
///
/// For each factor, points are binned to their nearest level and compared
/// with the ideal count (points / p):
/// `1 − Σ|count − ideal| / (ideal · p · k)`.
#[must_use]
pub fn sampling_quality(trajectories: &[Trajectory], levels: usize) -> f64 {
    let Some(first) = trajectories.first().and_then(|t| t.points().first()) else {
        return f64::NAN;
    };
    let k = first.len();
    let step = (levels - 1) as f64;
    let mut counts = vec![vec![0usize; levels]; k];
    let mut total = 0usize;

    for point in trajectories.iter().flat_map(Trajectory::points) {
        total += 1;
        for (factor, &x) in point.iter().enumerate() {
            let level = ((x * step).round().max(0.0) as usize).min(levels - 1);
            counts[factor][level] += 1;
        }
    }

    let ideal = total as f64 / levels as f64;
    let deviation: f64 = counts
        .iter()
        .flatten()
        .map(|&c| (c as f64 - ideal).abs())
        .sum();
    1.0 - deviation / (ideal * levels as f64 * k as f64)
}
