//! One-at-a-time trajectories on the unit-cube level grid.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::GroupMatrix;
use crate::error::{Result, SensitivityError, ensure_len};

/// Direction a factor moved in one trajectory step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Increase => 1.0,
            Direction::Decrease => -1.0,
        }
    }
}

/// Which factor (or group) changed in a step, and which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactorChange {
    pub index: usize,
    pub direction: Direction,
}

/// Ordered unit-cube points, consecutive ones differing in a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<Vec<f64>>,
    changes: Vec<FactorChange>,
}

impl Trajectory {
    /// Assemble a trajectory from its base point, per-factor signs and the
    /// order in which units move.
    ///
    /// The walk starts at `base` for increasing factors and at `base + delta`
    /// for decreasing ones; each step moves every factor of the next unit in
    /// `order` to the other end of its interval.
    pub fn build(
        base: &[f64],
        signs: &[Direction],
        order: &[usize],
        delta: f64,
        groups: Option<&GroupMatrix>,
    ) -> Result<Self> {
        let k = base.len();
        ensure_len("trajectory signs", k, signs.len())?;
        if let Some(g) = groups {
            ensure_len("group matrix rows", k, g.factor_count())?;
        }
        let units = groups.map_or(k, GroupMatrix::group_count);
        ensure_len("trajectory order", units, order.len())?;

        let mut seen = vec![false; units];
        for &unit in order {
            if unit >= units || seen[unit] {
                return Err(SensitivityError::Configuration(format!(
                    "trajectory order is not a permutation of 0..{units}"
                )));
            }
            seen[unit] = true;
        }

        let mut current: Vec<f64> = base
            .iter()
            .zip(signs)
            .map(|(&b, sign)| match sign {
                Direction::Increase => b,
                Direction::Decrease => b + delta,
            })
            .collect();

        let mut points = Vec::with_capacity(units + 1);
        let mut changes = Vec::with_capacity(units);
        points.push(current.clone());

        for &unit in order {
            let single = [unit];
            let members: &[usize] = match groups {
                Some(g) => g.members(unit),
                None => &single,
            };
            for &i in members {
                current[i] = match signs[i] {
                    Direction::Increase => base[i] + delta,
                    Direction::Decrease => base[i],
                };
            }
            points.push(current.clone());
            changes.push(FactorChange {
                index: unit,
                direction: signs[members[0]],
            });
        }

        Ok(Self { points, changes })
    }

    #[must_use]
    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    #[must_use]
    pub fn changes(&self) -> &[FactorChange] {
        &self.changes
    }

    /// Number of points (units + 1)
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of distances between same-position points; zero only for identical trajectories.
    #[must_use]
    pub fn aligned_distance(&self, other: &Trajectory) -> f64 {
        self.points
            .iter()
            .zip(&other.points)
            .map(|(a, b)| euclidean(a, b))
            .sum()
    }

    /// Sum of distances over every pair of points, one from each trajectory.
    #[must_use]
    pub fn distance(&self, other: &Trajectory) -> f64 {
        self.points
            .iter()
            .map(|a| other.points.iter().map(|b| euclidean(a, b)).sum::<f64>())
            .sum()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Grid levels i/(p−1) a base point may take so that base + delta stays in [0, 1].
pub(crate) fn base_levels(levels: usize, delta: f64) -> Vec<f64> {
    let step = (levels - 1) as f64;
    (0..levels)
        .map(|i| i as f64 / step)
        .filter(|&x| x <= 1.0 - delta + 1e-12)
        .collect()
}

/// Random base point, signs and unit order.
pub(crate) fn random_trajectory<R: Rng + ?Sized>(
    rng: &mut R,
    k: usize,
    grid: &[f64],
    delta: f64,
    groups: Option<&GroupMatrix>,
) -> Result<Trajectory> {
    let base: Vec<f64> = (0..k)
        .map(|_| grid[rng.random_range(0..grid.len())])
        .collect();
    let signs: Vec<Direction> = (0..k)
        .map(|_| {
            if rng.random_bool(0.5) {
                Direction::Increase
            } else {
                Direction::Decrease
            }
        })
        .collect();
    let units = groups.map_or(k, GroupMatrix::group_count);
    let mut order: Vec<usize> = (0..units).collect();
    order.shuffle(rng);

    Trajectory::build(&base, &signs, &order, delta, groups)
}
