//! Sobol low-discrepancy sequence.
//!
//! Bratley–Fox direction numbers for up to 40 dimensions and 30 bits. Points
//! are addressed by a `SeedState` (the sequence index), so generation is
//! deterministic and resumable: `next` hands back the seed of the following
//! point and callers thread it forward.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensitivityError};
use crate::parameter::ParameterSpace;

/// Maximum supported dimension
pub const MAX_DIMENSION: usize = 40;

const BITS: usize = 30;
const SCALE: f64 = (1u64 << BITS) as f64;

/// Primitive polynomials, one per dimension; the degree is the highest set bit
const POLYNOMIALS: [u32; MAX_DIMENSION] = [
    1, 3, 7, 11, 13, 19, 25, 37, 59, 47, 61, 55, 41, 67, 97, 91, 109, 103, 115, 131, 193, 137, 145,
    143, 241, 157, 185, 167, 229, 171, 213, 191, 253, 203, 211, 239, 247, 285, 369, 299,
];

/// Initial direction numbers m₁..m_s per dimension
const INITIAL: [&[u32]; MAX_DIMENSION] = [
    &[1],
    &[1],
    &[1, 1],
    &[1, 3, 7],
    &[1, 1, 5],
    &[1, 3, 1, 1],
    &[1, 1, 3, 7],
    &[1, 3, 3, 9, 9],
    &[1, 3, 7, 13, 3],
    &[1, 1, 5, 11, 27],
    &[1, 3, 5, 1, 15],
    &[1, 1, 7, 3, 29],
    &[1, 3, 7, 7, 21],
    &[1, 1, 1, 9, 23, 37],
    &[1, 3, 3, 5, 19, 33],
    &[1, 1, 3, 13, 11, 7],
    &[1, 1, 7, 13, 25, 5],
    &[1, 3, 5, 11, 7, 11],
    &[1, 1, 1, 3, 13, 39],
    &[1, 3, 1, 15, 17, 63, 13],
    &[1, 1, 5, 5, 1, 27, 33],
    &[1, 3, 3, 3, 25, 17, 115],
    &[1, 1, 3, 15, 29, 15, 41],
    &[1, 3, 1, 7, 3, 23, 79],
    &[1, 3, 7, 9, 31, 29, 17],
    &[1, 1, 5, 13, 11, 3, 29],
    &[1, 3, 1, 9, 5, 21, 119],
    &[1, 1, 3, 1, 23, 13, 75],
    &[1, 3, 3, 11, 27, 31, 73],
    &[1, 1, 7, 7, 19, 25, 105],
    &[1, 3, 5, 5, 21, 9, 7],
    &[1, 1, 1, 15, 5, 49, 59],
    &[1, 1, 1, 1, 1, 33, 65],
    &[1, 3, 5, 15, 17, 19, 21],
    &[1, 1, 7, 11, 13, 29, 3],
    &[1, 3, 7, 5, 7, 11, 113],
    &[1, 1, 5, 3, 15, 19, 61],
    &[1, 3, 1, 1, 9, 27, 89, 7],
    &[1, 1, 3, 7, 31, 15, 45, 23],
    &[1, 3, 3, 9, 9, 25, 107, 39],
];

/// Index of the next point to emit from a quasi-random sequence
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SeedState(pub u64);

impl SeedState {
    /// Largest seed the 30-bit tables can address
    pub const MAX: SeedState = SeedState((1u64 << BITS) - 1);

    #[must_use]
    pub fn advance(self, count: u64) -> SeedState {
        SeedState(self.0 + count)
    }
}

fn direction_numbers(dim: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    if dim == 0 {
        v.fill(1);
    } else {
        let poly = POLYNOMIALS[dim];
        let degree = (u32::BITS - 1 - poly.leading_zeros()) as usize;
        let initial = INITIAL[dim];
        v[..degree].copy_from_slice(&initial[..degree]);

        for j in degree..BITS {
            let mut value = v[j - degree];
            for k in 1..=degree {
                // Coefficient of x^(degree-k), read from the polynomial bits
                if (poly >> (degree - k)) & 1 == 1 {
                    value ^= v[j - k] << k;
                }
            }
            v[j] = value;
        }
    }

    for (j, value) in v.iter_mut().enumerate() {
        *value <<= BITS - 1 - j;
    }
    v
}

/// Sobol sequence over a fixed number of dimensions.
#[derive(Debug, Clone)]
pub struct SobolSequence {
    directions: Vec<[u32; BITS]>,
}

impl SobolSequence {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 || dimension > MAX_DIMENSION {
            return Err(SensitivityError::UnsupportedConfiguration(format!(
                "sobol sequence dimension must be in 1..={MAX_DIMENSION}, got {dimension}"
            )));
        }
        Ok(Self {
            directions: (0..dimension).map(direction_numbers).collect(),
        })
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.directions.len()
    }

    /// Point at `seed` in the unit cube, plus the seed of the point after it.
    pub fn next(&self, seed: SeedState) -> Result<(Vec<f64>, SeedState)> {
        if seed > SeedState::MAX {
            return Err(SensitivityError::UnsupportedConfiguration(format!(
                "sobol sequence exhausted at seed {}",
                seed.0
            )));
        }
        let gray = seed.0 ^ (seed.0 >> 1);
        let point = self
            .directions
            .iter()
            .map(|dirs| {
                let mut x = 0u32;
                for (bit, d) in dirs.iter().enumerate() {
                    if (gray >> bit) & 1 == 1 {
                        x ^= d;
                    }
                }
                f64::from(x) / SCALE
            })
            .collect();
        Ok((point, seed.advance(1)))
    }

    /// `count` consecutive points starting at `seed`.
    pub fn points(&self, count: usize, seed: SeedState) -> Result<(Vec<Vec<f64>>, SeedState)> {
        let mut points = Vec::with_capacity(count);
        let mut seed = seed;
        for _ in 0..count {
            let (point, next) = self.next(seed)?;
            points.push(point);
            seed = next;
        }
        Ok((points, seed))
    }

    /// Next point rescaled onto the factor ranges of `space`.
    pub fn next_scaled(
        &self,
        space: &ParameterSpace,
        seed: SeedState,
    ) -> Result<(Vec<f64>, SeedState)> {
        crate::error::ensure_len("sobol point dimension", space.len(), self.dimension())?;
        let (unit, next) = self.next(seed)?;
        Ok((space.rescale_point(&unit), next))
    }
}

/// One-shot form of [`SobolSequence::next`].
pub fn next_point(dimension: usize, seed: SeedState) -> Result<(Vec<f64>, SeedState)> {
    SobolSequence::new(dimension)?.next(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterDescriptor;

    #[test]
    fn test_first_points() {
        let seq = SobolSequence::new(2).unwrap();
        let (points, next) = seq.points(5, SeedState(0)).unwrap();
        let expected = [
            [0.0, 0.0],
            [0.5, 0.5],
            [0.75, 0.25],
            [0.25, 0.75],
            [0.375, 0.375],
        ];
        for (p, e) in points.iter().zip(expected) {
            assert_eq!(p.as_slice(), e.as_slice());
        }
        assert_eq!(next, SeedState(5));
    }

    #[test]
    fn test_resume_matches_single_run() {
        let seq = SobolSequence::new(7).unwrap();
        let (all, end_all) = seq.points(40, SeedState(3)).unwrap();
        let (first, mid) = seq.points(15, SeedState(3)).unwrap();
        let (second, end) = seq.points(25, mid).unwrap();

        assert_eq!(mid, SeedState(18));
        assert_eq!(end, end_all);
        let joined: Vec<Vec<f64>> = first.into_iter().chain(second).collect();
        assert_eq!(joined, all);
    }

    #[test]
    fn test_points_are_distinct_and_in_unit_cube() {
        let seq = SobolSequence::new(MAX_DIMENSION).unwrap();
        let (points, _) = seq.points(512, SeedState(0)).unwrap();
        for p in &points {
            assert!(p.iter().all(|x| (0.0..1.0).contains(x)));
        }
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert_ne!(points[i], points[j]);
            }
        }
    }

    #[test]
    fn test_each_dimension_is_stratified() {
        // The first 2^m points hit every dyadic interval of width 2^-m once
        let seq = SobolSequence::new(10).unwrap();
        let (points, _) = seq.points(64, SeedState(0)).unwrap();
        for dim in 0..10 {
            let mut cells: Vec<usize> = points.iter().map(|p| (p[dim] * 64.0) as usize).collect();
            cells.sort_unstable();
            assert_eq!(cells, (0..64).collect::<Vec<_>>(), "dimension {dim}");
        }
    }

    #[test]
    fn test_dimension_limits() {
        assert!(SobolSequence::new(0).is_err());
        assert!(SobolSequence::new(MAX_DIMENSION + 1).is_err());
        assert!(next_point(3, SeedState(SeedState::MAX.0 + 1)).is_err());
    }

    #[test]
    fn test_next_scaled() {
        let space = ParameterSpace::new(vec![
            ParameterDescriptor::uniform("a", 10.0, 20.0).unwrap(),
            ParameterDescriptor::uniform("b", -1.0, 1.0).unwrap(),
        ])
        .unwrap();
        let seq = SobolSequence::new(2).unwrap();
        let (point, next) = seq.next_scaled(&space, SeedState(2)).unwrap();
        assert_eq!(point, vec![17.5, -0.5]);
        assert_eq!(next, SeedState(3));
    }
}
