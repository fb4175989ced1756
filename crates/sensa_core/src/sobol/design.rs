//! Saltelli design construction from a 2k-dimensional Sobol sequence.

use tracing::{debug, info, info_span};

use super::SobolLayout;
use crate::design::{Design, DesignKind, DesignMatrix};
use crate::error::{Result, SensitivityError};
use crate::options::SampleOptions;
use crate::parameter::ParameterSpace;
use crate::quasi::{MAX_DIMENSION, SeedState, SobolSequence};

/// Seed used when the caller does not supply one; skips the origin.
pub const DEFAULT_START_SEED: SeedState = SeedState(1);

/// Column indices of a resolved `lesser < greater` constraint
#[derive(Debug, Clone, Copy)]
struct Ordering {
    lesser: usize,
    greater: usize,
}

impl Ordering {
    /// Every A/B combination must respect the order, so that the C blocks do too.
    fn admits(&self, a: &[f64], b: &[f64]) -> bool {
        let low = a[self.lesser].max(b[self.lesser]);
        let high = a[self.greater].min(b[self.greater]);
        low < high
    }
}

/// Draw one accepted (A row, B row) pair, consuming a seed per attempt.
fn draw_row(
    sequence: &SobolSequence,
    space: &ParameterSpace,
    mut seed: SeedState,
    ordering: Option<Ordering>,
    max_attempts: usize,
) -> Result<(Vec<f64>, Vec<f64>, SeedState)> {
    let k = space.len();
    for _ in 0..max_attempts {
        let (unit, next) = sequence.next(seed)?;
        seed = next;
        let (unit_a, unit_b) = unit.split_at(k);
        let a = space.rescale_point(unit_a);
        let b = space.rescale_point(unit_b);
        if ordering.is_none_or(|o| o.admits(&a, &b)) {
            return Ok((a, b, seed));
        }
    }
    Err(SensitivityError::SamplingExhausted {
        attempts: max_attempts,
    })
}

fn resolve_ordering(space: &ParameterSpace, options: &SampleOptions) -> Result<Option<Ordering>> {
    let Some(constraint) = &options.constraint else {
        return Ok(None);
    };
    let lesser = space.require(&constraint.lesser)?;
    let greater = space.require(&constraint.greater)?;
    if lesser == greater {
        return Err(SensitivityError::Configuration(format!(
            "constraint compares {:?} with itself",
            constraint.lesser
        )));
    }
    Ok(Some(Ordering { lesser, greater }))
}

/// Build `options.replicates` stacked Saltelli blocks of `n` base rows each.
pub fn build_design(space: &ParameterSpace, n: usize, options: &SampleOptions) -> Result<Design> {
    let k = space.len();
    let _span = info_span!("sobol_design", k, n, replicates = options.replicates).entered();

    if n == 0 {
        return Err(SensitivityError::Configuration(
            "sobol design needs at least one sample".to_string(),
        ));
    }
    if options.replicates == 0 {
        return Err(SensitivityError::Configuration(
            "sobol design needs at least one replicate".to_string(),
        ));
    }
    if options.max_attempts == 0 {
        return Err(SensitivityError::Configuration(
            "max_attempts must be positive".to_string(),
        ));
    }
    if 2 * k > MAX_DIMENSION {
        return Err(SensitivityError::UnsupportedConfiguration(format!(
            "sobol designs support at most {} factors, got {k}",
            MAX_DIMENSION / 2
        )));
    }
    let ordering = resolve_ordering(space, options)?;
    let sequence = SobolSequence::new(2 * k)?;

    let start_seed = options.start_seed.unwrap_or(DEFAULT_START_SEED);
    let mut seed = start_seed;
    let mut rows = Vec::with_capacity(n * (k + 2) * options.replicates);

    for replicate in 0..options.replicates {
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);
        let first = seed;
        for _ in 0..n {
            let (row_a, row_b, next) =
                draw_row(&sequence, space, seed, ordering, options.max_attempts)?;
            a.push(row_a);
            b.push(row_b);
            seed = next;
        }
        debug!(
            replicate,
            first_seed = first.0,
            draws = seed.0 - first.0,
            "replicate drawn"
        );

        rows.extend(a.iter().cloned());
        rows.extend(b.iter().cloned());
        for i in 0..k {
            rows.extend(a.iter().zip(&b).map(|(row_a, row_b)| {
                let mut c = row_a.clone();
                c[i] = row_b[i];
                c
            }));
        }
    }

    let matrix = DesignMatrix::from_rows(rows, k)?;
    info!(rows = matrix.rows(), next_seed = seed.0, "sobol design built");

    let layout = SobolLayout {
        samples: n,
        replicates: options.replicates,
        factors: k,
        start_seed,
        constraint: options.constraint.clone(),
    };
    Ok(Design::new(matrix, space.names(), DesignKind::Sobol(layout), seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SobolConstraint;
    use crate::parameter::ParameterDescriptor;

    fn space(bounds: &[(&str, f64, f64)]) -> ParameterSpace {
        ParameterSpace::new(
            bounds
                .iter()
                .map(|&(name, lo, hi)| ParameterDescriptor::uniform(name, lo, hi).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_block_structure() {
        let s = space(&[("a", 0.0, 1.0), ("b", 10.0, 20.0), ("c", -5.0, 5.0)]);
        let n = 8;
        let design = build_design(&s, n, &SampleOptions::default()).unwrap();
        let m = design.matrix();
        assert_eq!(m.rows(), n * 5);
        assert_eq!(design.next_seed(), SeedState(1 + n as u64));

        for r in 0..n {
            let a = m.row(r);
            let b = m.row(n + r);
            for i in 0..3 {
                let c = m.row((2 + i) * n + r);
                for j in 0..3 {
                    let expected = if i == j { b[j] } else { a[j] };
                    assert_eq!(c[j], expected);
                }
            }
        }
        for row in m.iter_rows() {
            assert!((0.0..=1.0).contains(&row[0]));
            assert!((10.0..=20.0).contains(&row[1]));
            assert!((-5.0..=5.0).contains(&row[2]));
        }
    }

    #[test]
    fn test_first_row_from_seed_one() {
        let s = space(&[("a", 0.0, 1.0)]);
        let design = build_design(&s, 1, &SampleOptions::default()).unwrap();
        // Seed 1 is (0.5, 0.5) in two dimensions
        assert_eq!(design.matrix().to_rows(), vec![vec![0.5], vec![0.5], vec![0.5]]);
    }

    #[test]
    fn test_replicates_continue_sequence() {
        let s = space(&[("a", 0.0, 1.0), ("b", 0.0, 1.0)]);
        let two = SampleOptions {
            replicates: 2,
            ..Default::default()
        };
        let stacked = build_design(&s, 4, &two).unwrap();
        let first = build_design(&s, 4, &SampleOptions::default()).unwrap();
        let second = build_design(
            &s,
            4,
            &SampleOptions::default().resume_from(first.next_seed()),
        )
        .unwrap();

        let mut joined = first.matrix().to_rows();
        joined.extend(second.matrix().to_rows());
        assert_eq!(stacked.matrix().to_rows(), joined);
        assert_eq!(stacked.next_seed(), second.next_seed());
    }

    #[test]
    fn test_conditional_rows_respect_order() {
        let s = space(&[("low", 0.0, 1.0), ("high", 0.3, 1.3), ("other", 0.0, 1.0)]);
        let options = SampleOptions {
            constraint: Some(SobolConstraint::new("low", "high")),
            ..Default::default()
        };
        let n = 32;
        let design = build_design(&s, n, &options).unwrap();
        assert_eq!(design.rows(), n * 5);
        assert!(design.next_seed().0 > 1 + n as u64);
        for row in design.matrix().iter_rows() {
            assert!(row[0] < row[1], "row {row:?} violates low < high");
        }
    }

    #[test]
    fn test_infeasible_constraint_exhausts() {
        let s = space(&[("low", 5.0, 10.0), ("high", 0.0, 1.0)]);
        let options = SampleOptions {
            constraint: Some(SobolConstraint::new("low", "high")),
            max_attempts: 50,
            ..Default::default()
        };
        assert_eq!(
            build_design(&s, 4, &options).unwrap_err(),
            SensitivityError::SamplingExhausted { attempts: 50 }
        );
    }

    #[test]
    fn test_invalid_requests() {
        let s = space(&[("a", 0.0, 1.0), ("b", 0.0, 1.0)]);
        assert!(build_design(&s, 0, &SampleOptions::default()).is_err());

        let unknown = SampleOptions {
            constraint: Some(SobolConstraint::new("a", "zzz")),
            ..Default::default()
        };
        assert!(matches!(
            build_design(&s, 4, &unknown),
            Err(SensitivityError::Configuration(_))
        ));

        let wide = ParameterSpace::new(
            (0..21)
                .map(|i| ParameterDescriptor::uniform(format!("x{i}"), 0.0, 1.0).unwrap())
                .collect(),
        )
        .unwrap();
        assert!(matches!(
            build_design(&wide, 4, &SampleOptions::default()),
            Err(SensitivityError::UnsupportedConfiguration(_))
        ));
    }
}
