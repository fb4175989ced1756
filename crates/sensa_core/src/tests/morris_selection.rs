//! Duplicate handling and subset sizes of the Morris builder

use crate::design::DesignKind;
use crate::morris::{self, Direction, Trajectory, distance_matrix, select_optimal};
use crate::options::MorrisOptions;
use crate::parameter::{ParameterDescriptor, ParameterSpace};

fn space(k: usize) -> ParameterSpace {
    ParameterSpace::new(
        (0..k)
            .map(|i| ParameterDescriptor::uniform(format!("x{i}"), 0.0, 1.0).unwrap())
            .collect(),
    )
    .unwrap()
}

/// Same base point, signs and order produce trajectories flagged as duplicates
#[test]
fn test_identical_construction_is_duplicate() {
    use Direction::*;
    let delta = 2.0 / 3.0;
    let make = || {
        Trajectory::build(
            &[0.0, 1.0 / 3.0, 0.0],
            &[Increase, Decrease, Increase],
            &[1, 2, 0],
            delta,
            None,
        )
        .unwrap()
    };
    let other = Trajectory::build(
        &[0.0, 1.0 / 3.0, 0.0],
        &[Increase, Decrease, Decrease],
        &[1, 2, 0],
        delta,
        None,
    )
    .unwrap();

    let pool = vec![make(), other, make(), make()];
    assert_eq!(morris::unique_trajectories(&pool), vec![0, 1]);
}

/// Five candidates, five requested, but only two distinct trajectories exist
#[test]
fn test_subset_smaller_than_requested_when_pool_collapses() {
    // One factor on two levels: delta = 1, base always 0, only the sign varies
    let options = MorrisOptions {
        candidates: 5,
        levels: 2,
        trajectories: 5,
        rng_seed: 99,
        ..Default::default()
    };
    let design = morris::build_design(&space(1), &options).unwrap();
    let DesignKind::Morris(layout) = design.kind() else {
        panic!("expected a morris design");
    };

    let unique = layout.diagnostics.unique_candidates;
    assert!((1..=2).contains(&unique));
    assert_eq!(layout.trajectories.len(), unique);
    assert_eq!(layout.diagnostics.selected, unique);
    assert_eq!(design.rows(), unique * 2);
}

/// With enough distinct candidates the subset has exactly r members
#[test]
fn test_subset_size_equals_request() {
    for r in [1, 3, 6] {
        let options = MorrisOptions {
            candidates: 30,
            levels: 6,
            trajectories: r,
            rng_seed: r as u64,
            ..Default::default()
        };
        let design = morris::build_design(&space(4), &options).unwrap();
        let DesignKind::Morris(layout) = design.kind() else {
            panic!("expected a morris design");
        };
        assert_eq!(layout.trajectories.len(), r);
        assert_eq!(design.rows(), r * 5);
    }
}

/// The reported score is the summed squared distance within the kept subset
#[test]
fn test_reported_score_matches_subset() {
    let options = MorrisOptions {
        candidates: 40,
        levels: 4,
        trajectories: 5,
        rng_seed: 1,
        ..Default::default()
    };
    let design = morris::build_design(&space(5), &options).unwrap();
    let DesignKind::Morris(layout) = design.kind() else {
        panic!("expected a morris design");
    };

    let d = distance_matrix(&layout.trajectories);
    let mut chosen = 0.0;
    for i in 0..d.len() {
        for j in (i + 1)..d.len() {
            chosen += d[i][j] * d[i][j];
        }
    }
    assert!((chosen - layout.diagnostics.score).abs() < 1e-6 * chosen);
    assert_eq!(select_optimal(&d, 5).indices, vec![0, 1, 2, 3, 4]);
}
