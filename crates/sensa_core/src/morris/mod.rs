//! Morris elementary-effects screening.
//!
//! The builder generates a pool of random one-at-a-time trajectories on a
//! p-level grid, drops duplicates, keeps the `r` most spread-out ones
//! (greedy maximization of squared inter-trajectory distance) and stacks
//! them into a design matrix. The estimator turns consecutive output pairs
//! back into elementary effects.

pub mod estimate;
pub mod select;
pub mod trajectory;

pub use estimate::{MorrisIndices, estimate};
pub use select::{Selection, distance_matrix, sampling_quality, select_optimal, unique_trajectories};
pub use trajectory::{Direction, FactorChange, Trajectory};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::design::{Design, DesignKind, DesignMatrix};
use crate::error::{Result, SensitivityError, ensure_len};
use crate::options::MorrisOptions;
use crate::parameter::ParameterSpace;
use crate::quasi::SeedState;

// ============================================================================
// Group membership
// ============================================================================

/// Serialized form: a k×g 0/1 matrix plus optional group names
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawGroups {
    matrix: Vec<Vec<u8>>,
    #[serde(default)]
    names: Vec<String>,
}

/// Assignment of every factor to exactly one non-empty group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGroups", into = "RawGroups")]
pub struct GroupMatrix {
    assignment: Vec<usize>,
    members: Vec<Vec<usize>>,
    names: Vec<String>,
}

impl TryFrom<RawGroups> for GroupMatrix {
    type Error = SensitivityError;

    fn try_from(raw: RawGroups) -> Result<Self> {
        let groups = Self::from_matrix(&raw.matrix)?;
        if raw.names.is_empty() {
            Ok(groups)
        } else {
            groups.with_names(raw.names)
        }
    }
}

impl From<GroupMatrix> for RawGroups {
    fn from(groups: GroupMatrix) -> Self {
        Self {
            matrix: groups.to_matrix(),
            names: groups.names,
        }
    }
}

impl GroupMatrix {
    /// Build from a k×g membership matrix (row = factor, column = group).
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Result<Self> {
        let width = matrix.first().map_or(0, Vec::len);
        let mut assignment = Vec::with_capacity(matrix.len());
        for (factor, row) in matrix.iter().enumerate() {
            ensure_len("group matrix row", width, row.len())?;
            let mut hits = row
                .iter()
                .enumerate()
                .filter(|&(_, &flag)| flag != 0)
                .map(|(g, _)| g);
            match (hits.next(), hits.next()) {
                (Some(group), None) => assignment.push(group),
                _ => {
                    return Err(SensitivityError::Configuration(format!(
                        "factor {factor} must belong to exactly one group"
                    )));
                }
            }
        }
        Self::build(assignment, width)
    }

    /// Build from the group index of each factor; groups are numbered from 0.
    pub fn from_assignment(assignment: Vec<usize>) -> Result<Self> {
        let count = assignment.iter().max().map_or(0, |&g| g + 1);
        Self::build(assignment, count)
    }

    fn build(assignment: Vec<usize>, count: usize) -> Result<Self> {
        if assignment.is_empty() {
            return Err(SensitivityError::Configuration(
                "group matrix has no factors".to_string(),
            ));
        }
        let mut members = vec![Vec::new(); count];
        for (factor, &group) in assignment.iter().enumerate() {
            members[group].push(factor);
        }
        if let Some(empty) = members.iter().position(Vec::is_empty) {
            return Err(SensitivityError::Configuration(format!(
                "group {empty} has no members"
            )));
        }
        let names = (1..=count).map(|g| format!("group_{g}")).collect();
        Ok(Self {
            assignment,
            members,
            names,
        })
    }

    /// Replace the generated `group_1..group_g` labels.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        ensure_len("group names", self.group_count(), names.len())?;
        self.names = names;
        Ok(self)
    }

    #[must_use]
    pub fn factor_count(&self) -> usize {
        self.assignment.len()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn group_of(&self, factor: usize) -> Option<usize> {
        self.assignment.get(factor).copied()
    }

    /// Factors in `group`; panics if the group does not exist.
    #[must_use]
    pub fn members(&self, group: usize) -> &[usize] {
        &self.members[group]
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.assignment
            .iter()
            .map(|&group| {
                let mut row = vec![0; self.group_count()];
                row[group] = 1;
                row
            })
            .collect()
    }
}

// ============================================================================
// Design layout
// ============================================================================

/// Selection diagnostics for a Morris design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorrisDiagnostics {
    pub candidates: usize,
    pub unique_candidates: usize,
    pub selected: usize,
    /// Sum of squared pairwise distances of the selected subset
    pub score: f64,
    /// Level-coverage quality of the candidate pool
    pub quality_before: f64,
    /// Level-coverage quality of the selected subset
    pub quality_after: f64,
}

/// Everything the Morris estimator needs to read a design's outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorrisLayout {
    pub trajectories: Vec<Trajectory>,
    /// Step size in unit space
    pub delta: f64,
    pub levels: usize,
    pub groups: Option<GroupMatrix>,
    /// One name per movable unit: factor names, or group names when grouped
    pub unit_names: Vec<String>,
    pub diagnostics: MorrisDiagnostics,
}

impl MorrisLayout {
    /// Points per trajectory (units + 1)
    #[must_use]
    pub fn points_per_trajectory(&self) -> usize {
        self.unit_names.len() + 1
    }

    /// Per-step changes of all trajectories in row order
    #[must_use]
    pub fn factor_changes(&self) -> Vec<FactorChange> {
        self.trajectories
            .iter()
            .flat_map(|t| t.changes().iter().copied())
            .collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

fn validate(space: &ParameterSpace, options: &MorrisOptions) -> Result<f64> {
    if options.levels < 2 {
        return Err(SensitivityError::Configuration(format!(
            "morris needs at least 2 levels, got {}",
            options.levels
        )));
    }
    if options.trajectories == 0 {
        return Err(SensitivityError::Configuration(
            "morris needs at least one trajectory".to_string(),
        ));
    }
    if options.candidates < options.trajectories {
        return Err(SensitivityError::Configuration(format!(
            "{} candidates cannot yield {} trajectories",
            options.candidates, options.trajectories
        )));
    }
    let delta = options.effective_delta();
    if !(delta > 0.0 && delta <= 1.0) {
        return Err(SensitivityError::Configuration(format!(
            "morris delta must lie in (0, 1], got {delta}"
        )));
    }
    if let Some(groups) = &options.groups {
        ensure_len("group matrix rows", space.len(), groups.factor_count())?;
    }
    Ok(delta)
}

/// Build an optimized Morris design over `space`.
pub fn build_design(space: &ParameterSpace, options: &MorrisOptions) -> Result<Design> {
    let _span = info_span!(
        "morris_design",
        k = space.len(),
        candidates = options.candidates,
        r = options.trajectories
    )
    .entered();

    let delta = validate(space, options)?;
    let grid = trajectory::base_levels(options.levels, delta);
    if grid.is_empty() {
        return Err(SensitivityError::Configuration(format!(
            "no level of a {}-level grid fits below 1 - delta ({delta})",
            options.levels
        )));
    }
    let groups = options.groups.as_ref();

    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let pool = (0..options.candidates)
        .map(|_| trajectory::random_trajectory(&mut rng, space.len(), &grid, delta, groups))
        .collect::<Result<Vec<_>>>()?;

    let unique: Vec<Trajectory> = unique_trajectories(&pool)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect();
    debug!(
        candidates = pool.len(),
        unique = unique.len(),
        "discarded duplicate trajectories"
    );

    if unique.len() < options.trajectories {
        warn!(
            unique = unique.len(),
            requested = options.trajectories,
            "fewer unique trajectories than requested, keeping all of them"
        );
    }
    let distances = distance_matrix(&unique);
    let selection = select_optimal(&distances, options.trajectories.min(unique.len()));

    let selected: Vec<Trajectory> = selection
        .indices
        .iter()
        .map(|&i| unique[i].clone())
        .collect();

    let diagnostics = MorrisDiagnostics {
        candidates: pool.len(),
        unique_candidates: unique.len(),
        selected: selected.len(),
        score: selection.score,
        quality_before: sampling_quality(&pool, options.levels),
        quality_after: sampling_quality(&selected, options.levels),
    };
    info!(
        selected = diagnostics.selected,
        quality_before = diagnostics.quality_before,
        quality_after = diagnostics.quality_after,
        "morris trajectories selected"
    );

    let rows: Vec<Vec<f64>> = selected
        .iter()
        .flat_map(|t| t.points().iter().map(|p| space.rescale_point(p)))
        .collect();
    let matrix = DesignMatrix::from_rows(rows, space.len())?;

    let unit_names = match groups {
        Some(g) => g.names().to_vec(),
        None => space.names(),
    };
    let layout = MorrisLayout {
        trajectories: selected,
        delta,
        levels: options.levels,
        groups: options.groups.clone(),
        unit_names,
        diagnostics,
    };

    Ok(Design::new(
        matrix,
        space.names(),
        DesignKind::Morris(layout),
        SeedState::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterDescriptor;

    fn space(k: usize) -> ParameterSpace {
        ParameterSpace::new(
            (0..k)
                .map(|i| ParameterDescriptor::uniform(format!("x{i}"), 0.0, 10.0).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_group_matrix_validation() {
        let groups = GroupMatrix::from_matrix(&[vec![1, 0], vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(groups.group_count(), 2);
        assert_eq!(groups.members(0), &[0, 2]);
        assert_eq!(groups.group_of(1), Some(1));
        assert_eq!(groups.names(), &["group_1", "group_2"]);

        // factor in two groups
        assert!(GroupMatrix::from_matrix(&[vec![1, 1], vec![0, 1]]).is_err());
        // factor in none
        assert!(GroupMatrix::from_matrix(&[vec![0, 0], vec![0, 1]]).is_err());
        // empty group
        assert!(GroupMatrix::from_assignment(vec![0, 2]).is_err());
    }

    #[test]
    fn test_group_matrix_serde() {
        let groups: GroupMatrix =
            serde_json::from_str(r#"{"matrix": [[1, 0], [0, 1]], "names": ["fast", "slow"]}"#)
                .unwrap();
        assert_eq!(groups.names(), &["fast", "slow"]);
        let json = serde_json::to_string(&groups).unwrap();
        let back: GroupMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, groups);

        assert!(serde_json::from_str::<GroupMatrix>(r#"{"matrix": [[1, 1]]}"#).is_err());
    }

    #[test]
    fn test_design_shape_and_bounds() {
        let options = MorrisOptions {
            candidates: 20,
            levels: 4,
            trajectories: 4,
            rng_seed: 7,
            ..Default::default()
        };
        let design = build_design(&space(3), &options).unwrap();
        assert_eq!(design.rows(), 4 * 4);
        assert_eq!(design.matrix().cols(), 3);
        for row in design.matrix().iter_rows() {
            assert!(row.iter().all(|v| (0.0..=10.0).contains(v)));
        }

        let DesignKind::Morris(layout) = design.kind() else {
            panic!("expected a morris design");
        };
        assert_eq!(layout.trajectories.len(), 4);
        assert_eq!(layout.factor_changes().len(), 4 * 3);
        assert_eq!(layout.diagnostics.selected, 4);
        assert!(layout.diagnostics.quality_after <= 1.0);
    }

    #[test]
    fn test_grouped_design_moves_groups() {
        let options = MorrisOptions {
            candidates: 10,
            trajectories: 3,
            groups: Some(GroupMatrix::from_assignment(vec![0, 1, 0, 1]).unwrap()),
            rng_seed: 3,
            ..Default::default()
        };
        let design = build_design(&space(4), &options).unwrap();
        let DesignKind::Morris(layout) = design.kind() else {
            panic!("expected a morris design");
        };
        assert_eq!(layout.points_per_trajectory(), 3);
        assert_eq!(design.rows(), 3 * 3);
        assert_eq!(layout.unit_names, vec!["group_1", "group_2"]);
    }

    #[test]
    fn test_invalid_options() {
        let s = space(2);
        let bad_levels = MorrisOptions {
            levels: 1,
            ..Default::default()
        };
        assert!(build_design(&s, &bad_levels).is_err());

        let too_few = MorrisOptions {
            candidates: 3,
            trajectories: 5,
            ..Default::default()
        };
        assert!(build_design(&s, &too_few).is_err());

        let bad_delta = MorrisOptions {
            delta: Some(1.5),
            ..Default::default()
        };
        assert!(build_design(&s, &bad_delta).is_err());

        let wrong_groups = MorrisOptions {
            groups: Some(GroupMatrix::from_assignment(vec![0, 0, 0]).unwrap()),
            ..Default::default()
        };
        assert!(matches!(
            build_design(&s, &wrong_groups),
            Err(SensitivityError::DimensionMismatch { .. })
        ));
    }
}
