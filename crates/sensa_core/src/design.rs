//! Design matrices and the immutable `Design` value every builder returns.
//!
//! A `Design` carries everything its estimator needs (block layout,
//! trajectories, step sizes), so outputs are always interpreted against the
//! design they were produced from rather than some mutable session state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensitivityError, ensure_len};
use crate::local::LocalLayout;
use crate::morris::MorrisLayout;
use crate::options::SamplingMethod;
use crate::quasi::SeedState;
use crate::sobol::SobolLayout;

/// Row-major matrix of factor combinations; rows are trials, columns factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl DesignMatrix {
    /// Build from row vectors, each of which must have `cols` entries.
    pub fn from_rows(rows: Vec<Vec<f64>>, cols: usize) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            ensure_len("design matrix row", cols, row.len())?;
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n,
            cols,
        })
    }

    /// Build from flat row-major data.
    pub fn from_data(data: Vec<f64>, cols: usize) -> Result<Self> {
        if cols == 0 || data.len() % cols != 0 {
            return Err(SensitivityError::Configuration(format!(
                "{} values do not fill rows of {cols} columns",
                data.len()
            )));
        }
        Ok(Self {
            rows: data.len() / cols,
            data,
            cols,
        })
    }

    /// Build from per-factor columns of equal length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let cols = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        for column in columns {
            ensure_len("design matrix column", rows, column.len())?;
        }
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            data.extend(columns.iter().map(|c| c[r]));
        }
        Ok(Self { data, rows, cols })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Panics if `index >= rows`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    #[must_use]
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.iter_rows().map(|row| row[col]).collect()
    }

    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Flat row-major view
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

/// Which estimator a design feeds, with the layout that estimator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DesignKind {
    Sobol(SobolLayout),
    Morris(MorrisLayout),
    Local(LocalLayout),
    /// Random or Latin Hypercube rows, analyzed by correlation
    Sampled { method: SamplingMethod },
}

impl DesignKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DesignKind::Sobol(_) => "sobol",
            DesignKind::Morris(_) => "morris",
            DesignKind::Local(_) => "local",
            DesignKind::Sampled { method } => method.name(),
        }
    }
}

/// Immutable result of a design builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    matrix: DesignMatrix,
    factor_names: Vec<String>,
    kind: DesignKind,
    next_seed: SeedState,
}

impl Design {
    pub(crate) fn new(
        matrix: DesignMatrix,
        factor_names: Vec<String>,
        kind: DesignKind,
        next_seed: SeedState,
    ) -> Self {
        Self {
            matrix,
            factor_names,
            kind,
            next_seed,
        }
    }

    #[must_use]
    pub fn matrix(&self) -> &DesignMatrix {
        &self.matrix
    }

    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    #[must_use]
    pub fn kind(&self) -> &DesignKind {
        &self.kind
    }

    /// Seed to pass as `start_seed` to continue the quasi-random sequence
    #[must_use]
    pub fn next_seed(&self) -> SeedState {
        self.next_seed
    }

    /// Number of model evaluations the caller owes
    #[must_use]
    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    /// Fail unless there is exactly one output per design row.
    pub fn check_outputs(&self, outputs: &[f64]) -> Result<()> {
        ensure_len("model outputs", self.rows(), outputs.len())
    }
}
