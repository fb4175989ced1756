//! Factor descriptors and the name-unique registry holding them.

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{Result, SensitivityError};

/// Serialized form of a descriptor, validated on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    name: String,
    lower: f64,
    upper: f64,
    optimal_guess: f64,
    #[serde(default)]
    distribution: Distribution,
}

/// One bounded, distributed input factor.
///
/// Immutable once built; every constructor (including deserialization)
/// validates bounds, the optimal guess and the distribution arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct ParameterDescriptor {
    name: String,
    lower: f64,
    upper: f64,
    optimal_guess: f64,
    distribution: Distribution,
}

impl TryFrom<RawDescriptor> for ParameterDescriptor {
    type Error = SensitivityError;

    fn try_from(raw: RawDescriptor) -> Result<Self> {
        Self::new(
            raw.name,
            raw.lower,
            raw.upper,
            raw.optimal_guess,
            raw.distribution,
        )
    }
}

impl ParameterDescriptor {
    pub fn new(
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        optimal_guess: f64,
        distribution: Distribution,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SensitivityError::Configuration(
                "parameter name must not be empty".to_string(),
            ));
        }
        if !lower.is_finite() || !upper.is_finite() || !optimal_guess.is_finite() {
            return Err(SensitivityError::Configuration(format!(
                "parameter {name:?} has non-finite bounds or guess"
            )));
        }
        if lower >= upper {
            return Err(SensitivityError::Configuration(format!(
                "parameter {name:?} has inverted bounds [{lower}, {upper}]"
            )));
        }
        if optimal_guess <= lower || optimal_guess >= upper {
            return Err(SensitivityError::Configuration(format!(
                "parameter {name:?} guess {optimal_guess} is outside ({lower}, {upper})"
            )));
        }
        distribution.validate(lower, upper).map_err(|e| match e {
            SensitivityError::Configuration(msg) => {
                SensitivityError::Configuration(format!("parameter {name:?}: {msg}"))
            }
            other => other,
        })?;

        Ok(Self {
            name,
            lower,
            upper,
            optimal_guess,
            distribution,
        })
    }

    /// Uniform factor with its guess at the midpoint
    pub fn uniform(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        Self::new(
            name,
            lower,
            upper,
            lower + (upper - lower) / 2.0,
            Distribution::Uniform,
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[must_use]
    pub fn optimal_guess(&self) -> f64 {
        self.optimal_guess
    }

    #[must_use]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }

    /// Map a unit-interval coordinate onto this factor's range
    #[must_use]
    pub fn rescale(&self, unit: f64) -> f64 {
        self.distribution.rescale(unit, self.lower, self.upper)
    }

    #[must_use]
    pub fn density(&self, x: f64) -> f64 {
        self.distribution.density(x, self.lower, self.upper)
    }

    /// Draw `n` values from the factor's distribution, truncated to its bounds.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        self.distribution.sample(rng, self.lower, self.upper, n)
    }

    /// Latin Hypercube sample of size `n`.
    ///
    /// [0, 1] is cut into `n` equal strata, one value is drawn inside each, and
    /// the strata are handed out to the output slots in random order. Only
    /// defined for uniform factors.
    pub fn latin_hypercube<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        if !self.distribution.is_uniform() {
            return Err(SensitivityError::UnsupportedConfiguration(format!(
                "latin hypercube sampling needs a uniform factor, {:?} is {}",
                self.name,
                self.distribution.name()
            )));
        }
        let width = 1.0 / n as f64;
        let mut strata: Vec<f64> = (0..n)
            .map(|j| (j as f64 + rng.random::<f64>()) * width)
            .collect();
        strata.shuffle(rng);
        Ok(strata.into_iter().map(|u| self.rescale(u)).collect())
    }
}

/// Ordered registry of factors with a name → index map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ParameterDescriptor>", into = "Vec<ParameterDescriptor>")]
pub struct ParameterSpace {
    parameters: Vec<ParameterDescriptor>,
    index: FxHashMap<String, usize>,
}

impl TryFrom<Vec<ParameterDescriptor>> for ParameterSpace {
    type Error = SensitivityError;

    fn try_from(parameters: Vec<ParameterDescriptor>) -> Result<Self> {
        Self::new(parameters)
    }
}

impl From<ParameterSpace> for Vec<ParameterDescriptor> {
    fn from(space: ParameterSpace) -> Self {
        space.parameters
    }
}

impl ParameterSpace {
    pub fn new(parameters: Vec<ParameterDescriptor>) -> Result<Self> {
        if parameters.is_empty() {
            return Err(SensitivityError::Configuration(
                "at least one parameter is required".to_string(),
            ));
        }
        let mut index = FxHashMap::default();
        for (i, p) in parameters.iter().enumerate() {
            if index.insert(p.name.clone(), i).is_some() {
                return Err(SensitivityError::DuplicateName(p.name.clone()));
            }
        }
        Ok(Self { parameters, index })
    }

    /// Number of factors (k)
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ParameterDescriptor> {
        self.parameters.get(index)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.index_of(name).map(|i| &self.parameters[i])
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(ParameterDescriptor::name)
    }

    /// Look up an index, failing with a configuration error for unknown names
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| {
            SensitivityError::Configuration(format!("unknown parameter {name:?}"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    #[must_use]
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.lower).collect()
    }

    #[must_use]
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.upper).collect()
    }

    #[must_use]
    pub fn optimal_guesses(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.optimal_guess).collect()
    }

    /// Rescale a unit-cube point column by column
    #[must_use]
    pub fn rescale_point(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(&self.parameters)
            .map(|(&u, p)| p.rescale(u))
            .collect()
    }
}
