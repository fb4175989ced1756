//! Pseudo-random and Latin Hypercube designs.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info_span};

use crate::design::{Design, DesignKind, DesignMatrix};
use crate::error::{Result, SensitivityError};
use crate::options::SamplingMethod;
use crate::parameter::ParameterSpace;
use crate::quasi::SeedState;

/// `n` rows drawn column by column with `method` (Random or LatinHypercube).
pub fn build_design(
    space: &ParameterSpace,
    n: usize,
    method: SamplingMethod,
    rng_seed: u64,
) -> Result<Design> {
    let _span = info_span!("sampled_design", %method, k = space.len(), n).entered();
    if n == 0 {
        return Err(SensitivityError::Configuration(
            "sampled design needs at least one row".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(rng_seed);
    let columns = space
        .iter()
        .map(|param| match method {
            SamplingMethod::Random => param.sample(n, &mut rng),
            SamplingMethod::LatinHypercube => param.latin_hypercube(n, &mut rng),
            other => Err(SensitivityError::UnsupportedConfiguration(format!(
                "{other} is not a pseudo-random sampling method"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let matrix = DesignMatrix::from_columns(&columns)?;
    debug!(rows = matrix.rows(), "sampled design built");
    Ok(Design::new(
        matrix,
        space.names(),
        DesignKind::Sampled { method },
        SeedState::default(),
    ))
}
