//! Correlation-based sensitivity for random and Latin Hypercube designs.

use serde::{Deserialize, Serialize};
use tracing::info_span;

use crate::design::{Design, DesignKind};
use crate::error::{Result, SensitivityError, ensure_len};

/// Pearson correlation of each factor column with the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationIndices {
    pub names: Vec<String>,
    pub pearson: Vec<f64>,
}

/// Pearson correlation coefficient of two paired series.
///
/// Returns NaN when either series has zero variance or fewer than two points.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    ensure_len("paired series", x.len(), y.len())?;
    let n = x.len();
    if n < 2 {
        return Ok(f64::NAN);
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    Ok(sxy / (sxx * syy).sqrt())
}

pub fn estimate(design: &Design, outputs: &[f64]) -> Result<CorrelationIndices> {
    if !matches!(design.kind(), DesignKind::Sampled { .. }) {
        return Err(SensitivityError::UnsupportedConfiguration(format!(
            "correlation needs a random or latin hypercube design, got {}",
            design.kind().name()
        )));
    }
    design.check_outputs(outputs)?;
    let _span = info_span!("correlation_estimate", rows = outputs.len()).entered();

    let pearson = (0..design.matrix().cols())
        .map(|col| pearson(&design.matrix().column(col), outputs))
        .collect::<Result<Vec<_>>>()?;
    Ok(CorrelationIndices {
        names: design.factor_names().to_vec(),
        pearson,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_known_values() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[1.0, 3.0, 2.0, 4.0]).unwrap() - 0.8).abs() < 1e-12);
        assert!(pearson(&x, &[1.0; 4]).unwrap().is_nan());
    }

    #[test]
    fn test_pearson_length_mismatch() {
        assert!(matches!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(SensitivityError::DimensionMismatch { .. })
        ));
    }
}
