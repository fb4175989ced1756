use std::fmt;

/// Errors raised by design builders and estimators.
///
/// Every variant is a local precondition failure surfaced synchronously;
/// nothing is retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum SensitivityError {
    /// Malformed descriptor or option set, raised at construction time
    Configuration(String),
    /// Two factors share the same name
    DuplicateName(String),
    /// Output vector or paired series does not line up with its counterpart
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Inverse-distribution input outside the open interval (0, 1)
    Domain { value: f64, reason: &'static str },
    /// Valid input the engine does not support (e.g. LHS on a normal factor)
    UnsupportedConfiguration(String),
    /// Conditional sampling gave up after this many rejected draws
    SamplingExhausted { attempts: usize },
}

impl fmt::Display for SensitivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            SensitivityError::DuplicateName(name) => {
                write!(f, "parameter name {name:?} is used more than once")
            }
            SensitivityError::DimensionMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "dimension mismatch in {context}: expected {expected} values, got {actual}"
            ),
            SensitivityError::Domain { value, reason } => {
                write!(f, "value {value} is outside the domain: {reason}")
            }
            SensitivityError::UnsupportedConfiguration(msg) => {
                write!(f, "unsupported configuration: {msg}")
            }
            SensitivityError::SamplingExhausted { attempts } => write!(
                f,
                "conditional sampling found no admissible point after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for SensitivityError {}

pub type Result<T> = std::result::Result<T, SensitivityError>;

/// Fail with `DimensionMismatch` unless `actual == expected`.
pub(crate) fn ensure_len(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SensitivityError::DimensionMismatch {
            context,
            expected,
            actual,
        })
    }
}
