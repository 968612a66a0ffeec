//! Error types shared by the matrix library, the estimators and the pool.

use thiserror::Error;

/// Failures of the dense matrix operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is singular")]
    Singular,

    #[error("dimension mismatch in {op}: {left:?} vs {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// Failures reported by an estimator step.
///
/// None of these are fatal: the pool either keeps the prediction for the
/// cycle or retires the tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("matrix operation failed: {0}")]
    Matrix(#[from] MatrixError),

    #[error("temporal gap of {dt_ms} ms exceeds the bound of {max_ms} ms")]
    TemporalGap { dt_ms: i64, max_ms: i64 },

    #[error("estimator used before initialization")]
    NotInitialized,
}

/// Rejected tracker configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
