//! Fitting errors.

use thiserror::Error;

/// Result type for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

/// Errors that abort a gamut's fitting run.
///
/// There is no partial-success mode: a gamut either finishes with a validly
/// written final table or the run failed.
#[derive(Debug, Error)]
pub enum FitError {
    /// A loss or parameter turned NaN/Inf during optimization. Fatal; the
    /// run is not retried.
    #[error("numerical divergence in {stage} at iteration {iteration}")]
    NumericalDivergence {
        /// Which optimization stage diverged
        stage: &'static str,
        /// Iteration (Stage A) or epoch (Stage B) index
        iteration: usize,
    },

    /// Table construction or serialization failure. Checkpoint writes
    /// propagate here and abort the gamut.
    #[error(transparent)]
    Table(#[from] rgb2spec_table::TableError),
}
