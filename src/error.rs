//! Error types for the spatio-temporal GCN.
//!
//! Every error is a configuration or shape mismatch. They are raised at
//! construction time or on the first forward call and are never retried.

use thiserror::Error;

/// Errors raised while building or running the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcnError {
    /// Grid width or height is zero
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidGrid {
        /// Grid width in cells
        width: usize,
        /// Grid height in cells
        height: usize,
    },

    /// Output width cannot be split into the three convolution branches
    #[error("Hidden dimension {0} is not divisible into three equal branches")]
    IndivisibleHidden(usize),

    /// Hop count (link length) below 1
    #[error("Hop count must be at least 1, got {0}")]
    InvalidHopCount(usize),

    /// Any other inconsistent hyperparameter
    #[error("Bad configuration: {0}")]
    BadConfig(&'static str),

    /// A tensor does not have the shape the module was configured for
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Which tensor was rejected
        what: &'static str,
        /// Expected dimensions
        expected: Vec<usize>,
        /// Dimensions actually received
        actual: Vec<usize>,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, GcnError>;

impl GcnError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        GcnError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// True for errors detected from hyperparameters alone, before any tensor is seen.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, GcnError::ShapeMismatch { .. })
    }
}

/// Returns a shape error unless `actual == expected`.
pub(crate) fn ensure_dims<const D: usize>(
    what: &'static str,
    expected: [usize; D],
    actual: [usize; D],
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GcnError::shape(what, &expected, &actual))
    }
}
