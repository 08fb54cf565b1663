//! Error types for featfold operations
//!
//! All fallible operations in the featfold crates return [`FeatFoldError`].
//! Errors are local to the call that produced them: nothing is retried and no
//! partial state is committed when a call fails.
//!
//! # Examples
//!
//! ```
//! use featfold_core::error::FeatFoldError;
//! use featfold_core::BlockSize;
//!
//! let err = BlockSize::new(0).unwrap_err();
//! assert!(matches!(err, FeatFoldError::InvalidConfiguration { .. }));
//! ```

use thiserror::Error;

/// Top-level error type for shape planning, kernels and layer lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatFoldError {
    /// A configuration value is out of range (e.g. a zero block size)
    #[error("invalid configuration: {parameter} = {value}: {reason}")]
    InvalidConfiguration {
        parameter: String,
        value: usize,
        reason: String,
    },

    /// The input tensor cannot be interpreted as `(num, channels, height, width)`
    #[error("invalid input shape {shape:?}: {reason}")]
    InvalidInputShape { shape: Vec<usize>, reason: String },

    /// A tensor or buffer disagrees with the shape computed by the last reshape
    #[error("{operation}: shape mismatch - expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An operation was called out of lifecycle order
    #[error("{operation} is not allowed while the layer is {state}")]
    InvalidState { operation: String, state: String },

    /// Wrong number of bottom/top tensors passed by the host
    #[error("{operation}: expected {expected} {role} tensor(s), got {actual}")]
    TensorCount {
        operation: String,
        role: String,
        expected: usize,
        actual: usize,
    },

    /// Conversion to or from an ndarray failed
    #[error("array conversion failed: {0}")]
    Array(String),
}

/// Result type for featfold operations
pub type Result<T> = std::result::Result<T, FeatFoldError>;

impl FeatFoldError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(
        parameter: impl Into<String>,
        value: usize,
        reason: impl Into<String>,
    ) -> Self {
        FeatFoldError::InvalidConfiguration {
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Create an invalid input shape error
    pub fn invalid_input_shape(shape: &[usize], reason: impl Into<String>) -> Self {
        FeatFoldError::InvalidInputShape {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(
        operation: impl Into<String>,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        FeatFoldError::ShapeMismatch {
            operation: operation.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: impl Into<String>, state: impl std::fmt::Display) -> Self {
        FeatFoldError::InvalidState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Create a tensor count error
    pub fn tensor_count(
        operation: impl Into<String>,
        role: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        FeatFoldError::TensorCount {
            operation: operation.into(),
            role: role.into(),
            expected,
            actual,
        }
    }
}
