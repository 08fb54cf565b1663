//! Host-graph layer interface
//!
//! The host compute graph drives a layer through four calls:
//!
//! ```text
//! setup -> (reshape -> forward -> backward?)*
//! ```
//!
//! `bottom` tensors are the layer's inputs and `top` tensors its outputs.
//! The host serializes calls on a layer instance; every method takes
//! `&mut self`.

use crate::config::ReshapeConfig;
use featfold_core::{FeatFoldError, Result, Tensor};
use std::fmt;

/// Lifecycle state of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerState {
    /// Created, `setup` not yet called
    Uninitialized,
    /// Block size known, no input shape seen yet
    Configured,
    /// Output and padding buffer sized for the last input shape
    ShapeReady,
}

impl fmt::Display for LayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerState::Uninitialized => "uninitialized",
            LayerState::Configured => "configured",
            LayerState::ShapeReady => "shape-ready",
        };
        f.write_str(name)
    }
}

/// A layer driven by the host compute graph
pub trait Layer<T> {
    /// Stable identifier of the layer type.
    fn type_name(&self) -> &'static str;

    /// One-time initialization from the layer config.
    fn setup(
        &mut self,
        bottom: &[&Tensor<T>],
        top: &mut [Tensor<T>],
        config: &ReshapeConfig,
    ) -> Result<()>;

    /// Size `top` (and any internal buffers) for the current `bottom` shape.
    fn reshape(&mut self, bottom: &[&Tensor<T>], top: &mut [Tensor<T>]) -> Result<()>;

    /// Compute `top` data from `bottom` data.
    fn forward(&mut self, bottom: &[&Tensor<T>], top: &mut [Tensor<T>]) -> Result<()>;

    /// Compute `bottom` gradients from `top` gradients.
    ///
    /// `propagate_down[i]` tells whether `bottom[i]` needs a gradient.
    fn backward(
        &mut self,
        top: &[&Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<()>;
}

/// Require exactly one element in a host-provided slice.
pub(crate) fn exactly_one<'a, X>(operation: &str, role: &str, items: &'a [X]) -> Result<&'a X> {
    match items {
        [item] => Ok(item),
        _ => Err(FeatFoldError::tensor_count(operation, role, 1, items.len())),
    }
}

/// Mutable counterpart of [`exactly_one`].
pub(crate) fn exactly_one_mut<'a, X>(
    operation: &str,
    role: &str,
    items: &'a mut [X],
) -> Result<&'a mut X> {
    let len = items.len();
    match items {
        [item] => Ok(item),
        _ => Err(FeatFoldError::tensor_count(operation, role, 1, len)),
    }
}
