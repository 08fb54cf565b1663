//! Shared space-to-depth component
//!
//! [`SpaceToDepth`] owns everything the two layer variants have in common:
//! the block size, the plan computed for the last input shape, and the
//! padding buffer. The variants differ only in where the block size comes
//! from (see [`crate::reshaper`]).
//!
//! # Examples
//!
//! ```
//! use featfold_core::{BlockSize, Tensor};
//! use featfold_layer::{LayerState, SpaceToDepth};
//!
//! let mut s2d = SpaceToDepth::<f32>::new();
//! s2d.configure(BlockSize::TWO).unwrap();
//!
//! let bottom = Tensor::zeros(&[1, 3, 5, 4]);
//! let mut top = Tensor::empty();
//! let plan = s2d.reshape(&bottom, &mut top).unwrap();
//!
//! assert_eq!(s2d.state(), LayerState::ShapeReady);
//! assert_eq!(top.shape(), &[1, 12, 3, 2]);
//! assert_eq!(s2d.padding_buffer().shape(), &[1, 3, 6, 4]);
//! assert!(plan.needs_padding());
//! ```

use crate::layer::LayerState;
use featfold_core::{
    kernels, BlockSize, FeatFoldError, ReshapePlan, Result, ShapeCalculator, Tensor,
};
use scirs2_core::numeric::Float;

/// Block-size-parameterized space-to-depth transform with its buffers
#[derive(Debug, Clone)]
pub struct SpaceToDepth<T> {
    calculator: Option<ShapeCalculator>,
    plan: Option<ReshapePlan>,
    padding: Tensor<T>,
}

impl<T: Float> SpaceToDepth<T> {
    /// Create an unconfigured component.
    pub fn new() -> Self {
        Self {
            calculator: None,
            plan: None,
            padding: Tensor::empty(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LayerState {
        match (&self.calculator, &self.plan) {
            (None, _) => LayerState::Uninitialized,
            (Some(_), None) => LayerState::Configured,
            (Some(_), Some(_)) => LayerState::ShapeReady,
        }
    }

    /// Block size, once configured.
    pub fn block_size(&self) -> Option<BlockSize> {
        self.calculator.map(|calc| calc.block())
    }

    /// Plan for the last input shape seen by [`SpaceToDepth::reshape`].
    pub fn plan(&self) -> Option<&ReshapePlan> {
        self.plan.as_ref()
    }

    /// The padding buffer (source copy extended to even spatial extents).
    pub fn padding_buffer(&self) -> &Tensor<T> {
        &self.padding
    }

    /// Fix the block size. Allowed once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when already configured.
    pub fn configure(&mut self, block: BlockSize) -> Result<()> {
        if self.calculator.is_some() {
            return Err(FeatFoldError::invalid_state("setup", self.state()));
        }
        self.calculator = Some(ShapeCalculator::with_block(block));
        self.padding = Tensor::empty();
        Ok(())
    }

    /// Plan for `bottom`'s shape and size `top` plus the padding buffer.
    ///
    /// Calling again with the same input shape leaves both buffers untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before [`SpaceToDepth::configure`],
    /// `InvalidInputShape` when `bottom` is not a valid rank-4 shape or a
    /// buffer would exceed addressable memory, and `InvalidConfiguration`
    /// when the block size overflows the channel count.
    pub fn reshape(&mut self, bottom: &Tensor<T>, top: &mut Tensor<T>) -> Result<ReshapePlan> {
        let calculator = self
            .calculator
            .ok_or_else(|| FeatFoldError::invalid_state("reshape", self.state()))?;
        let plan = calculator.plan(bottom.shape())?;
        check_allocatable::<T>(&plan)?;

        let padding_resized = self.padding.reshape(&plan.padded.to_array());
        let top_resized = top.reshape(&plan.dst.to_array());
        if self.plan != Some(plan) || padding_resized || top_resized {
            tracing::debug!(
                plan = %plan,
                padding_resized,
                top_resized,
                "space_to_depth shape change"
            );
        }

        self.plan = Some(plan);
        Ok(plan)
    }

    /// Rearrange `bottom` data into `top` data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before [`SpaceToDepth::reshape`] and
    /// `ShapeMismatch` when either tensor differs from the last reshape.
    pub fn forward(&mut self, bottom: &Tensor<T>, top: &mut Tensor<T>) -> Result<()> {
        let plan = self.ready_plan("forward")?;
        check_shape("forward", &plan.src.to_array(), bottom.shape())?;
        check_shape("forward", &plan.dst.to_array(), top.shape())?;

        kernels::fill_padding_buffer(&plan, bottom.data(), self.padding.data_mut())?;
        kernels::space_to_depth(&plan, self.padding.data(), top.data_mut())?;

        tracing::trace!(plan = %plan, "space_to_depth forward");
        Ok(())
    }

    /// Route `top` gradients back into `bottom` gradients.
    ///
    /// `bottom`'s gradient is overwritten. With `propagate` false nothing is
    /// touched, not even the lifecycle checks.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before [`SpaceToDepth::reshape`] and
    /// `ShapeMismatch` when either tensor differs from the last reshape.
    pub fn backward(
        &mut self,
        top: &Tensor<T>,
        propagate: bool,
        bottom: &mut Tensor<T>,
    ) -> Result<()> {
        if !propagate {
            return Ok(());
        }
        let plan = self.ready_plan("backward")?;
        check_shape("backward", &plan.dst.to_array(), top.shape())?;
        check_shape("backward", &plan.src.to_array(), bottom.shape())?;

        kernels::depth_to_space_grad(&plan, top.grad(), self.padding.grad_mut())?;
        kernels::crop_padding_buffer(&plan, self.padding.grad(), bottom.grad_mut())?;

        tracing::trace!(plan = %plan, "space_to_depth backward");
        Ok(())
    }

    fn ready_plan(&self, operation: &str) -> Result<ReshapePlan> {
        self.plan
            .ok_or_else(|| FeatFoldError::invalid_state(operation, self.state()))
    }
}

impl<T: Float> Default for SpaceToDepth<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject plans whose buffers could never be allocated for `T`.
fn check_allocatable<T>(plan: &ReshapePlan) -> Result<()> {
    let limit = isize::MAX as usize / std::mem::size_of::<T>().max(1);
    for (role, dims) in [("output", plan.dst), ("padding buffer", plan.padded)] {
        if dims.count() > limit {
            return Err(FeatFoldError::invalid_input_shape(
                &plan.src.to_array(),
                format!(
                    "{role} of {} elements exceeds addressable memory",
                    dims.count()
                ),
            ));
        }
    }
    Ok(())
}

fn check_shape(operation: &str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FeatFoldError::shape_mismatch(operation, expected, actual))
    }
}
