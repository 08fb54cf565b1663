//! Fixed and configurable space-to-depth layers
//!
//! Both layers are the same [`StepReshaper`] over a shared
//! [`SpaceToDepth`] component; a [`StepSource`] decides where the block size
//! comes from:
//!
//! - [`FixedStep`] always folds 2x2 blocks and ignores `sample_step`.
//! - [`ConfiguredStep`] reads `sample_step` from the layer config.
//!
//! # Examples
//!
//! ```
//! use featfold_core::Tensor;
//! use featfold_layer::{ConfigurableStepReshaper, Layer, ReshapeConfig};
//!
//! let mut layer = ConfigurableStepReshaper::<f32>::new();
//! let bottom = Tensor::zeros(&[2, 1, 6, 6]);
//! let mut top = vec![Tensor::empty()];
//!
//! layer.setup(&[&bottom], &mut top, &ReshapeConfig::new(3)).unwrap();
//! layer.reshape(&[&bottom], &mut top).unwrap();
//! assert_eq!(top[0].shape(), &[2, 9, 2, 2]);
//!
//! layer.forward(&[&bottom], &mut top).unwrap();
//! ```

use crate::config::ReshapeConfig;
use crate::layer::{exactly_one, exactly_one_mut, Layer, LayerState};
use crate::space_to_depth::SpaceToDepth;
use featfold_core::{BlockSize, ReshapePlan, Result, Tensor};
use scirs2_core::numeric::Float;
use std::fmt;
use std::marker::PhantomData;

/// Where a layer takes its block size from
pub trait StepSource {
    /// Layer type identifier reported by [`Layer::type_name`].
    const TYPE_NAME: &'static str;

    /// Resolve the block size for a layer config.
    fn block_size(config: &ReshapeConfig) -> Result<BlockSize>;
}

/// Block size fixed at 2
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStep;

impl StepSource for FixedStep {
    const TYPE_NAME: &'static str = "FeatReshape";

    fn block_size(config: &ReshapeConfig) -> Result<BlockSize> {
        if config.sample_step != BlockSize::TWO.get() {
            tracing::debug!(
                sample_step = config.sample_step,
                "fixed-step layer ignores sample_step"
            );
        }
        Ok(BlockSize::TWO)
    }
}

/// Block size read from `sample_step`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredStep;

impl StepSource for ConfiguredStep {
    const TYPE_NAME: &'static str = "FeatReshapeCommon";

    fn block_size(config: &ReshapeConfig) -> Result<BlockSize> {
        let block = config.validate()?;
        if !block.is_even() {
            tracing::warn!(
                sample_step = block.get(),
                "odd sample_step: odd spatial extents are padded by one, not to a multiple of the block"
            );
        }
        Ok(block)
    }
}

/// Space-to-depth layer driven through [`Layer`]
pub struct StepReshaper<T, S> {
    core: SpaceToDepth<T>,
    _source: PhantomData<fn() -> S>,
}

/// Space-to-depth with 2x2 blocks.
pub type FixedStepReshaper<T> = StepReshaper<T, FixedStep>;

/// Space-to-depth with a configurable block size.
pub type ConfigurableStepReshaper<T> = StepReshaper<T, ConfiguredStep>;

impl<T: Float, S: StepSource> StepReshaper<T, S> {
    /// Create a layer awaiting `setup`.
    pub fn new() -> Self {
        Self {
            core: SpaceToDepth::new(),
            _source: PhantomData,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LayerState {
        self.core.state()
    }

    /// Block size, once set up.
    pub fn block_size(&self) -> Option<BlockSize> {
        self.core.block_size()
    }

    /// Plan for the last reshaped input.
    pub fn plan(&self) -> Option<&ReshapePlan> {
        self.core.plan()
    }

    /// The shared component.
    pub fn inner(&self) -> &SpaceToDepth<T> {
        &self.core
    }
}

impl<T: Float, S: StepSource> Default for StepReshaper<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, S> Clone for StepReshaper<T, S> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            _source: PhantomData,
        }
    }
}

impl<T: fmt::Debug, S: StepSource> fmt::Debug for StepReshaper<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepReshaper")
            .field("type_name", &S::TYPE_NAME)
            .field("core", &self.core)
            .finish()
    }
}

impl<T: Float, S: StepSource> Layer<T> for StepReshaper<T, S> {
    fn type_name(&self) -> &'static str {
        S::TYPE_NAME
    }

    fn setup(
        &mut self,
        bottom: &[&Tensor<T>],
        top: &mut [Tensor<T>],
        config: &ReshapeConfig,
    ) -> Result<()> {
        exactly_one("setup", "bottom", bottom)?;
        exactly_one_mut("setup", "top", top)?;

        let block = S::block_size(config)?;
        self.core.configure(block)?;
        tracing::debug!(layer = S::TYPE_NAME, block = block.get(), "layer set up");
        Ok(())
    }

    fn reshape(&mut self, bottom: &[&Tensor<T>], top: &mut [Tensor<T>]) -> Result<()> {
        let bottom = exactly_one("reshape", "bottom", bottom)?;
        let top = exactly_one_mut("reshape", "top", top)?;
        self.core.reshape(bottom, top)?;
        Ok(())
    }

    fn forward(&mut self, bottom: &[&Tensor<T>], top: &mut [Tensor<T>]) -> Result<()> {
        let bottom = exactly_one("forward", "bottom", bottom)?;
        let top = exactly_one_mut("forward", "top", top)?;
        self.core.forward(bottom, top)
    }

    fn backward(
        &mut self,
        top: &[&Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<()> {
        let top = exactly_one("backward", "top", top)?;
        let propagate = exactly_one("backward", "propagate_down", propagate_down)?;
        let bottom = exactly_one_mut("backward", "bottom", bottom)?;
        self.core.backward(top, *propagate, bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use featfold_core::FeatFoldError;

    #[test]
    fn test_type_names() {
        assert_eq!(
            FixedStepReshaper::<f32>::new().type_name(),
            "FeatReshape"
        );
        assert_eq!(
            ConfigurableStepReshaper::<f32>::new().type_name(),
            "FeatReshapeCommon"
        );
    }

    #[test]
    fn test_fixed_step_ignores_config() {
        let mut layer = FixedStepReshaper::<f64>::new();
        let bottom = Tensor::zeros(&[1, 3, 5, 4]);
        let mut top = vec![Tensor::empty()];

        layer
            .setup(&[&bottom], &mut top, &ReshapeConfig::new(5))
            .unwrap();
        assert_eq!(layer.block_size(), Some(BlockSize::TWO));

        layer.reshape(&[&bottom], &mut top).unwrap();
        assert_eq!(top[0].shape(), &[1, 12, 3, 2]);
    }

    #[test]
    fn test_fixed_step_accepts_zero_sample_step() {
        let mut layer = FixedStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[1, 1, 2, 2]);
        let mut top = vec![Tensor::empty()];
        layer
            .setup(&[&bottom], &mut top, &ReshapeConfig::new(0))
            .unwrap();
        assert_eq!(layer.state(), LayerState::Configured);
    }

    #[test]
    fn test_configured_step_rejects_zero() {
        let mut layer = ConfigurableStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[1, 1, 2, 2]);
        let mut top = vec![Tensor::empty()];

        let err = layer
            .setup(&[&bottom], &mut top, &ReshapeConfig::new(0))
            .unwrap_err();
        assert!(matches!(err, FeatFoldError::InvalidConfiguration { .. }));
        assert_eq!(layer.state(), LayerState::Uninitialized);
    }

    #[test]
    fn test_configured_step_odd_block() {
        let mut layer = ConfigurableStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[2, 1, 9, 9]);
        let mut top = vec![Tensor::empty()];

        layer
            .setup(&[&bottom], &mut top, &ReshapeConfig::new(3))
            .unwrap();
        layer.reshape(&[&bottom], &mut top).unwrap();

        assert_eq!(top[0].shape(), &[2, 9, 4, 4]);
        assert_eq!(layer.inner().padding_buffer().shape(), &[2, 1, 10, 10]);
    }

    #[test]
    fn test_tensor_counts() {
        let mut layer = FixedStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[1, 1, 2, 2]);
        let mut top = vec![Tensor::empty()];
        let config = ReshapeConfig::default();

        assert_eq!(
            layer.setup(&[], &mut top, &config).unwrap_err(),
            FeatFoldError::tensor_count("setup", "bottom", 1, 0)
        );
        let mut two_tops = vec![Tensor::empty(), Tensor::empty()];
        assert_eq!(
            layer.setup(&[&bottom], &mut two_tops, &config).unwrap_err(),
            FeatFoldError::tensor_count("setup", "top", 1, 2)
        );
        // Failed setups leave the layer uninitialized
        assert_eq!(layer.state(), LayerState::Uninitialized);

        layer.setup(&[&bottom], &mut top, &config).unwrap();
        layer.reshape(&[&bottom], &mut top).unwrap();

        let mut bottoms = vec![bottom.clone()];
        assert_eq!(
            layer
                .backward(&[&top[0]], &[true, true], &mut bottoms)
                .unwrap_err(),
            FeatFoldError::tensor_count("backward", "propagate_down", 1, 2)
        );
        assert_eq!(
            layer.forward(&[&bottom, &bottom], &mut top).unwrap_err(),
            FeatFoldError::tensor_count("forward", "bottom", 1, 2)
        );
    }

    #[test]
    fn test_setup_twice() {
        let mut layer = ConfigurableStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[1, 1, 2, 2]);
        let mut top = vec![Tensor::empty()];
        let config = ReshapeConfig::default();

        layer.setup(&[&bottom], &mut top, &config).unwrap();
        assert_eq!(
            layer.setup(&[&bottom], &mut top, &config).unwrap_err(),
            FeatFoldError::invalid_state("setup", LayerState::Configured)
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_sample_step_is_rejected_at_reshape() {
        let mut layer = ConfigurableStepReshaper::<f32>::new();
        let bottom = Tensor::zeros(&[1, 1, 2, 2]);
        let mut top = vec![Tensor::empty()];

        layer
            .setup(&[&bottom], &mut top, &ReshapeConfig::new(1usize << 33))
            .unwrap();
        let err = layer.reshape(&[&bottom], &mut top).unwrap_err();
        assert!(matches!(
            err,
            FeatFoldError::InvalidConfiguration { value, .. } if value == 1usize << 33
        ));
        assert_eq!(layer.state(), LayerState::Configured);
        assert!(layer.plan().is_none());
    }

    #[test]
    fn test_debug_names_source() {
        let fixed = format!("{:?}", FixedStepReshaper::<f32>::new());
        assert!(fixed.contains("\"FeatReshape\""));
        let configurable = format!("{:?}", ConfigurableStepReshaper::<f32>::new());
        assert!(configurable.contains("\"FeatReshapeCommon\""));
    }
}
