//! # featfold - space-to-depth feature reshaping
//!
//! This is the **meta crate** that re-exports the featfold components.
//!
//! ## Quick Start
//!
//! ```
//! use featfold::prelude::*;
//!
//! let mut layer = ConfigurableStepReshaper::<f32>::new();
//! let bottom = Tensor::zeros(&[1, 8, 32, 31]);
//! let mut top = vec![Tensor::empty()];
//!
//! layer.setup(&[&bottom], &mut top, &ReshapeConfig::new(2))?;
//! layer.reshape(&[&bottom], &mut top)?;
//! layer.forward(&[&bottom], &mut top)?;
//! assert_eq!(top[0].shape(), &[1, 32, 16, 16]);
//! # Ok::<(), FeatFoldError>(())
//! ```
//!
//! ## Components
//!
//! ### Tensors, planning and kernels ([`core`])
//!
//! ```
//! use featfold::core::ShapeCalculator;
//!
//! let plan = ShapeCalculator::new(2).unwrap().plan(&[1, 3, 5, 4]).unwrap();
//! assert_eq!(
//!     plan.to_string(),
//!     "(1, 3, 5, 4) -[pad]-> (1, 3, 6, 4) -[block 2]-> (1, 12, 3, 2)"
//! );
//! ```
//!
//! ### Layers ([`layer`])
//!
//! The host [`layer::Layer`] trait and its two implementations,
//! `FeatReshape` (fixed 2x2 blocks) and `FeatReshapeCommon` (`sample_step`).
//!
//! ## Features
//!
//! - `tracing`: subscriber installation via `featfold::layer::tracing_support`
//!
//! ## Examples
//!
//! See `examples/space_to_depth.rs` for a full forward/backward walk-through.

#![deny(warnings)]

pub use featfold_core as core;
pub use featfold_layer as layer;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use featfold::prelude::*;
    //!
    //! let layer = FixedStepReshaper::<f64>::new();
    //! assert_eq!(layer.type_name(), "FeatReshape");
    //! ```

    // Core types
    pub use crate::core::{
        BlockSize, FeatFoldError, FeatureDims, ReshapePlan, ShapeCalculator, Tensor,
    };

    // Layers
    pub use crate::layer::{
        ConfigurableStepReshaper, FixedStepReshaper, Layer, LayerState, ReshapeConfig,
    };
}
