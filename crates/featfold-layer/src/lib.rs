//! # featfold-layer
//!
//! Space-to-depth layers for a host compute graph.
//!
//! A space-to-depth layer folds each `block x block` spatial patch of a
//! `(num, channels, height, width)` feature map into `block * block` extra
//! channels. Odd spatial extents are first padded by one zero row/column.
//!
//! Two layer types are provided:
//!
//! | Layer | `type_name` | Block size |
//! |-------|-------------|------------|
//! | [`FixedStepReshaper`] | `FeatReshape` | always 2 |
//! | [`ConfigurableStepReshaper`] | `FeatReshapeCommon` | `sample_step` (default 2) |
//!
//! Both implement the host [`Layer`] trait on top of one shared
//! [`SpaceToDepth`] component.
//!
//! ## Quick Start
//!
//! ```
//! use featfold_core::Tensor;
//! use featfold_layer::{FixedStepReshaper, Layer, ReshapeConfig};
//!
//! let mut layer = FixedStepReshaper::<f32>::new();
//! let bottom = Tensor::from_vec((0..60).map(|x| x as f32).collect(), &[1, 3, 5, 4]).unwrap();
//! let mut top = vec![Tensor::empty()];
//!
//! layer.setup(&[&bottom], &mut top, &ReshapeConfig::default()).unwrap();
//! layer.reshape(&[&bottom], &mut top).unwrap();
//! assert_eq!(top[0].shape(), &[1, 12, 3, 2]);
//!
//! layer.forward(&[&bottom], &mut top).unwrap();
//!
//! top[0].grad_mut().fill(1.0);
//! let top_ref = top[0].clone();
//! let mut bottoms = vec![bottom];
//! layer.backward(&[&top_ref], &[true], &mut bottoms).unwrap();
//! assert!(bottoms[0].grad().iter().all(|&g| g == 1.0));
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --setup--> Configured --reshape--> ShapeReady
//!                                                  |  ^
//!                                                  +--+ reshape / forward / backward
//! ```
//!
//! Calls out of order fail with `InvalidState`; a second `setup` is
//! rejected. `reshape` with an unchanged input shape does not touch the
//! output or padding buffer.
//!
//! ## Features
//!
//! - `serde` (default): JSON config loading via `ReshapeConfig::from_json`
//! - `tracing`: [`tracing_support::init_tracing`] installs a subscriber

#![deny(warnings)]

pub mod config;
pub mod layer;
pub mod reshaper;
pub mod space_to_depth;
pub mod tracing_support;


pub use config::{ConfigError, ReshapeConfig};
pub use layer::{Layer, LayerState};
pub use reshaper::{
    ConfigurableStepReshaper, ConfiguredStep, FixedStep, FixedStepReshaper, StepReshaper,
    StepSource,
};
pub use space_to_depth::SpaceToDepth;
