//! # featfold-core
//!
//! Tensor storage, shape planning and rearrangement kernels for the featfold
//! space-to-depth layers.
//!
//! This crate provides the building blocks the layer crate composes:
//!
//! - **Host tensor** ([`Tensor`]) with paired data/gradient buffers and
//!   capacity-preserving resize
//! - **Feature dimensions** ([`FeatureDims`]) validated `(num, channels, height, width)`
//! - **Block size** ([`BlockSize`]) always at least 1
//! - **Shape planning** ([`ShapeCalculator`], [`ReshapePlan`]) with the
//!   odd-dimension padding correction
//! - **Kernels** ([`kernels`]) gathering into and scattering out of the
//!   space-to-depth layout
//!
//! ## Quick Start
//!
//! ```
//! use featfold_core::{kernels, ShapeCalculator, Tensor};
//!
//! let src = Tensor::from_vec((0..60).map(|x| x as f32).collect(), &[1, 3, 5, 4]).unwrap();
//!
//! let plan = ShapeCalculator::new(2).unwrap().plan(src.shape()).unwrap();
//! assert_eq!(plan.padded.to_array(), [1, 3, 6, 4]);
//! assert_eq!(plan.dst.to_array(), [1, 12, 3, 2]);
//!
//! let mut padded = Tensor::<f32>::zeros(&plan.padded.to_array());
//! let mut out = Tensor::<f32>::zeros(&plan.dst.to_array());
//! kernels::fill_padding_buffer(&plan, src.data(), padded.data_mut()).unwrap();
//! kernels::space_to_depth(&plan, padded.data(), out.data_mut()).unwrap();
//!
//! // First output channel samples the top-left pixel of every 2x2 block
//! assert_eq!(out[&[0, 0, 0, 0]], 0.0);
//! assert_eq!(out[&[0, 0, 0, 1]], 2.0);
//! assert_eq!(out[&[0, 0, 1, 0]], 8.0);
//! ```
//!
//! ## Memory Layout
//!
//! All buffers are dense and C-contiguous (row-major). The kernels index the
//! flat buffers directly; [`Tensor::view`] and [`Tensor::to_array`] expose
//! them as `scirs2_core` ndarrays for interop.
//!
//! ## Error Handling
//!
//! Operations return [`error::Result`] with a [`FeatFoldError`]:
//!
//! ```
//! use featfold_core::{FeatFoldError, ShapeCalculator};
//!
//! let err = ShapeCalculator::new(0).unwrap_err();
//! assert!(matches!(err, FeatFoldError::InvalidConfiguration { .. }));
//!
//! let calc = ShapeCalculator::new(2).unwrap();
//! let err = calc.plan(&[3, 32, 32]).unwrap_err();
//! assert!(matches!(err, FeatFoldError::InvalidInputShape { .. }));
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of tensors and plans

#![deny(warnings)]

pub mod error;
pub mod kernels;
pub mod plan;
pub mod tensor;
pub mod types;


pub use error::{FeatFoldError, Result};
pub use plan::{ReshapePlan, ShapeCalculator};
pub use tensor::Tensor;
pub use types::{BlockSize, FeatureDims, Shape, FEATURE_RANK};
