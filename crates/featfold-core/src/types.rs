//! Core type definitions for featfold.
//!
//! - [`Shape`]: dynamic tensor shape, inline for common ranks
//! - [`FeatureDims`]: validated `(num, channels, height, width)` view of a shape
//! - [`BlockSize`]: side length of the square spatial block folded into depth
//!
//! # Examples
//!
//! ```
//! use featfold_core::{BlockSize, FeatureDims};
//!
//! let dims = FeatureDims::from_shape(&[1, 3, 5, 4]).unwrap();
//! assert_eq!(dims.height, 5);
//!
//! let block = BlockSize::new(2).unwrap();
//! assert!(block.is_even());
//! ```

use crate::error::{FeatFoldError, Result};
use smallvec::SmallVec;
use std::fmt;
use std::num::NonZeroUsize;

/// Shape type using SmallVec to avoid heap allocation for common cases.
///
/// Feature tensors are rank 4, so the inline capacity of 6 is never exceeded
/// for well-formed inputs; malformed higher-rank inputs spill to the heap.
pub type Shape = SmallVec<[usize; 6]>;

/// Number of axes of a feature tensor.
pub const FEATURE_RANK: usize = 4;

/// Dimensions of a 4D feature tensor in `(num, channels, height, width)` order.
///
/// Constructed through [`FeatureDims::from_shape`], which rejects anything that
/// is not a rank-4 shape with positive extents. [`FeatureDims::new`] performs
/// no validation and is used for computed (possibly empty) output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureDims {
    /// Batch size
    pub num: usize,
    /// Channel count
    pub channels: usize,
    /// Spatial height
    pub height: usize,
    /// Spatial width
    pub width: usize,
}

impl FeatureDims {
    /// Create dimensions without validation.
    pub const fn new(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            num,
            channels,
            height,
            width,
        }
    }

    /// Interpret a tensor shape as feature dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`FeatFoldError::InvalidInputShape`] when the shape is not
    /// rank 4 or any extent is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use featfold_core::FeatureDims;
    ///
    /// assert!(FeatureDims::from_shape(&[2, 3, 4, 5]).is_ok());
    /// assert!(FeatureDims::from_shape(&[2, 3, 4]).is_err());
    /// assert!(FeatureDims::from_shape(&[2, 0, 4, 5]).is_err());
    /// ```
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        if shape.len() != FEATURE_RANK {
            return Err(FeatFoldError::invalid_input_shape(
                shape,
                format!("expected rank {}, got {}", FEATURE_RANK, shape.len()),
            ));
        }
        if let Some(axis) = shape.iter().position(|&d| d == 0) {
            return Err(FeatFoldError::invalid_input_shape(
                shape,
                format!("axis {} has zero extent", axis),
            ));
        }
        Ok(Self::new(shape[0], shape[1], shape[2], shape[3]))
    }

    /// Total number of elements.
    ///
    /// Plans only hold dimensions whose count passed [`FeatureDims::checked_count`].
    pub fn count(&self) -> usize {
        self.num * self.channels * self.height * self.width
    }

    /// Total number of elements, `None` on overflow.
    pub fn checked_count(&self) -> Option<usize> {
        self.num
            .checked_mul(self.channels)?
            .checked_mul(self.height)?
            .checked_mul(self.width)
    }

    /// Dimensions as an array in `(num, channels, height, width)` order.
    pub fn to_array(&self) -> [usize; FEATURE_RANK] {
        [self.num, self.channels, self.height, self.width]
    }

    /// Dimensions as a [`Shape`].
    pub fn to_shape(&self) -> Shape {
        SmallVec::from_slice(&self.to_array())
    }

    /// Row-major linear offset of `(n, c, h, w)`.
    #[inline]
    pub fn offset(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        ((n * self.channels + c) * self.height + h) * self.width + w
    }
}

impl fmt::Display for FeatureDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.num, self.channels, self.height, self.width
        )
    }
}

/// Side length of the square spatial block folded into channel depth.
///
/// Always at least 1. Odd block sizes are representable; the odd-dimension
/// padding only adds a single row/column, so they rarely tile the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BlockSize(NonZeroUsize);

impl BlockSize {
    /// The block size used by the fixed-step variant.
    pub const TWO: BlockSize = match NonZeroUsize::new(2) {
        Some(v) => BlockSize(v),
        None => unreachable!(),
    };

    /// Create a block size.
    ///
    /// # Errors
    ///
    /// Returns [`FeatFoldError::InvalidConfiguration`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        NonZeroUsize::new(size).map(BlockSize).ok_or_else(|| {
            FeatFoldError::invalid_configuration("sample_step", size, "must be at least 1")
        })
    }

    /// The block side length.
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Number of output channels produced per input channel (`block^2`),
    /// `None` when it overflows `usize`.
    #[inline]
    pub fn checked_area(self) -> Option<usize> {
        self.get().checked_mul(self.get())
    }

    /// Whether the block size is even.
    pub fn is_even(self) -> bool {
        self.get() % 2 == 0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        BlockSize::TWO
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
