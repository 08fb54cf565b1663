//! Shape planning for the space-to-depth rearrangement
//!
//! Given source dimensions and a block size, [`ReshapePlan::compute`]
//! produces the padded working dimensions and the destination dimensions.
//!
//! # Algorithm
//!
//! ```text
//! dst_h    = src_h / block + (src_h mod 2)      (divide first, then correct)
//! dst_w    = src_w / block + (src_w mod 2)
//! dst_c    = src_c * block * block
//! dst_n    = src_n
//! padded_h = src_h + (src_h mod 2)              (padding buffer only)
//! padded_w = src_w + (src_w mod 2)
//! ```
//!
//! The odd-dimension correction adds exactly one output row/column. It is not
//! a ceiling division: `src_h = 6, block = 4` gives `1` (ceiling gives 2) and
//! `src_h = 9, block = 3` gives `9 / 3 + 1 = 4` (ceiling gives 3).

use crate::error::{FeatFoldError, Result};
use crate::types::{BlockSize, FeatureDims};
use std::fmt;

/// Extent of an axis after the odd-dimension padding (`dim + dim mod 2`).
///
/// `None` when the padded extent does not fit in `usize`.
///
/// # Examples
///
/// ```
/// use featfold_core::plan::padded_extent;
///
/// assert_eq!(padded_extent(5), Some(6));
/// assert_eq!(padded_extent(4), Some(4));
/// assert_eq!(padded_extent(usize::MAX), None);
/// ```
#[inline]
pub fn padded_extent(dim: usize) -> Option<usize> {
    dim.checked_add(dim % 2)
}

/// Extent of an axis after folding by `block` (`dim / block + dim mod 2`).
///
/// # Examples
///
/// ```
/// use featfold_core::{plan::folded_extent, BlockSize};
///
/// let block = BlockSize::new(2).unwrap();
/// assert_eq!(folded_extent(5, block), 3);
/// assert_eq!(folded_extent(1, block), 1);
/// assert_eq!(folded_extent(4, block), 2);
/// ```
#[inline]
pub fn folded_extent(dim: usize, block: BlockSize) -> usize {
    dim / block.get() + dim % 2
}

/// Source, padded and destination dimensions for one input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReshapePlan {
    /// Dimensions of the input tensor
    pub src: FeatureDims,
    /// Dimensions of the padding buffer
    pub padded: FeatureDims,
    /// Dimensions of the output tensor
    pub dst: FeatureDims,
    /// Block size the plan was computed for
    pub block: BlockSize,
}

impl ReshapePlan {
    /// Compute the plan for `src` folded by `block`. Pure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `block^2` or `channels * block^2`
    /// overflows `usize`, and `InvalidInputShape` when a padded extent or an
    /// element count of the source, padding buffer or output overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use featfold_core::{BlockSize, FeatureDims, ReshapePlan};
    ///
    /// let src = FeatureDims::new(1, 3, 5, 4);
    /// let plan = ReshapePlan::compute(src, BlockSize::TWO).unwrap();
    ///
    /// assert_eq!(plan.padded, FeatureDims::new(1, 3, 6, 4));
    /// assert_eq!(plan.dst, FeatureDims::new(1, 12, 3, 2));
    /// ```
    pub fn compute(src: FeatureDims, block: BlockSize) -> Result<Self> {
        let too_large = |what: &str| {
            FeatFoldError::invalid_input_shape(
                &src.to_array(),
                format!("{what} overflows usize"),
            )
        };
        let block_overflow = |what: String| {
            FeatFoldError::invalid_configuration("sample_step", block.get(), what)
        };

        src.checked_count()
            .ok_or_else(|| too_large("source element count"))?;
        let area = block
            .checked_area()
            .ok_or_else(|| block_overflow("block area overflows usize".to_string()))?;
        let channels = src.channels.checked_mul(area).ok_or_else(|| {
            block_overflow(format!(
                "{} channels x block area overflows usize",
                src.channels
            ))
        })?;

        let padded = FeatureDims::new(
            src.num,
            src.channels,
            padded_extent(src.height).ok_or_else(|| too_large("padded height"))?,
            padded_extent(src.width).ok_or_else(|| too_large("padded width"))?,
        );
        padded
            .checked_count()
            .ok_or_else(|| too_large("padding buffer element count"))?;

        let dst = FeatureDims::new(
            src.num,
            channels,
            folded_extent(src.height, block),
            folded_extent(src.width, block),
        );
        dst.checked_count()
            .ok_or_else(|| too_large("output element count"))?;

        Ok(Self {
            src,
            padded,
            dst,
            block,
        })
    }

    /// Whether the source needs a synthetic row or column.
    pub fn needs_padding(&self) -> bool {
        self.padded != self.src
    }
}

impl fmt::Display for ReshapePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[pad]-> {} -[block {}]-> {}",
            self.src, self.padded, self.block, self.dst
        )
    }
}

/// Shape calculator bound to one block size.
///
/// The single parameterized component behind both layer variants: the fixed
/// variant constructs it with a block size of 2, the configurable variant
/// with the configured sample step.
///
/// # Examples
///
/// ```
/// use featfold_core::ShapeCalculator;
///
/// let calc = ShapeCalculator::new(3).unwrap();
/// let plan = calc.plan(&[2, 1, 6, 6]).unwrap();
/// assert_eq!(plan.dst.to_array(), [2, 9, 2, 2]);
///
/// assert!(ShapeCalculator::new(0).is_err());
/// assert!(calc.plan(&[2, 1, 6]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShapeCalculator {
    block: BlockSize,
}

impl ShapeCalculator {
    /// Create a calculator for `block_size`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `block_size` is zero.
    pub fn new(block_size: usize) -> Result<Self> {
        Ok(Self::with_block(BlockSize::new(block_size)?))
    }

    /// Create a calculator from an already validated block size.
    pub const fn with_block(block: BlockSize) -> Self {
        Self { block }
    }

    /// The block size this calculator folds by.
    pub fn block(&self) -> BlockSize {
        self.block
    }

    /// Plan the rearrangement of a tensor with the given shape.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputShape` when the shape is not rank 4 or has a zero
    /// extent, plus the overflow errors of [`ReshapePlan::compute`].
    pub fn plan(&self, src_shape: &[usize]) -> Result<ReshapePlan> {
        let src = FeatureDims::from_shape(src_shape)?;
        ReshapePlan::compute(src, self.block)
    }
}
