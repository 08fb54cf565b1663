//! Space-to-depth rearrangement kernels
//!
//! All kernels work on flat row-major slices laid out according to a
//! [`ReshapePlan`], so the layer can run them directly on its tensors'
//! buffers without intermediate allocation.
//!
//! # Element Ordering
//!
//! Output channels are ordered block-offset major, source-channel minor
//! (the "DCR" ordering of ONNX `SpaceToDepth`):
//!
//! ```text
//! dst[n, (by * b + bx) * C + c, oy, ox] = padded[n, c, oy * b + by, ox * b + bx]
//! ```
//!
//! where `b` is the block size, `C` the source channel count and
//! `by, bx in 0..b`. Coordinates outside the padded buffer read as zero.
//! The padded buffer holds the source in its top-left corner and zeros in the
//! synthetic last row/column.
//!
//! # Gradient
//!
//! Every padded position maps to at most one output position, so the
//! backward pass is a scatter of the output gradient into the padded layout
//! followed by a crop to the source extent. Source positions that no output
//! element reads receive zero gradient.

use crate::error::{FeatFoldError, Result};
use crate::plan::ReshapePlan;
use crate::types::FeatureDims;
use scirs2_core::numeric::Float;

fn check_len(operation: &str, role: &str, dims: &FeatureDims, len: usize) -> Result<()> {
    if dims.count() != len {
        return Err(FeatFoldError::shape_mismatch(
            format!("{} ({})", operation, role),
            &[dims.count()],
            &[len],
        ));
    }
    Ok(())
}

/// Copy the source into the padding buffer, zero-filling the synthetic
/// row/column.
///
/// # Errors
///
/// Returns `ShapeMismatch` when a slice length disagrees with the plan.
pub fn fill_padding_buffer<T: Float>(
    plan: &ReshapePlan,
    src: &[T],
    padded: &mut [T],
) -> Result<()> {
    let (s, p) = (plan.src, plan.padded);
    check_len("fill_padding_buffer", "source", &s, src.len())?;
    check_len("fill_padding_buffer", "padding buffer", &p, padded.len())?;

    for n in 0..s.num {
        for c in 0..s.channels {
            for y in 0..p.height {
                let start = p.offset(n, c, y, 0);
                let row = &mut padded[start..start + p.width];
                if y < s.height {
                    let src_start = s.offset(n, c, y, 0);
                    row[..s.width].copy_from_slice(&src[src_start..src_start + s.width]);
                    row[s.width..].fill(T::zero());
                } else {
                    row.fill(T::zero());
                }
            }
        }
    }
    Ok(())
}

/// Copy the source-sized region of the padding buffer back into `src`.
///
/// Inverse of [`fill_padding_buffer`] on the region it copies.
///
/// # Errors
///
/// Returns `ShapeMismatch` when a slice length disagrees with the plan.
pub fn crop_padding_buffer<T: Float>(
    plan: &ReshapePlan,
    padded: &[T],
    src: &mut [T],
) -> Result<()> {
    let (s, p) = (plan.src, plan.padded);
    check_len("crop_padding_buffer", "padding buffer", &p, padded.len())?;
    check_len("crop_padding_buffer", "source", &s, src.len())?;

    for n in 0..s.num {
        for c in 0..s.channels {
            for y in 0..s.height {
                let start = p.offset(n, c, y, 0);
                let dst_start = s.offset(n, c, y, 0);
                src[dst_start..dst_start + s.width]
                    .copy_from_slice(&padded[start..start + s.width]);
            }
        }
    }
    Ok(())
}

/// Gather the padded source into the space-to-depth output.
///
/// # Errors
///
/// Returns `ShapeMismatch` when a slice length disagrees with the plan.
///
/// # Examples
///
/// ```
/// use featfold_core::{kernels, ShapeCalculator};
///
/// let plan = ShapeCalculator::new(2).unwrap().plan(&[1, 1, 2, 2]).unwrap();
/// let src = [1.0f32, 2.0, 3.0, 4.0];
/// let mut out = [0.0f32; 4];
/// kernels::space_to_depth(&plan, &src, &mut out).unwrap();
/// assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn space_to_depth<T: Float>(plan: &ReshapePlan, padded: &[T], dst: &mut [T]) -> Result<()> {
    let (p, d) = (plan.padded, plan.dst);
    check_len("space_to_depth", "padding buffer", &p, padded.len())?;
    check_len("space_to_depth", "output", &d, dst.len())?;
    if dst.is_empty() {
        return Ok(());
    }

    let block = plan.block.get();
    for n in 0..d.num {
        for by in 0..block {
            for bx in 0..block {
                for c in 0..p.channels {
                    let dc = (by * block + bx) * p.channels + c;
                    for oy in 0..d.height {
                        let y = oy * block + by;
                        for ox in 0..d.width {
                            let x = ox * block + bx;
                            dst[d.offset(n, dc, oy, ox)] = if y < p.height && x < p.width {
                                padded[p.offset(n, c, y, x)]
                            } else {
                                T::zero()
                            };
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Scatter the output gradient back into the padded source layout.
///
/// `padded_grad` is overwritten. Positions that no output element reads end
/// up zero. The synthetic padding row/column is read by the forward pass, so
/// its slots receive gradient here; [`crop_padding_buffer`] discards them.
///
/// # Errors
///
/// Returns `ShapeMismatch` when a slice length disagrees with the plan.
pub fn depth_to_space_grad<T: Float>(
    plan: &ReshapePlan,
    dst_grad: &[T],
    padded_grad: &mut [T],
) -> Result<()> {
    let (p, d) = (plan.padded, plan.dst);
    check_len("depth_to_space_grad", "output gradient", &d, dst_grad.len())?;
    check_len("depth_to_space_grad", "padding buffer", &p, padded_grad.len())?;

    padded_grad.fill(T::zero());
    if dst_grad.is_empty() {
        return Ok(());
    }
    let block = plan.block.get();
    for n in 0..d.num {
        for by in 0..block {
            for bx in 0..block {
                for c in 0..p.channels {
                    let dc = (by * block + bx) * p.channels + c;
                    for oy in 0..d.height {
                        let y = oy * block + by;
                        if y >= p.height {
                            continue;
                        }
                        for ox in 0..d.width {
                            let x = ox * block + bx;
                            if x < p.width {
                                let slot = &mut padded_grad[p.offset(n, c, y, x)];
                                *slot = *slot + dst_grad[d.offset(n, dc, oy, ox)];
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
