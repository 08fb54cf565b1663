//! Integration tests for featfold-core
//!
//! These tests drive the planner and kernels through [`Tensor`] buffers the
//! way the layer crate does.

use anyhow::Result;
use featfold_core::{kernels, FeatFoldError, ReshapePlan, ShapeCalculator, Tensor};

fn apply_plan(plan: &ReshapePlan, padded: &mut Tensor<f32>, out: &mut Tensor<f32>) {
    padded.reshape(&plan.padded.to_array());
    out.reshape(&plan.dst.to_array());
}

#[test]
fn test_fixed_step_pipeline_on_tensors() -> Result<()> {
    let src = Tensor::from_vec((0..60).map(|x| x as f32).collect(), &[1, 3, 5, 4])?;
    let plan = ShapeCalculator::new(2)?.plan(src.shape())?;

    let mut padded = Tensor::empty();
    let mut out = Tensor::empty();
    apply_plan(&plan, &mut padded, &mut out);

    assert_eq!(padded.shape(), &[1, 3, 6, 4]);
    assert_eq!(out.shape(), &[1, 12, 3, 2]);

    kernels::fill_padding_buffer(&plan, src.data(), padded.data_mut())?;
    kernels::space_to_depth(&plan, padded.data(), out.data_mut())?;

    // Channel 1 of the source lands in output channel 1 (block offset 0, 0)
    assert_eq!(out[&[0, 1, 0, 0]], src[&[0, 1, 0, 0]]);
    // Block offset (1, 1) of source channel 2 is output channel 3 * 3 + 2
    assert_eq!(out[&[0, 11, 1, 1]], src[&[0, 2, 3, 3]]);
    // Last output row of block row 1 reads the synthetic padding row
    assert_eq!(out[&[0, 6, 2, 0]], 0.0);
    Ok(())
}

#[test]
fn test_backward_through_tensor_grads() -> Result<()> {
    let src = Tensor::from_vec((1..=18).map(|x| x as f32).collect(), &[2, 1, 3, 3])?;
    let plan = ShapeCalculator::new(2)?.plan(src.shape())?;

    let mut padded = Tensor::empty();
    let mut out = Tensor::empty();
    apply_plan(&plan, &mut padded, &mut out);

    out.grad_mut().iter_mut().for_each(|g| *g = 1.0);
    let mut bottom = src.clone();
    kernels::depth_to_space_grad(&plan, out.grad(), padded.grad_mut())?;

    // Every slot of the 4x4 padded map is read once, padding included
    assert_eq!(padded.shape(), &[2, 1, 4, 4]);
    assert_eq!(padded.grad()[3], 1.0);
    assert_eq!(padded.grad()[12], 1.0);
    assert!(padded.grad().iter().all(|&g| g == 1.0));

    // The crop keeps only the 3x3 source region
    kernels::crop_padding_buffer(&plan, padded.grad(), bottom.grad_mut())?;
    assert_eq!(bottom.grad(), vec![1.0f32; 18].as_slice());
    Ok(())
}

#[test]
fn test_replanning_reuses_buffers() -> Result<()> {
    let calc = ShapeCalculator::new(2)?;
    let mut padded = Tensor::<f32>::empty();
    let mut out = Tensor::<f32>::empty();

    let big = calc.plan(&[4, 8, 17, 17])?;
    apply_plan(&big, &mut padded, &mut out);
    let (padded_cap, out_cap) = (padded.capacity(), out.capacity());

    let small = calc.plan(&[1, 8, 5, 5])?;
    apply_plan(&small, &mut padded, &mut out);
    assert_eq!(padded.shape(), &[1, 8, 6, 6]);
    assert_eq!(out.shape(), &[1, 32, 3, 3]);
    assert_eq!(padded.capacity(), padded_cap);
    assert_eq!(out.capacity(), out_cap);
    Ok(())
}

#[test]
fn test_rejects_malformed_inputs() -> Result<()> {
    let calc = ShapeCalculator::new(2)?;

    let flat = Tensor::<f32>::zeros(&[16]);
    assert!(matches!(
        calc.plan(flat.shape()),
        Err(FeatFoldError::InvalidInputShape { .. })
    ));

    let hollow = Tensor::<f32>::zeros(&[1, 3, 0, 4]);
    assert!(matches!(
        hollow.dims(),
        Err(FeatFoldError::InvalidInputShape { .. })
    ));
    Ok(())
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_oversized_block_is_an_error_not_a_panic() -> Result<()> {
    let calc = ShapeCalculator::new(1usize << 33)?;
    let err = calc.plan(&[1, 1, 2, 2]).unwrap_err();
    assert!(matches!(
        err,
        FeatFoldError::InvalidConfiguration { value, .. } if value == 1usize << 33
    ));
    Ok(())
}
