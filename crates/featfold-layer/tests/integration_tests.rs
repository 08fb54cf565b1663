//! Integration tests for featfold-layer
//!
//! Each test drives a layer through the host call sequence
//! `setup -> reshape -> forward -> backward`.

use featfold_core::{FeatFoldError, Tensor};
use featfold_layer::{
    ConfigurableStepReshaper, FixedStepReshaper, Layer, LayerState, ReshapeConfig,
};

fn ramp(shape: &[usize]) -> Tensor<f64> {
    let count = shape.iter().product::<usize>();
    Tensor::from_vec((1..=count).map(|x| x as f64).collect(), shape).unwrap()
}

fn set_up<L: Layer<f64>>(
    layer: &mut L,
    bottom: &Tensor<f64>,
    config: &ReshapeConfig,
) -> Vec<Tensor<f64>> {
    let mut top = vec![Tensor::empty()];
    layer.setup(&[bottom], &mut top, config).unwrap();
    layer.reshape(&[bottom], &mut top).unwrap();
    top
}

#[test]
fn test_fixed_layer_full_pass() {
    let mut layer = FixedStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 3, 5, 4]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::default());

    assert_eq!(layer.state(), LayerState::ShapeReady);
    assert_eq!(top[0].shape(), &[1, 12, 3, 2]);
    assert_eq!(layer.inner().padding_buffer().shape(), &[1, 3, 6, 4]);

    layer.forward(&[&bottom], &mut top).unwrap();
    let out = &top[0];
    for c in 0..3 {
        for by in 0..2 {
            for bx in 0..2 {
                let oc = (by * 2 + bx) * 3 + c;
                for oy in 0..3 {
                    for ox in 0..2 {
                        let (y, x) = (oy * 2 + by, ox * 2 + bx);
                        let expected = if y < 5 { bottom[&[0, c, y, x]] } else { 0.0 };
                        assert_eq!(out[&[0, oc, oy, ox]], expected);
                    }
                }
            }
        }
    }

    top[0].grad_mut().fill(2.0);
    let top_snapshot = top[0].clone();
    let mut bottoms = vec![bottom];
    layer
        .backward(&[&top_snapshot], &[true], &mut bottoms)
        .unwrap();
    assert!(bottoms[0].grad().iter().all(|&g| g == 2.0));
}

#[test]
fn test_configurable_layer_odd_extent() {
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[2, 1, 9, 9]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::new(3));

    assert_eq!(top[0].shape(), &[2, 9, 4, 4]);
    assert_eq!(layer.inner().padding_buffer().shape(), &[2, 1, 10, 10]);

    layer.forward(&[&bottom], &mut top).unwrap();
    // Output row 3 with block row 0 reads padded row 9, the padding row
    assert_eq!(top[0][&[1, 0, 3, 0]], 0.0);
    // Block row 2 on output row 3 would read row 11, beyond the padded buffer
    assert_eq!(top[0][&[0, 6, 3, 1]], 0.0);
    assert_eq!(top[0][&[1, 4, 2, 2]], bottom[&[1, 0, 7, 7]]);
}

#[test]
fn test_configurable_layer_even_extent() {
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[2, 1, 6, 6]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::new(3));

    assert_eq!(top[0].shape(), &[2, 9, 2, 2]);
    assert_eq!(layer.inner().padding_buffer().shape(), &[2, 1, 6, 6]);

    layer.forward(&[&bottom], &mut top).unwrap();
    let mut produced: Vec<f64> = top[0].data().to_vec();
    produced.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut expected = bottom.data().to_vec();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(produced, expected);
}

#[test]
fn test_reshape_tracks_input_changes_without_reallocating() {
    let mut layer = FixedStepReshaper::<f64>::new();
    let large = ramp(&[2, 4, 11, 11]);
    let mut top = set_up(&mut layer, &large, &ReshapeConfig::default());
    let capacity = top[0].capacity();
    assert_eq!(top[0].shape(), &[2, 16, 6, 6]);

    let ptr = top[0].data().as_ptr();
    layer.reshape(&[&large], &mut top).unwrap();
    assert_eq!(top[0].data().as_ptr(), ptr);

    let small = ramp(&[1, 4, 4, 4]);
    layer.reshape(&[&small], &mut top).unwrap();
    assert_eq!(top[0].shape(), &[1, 16, 2, 2]);
    assert_eq!(top[0].capacity(), capacity);

    layer.forward(&[&small], &mut top).unwrap();
    assert!(matches!(
        layer.forward(&[&large], &mut top),
        Err(FeatFoldError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_backward_without_propagation_leaves_grad() {
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 2, 4, 4]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::new(2));
    layer.forward(&[&bottom], &mut top).unwrap();

    top[0].grad_mut().fill(1.0);
    let mut bottoms = vec![bottom];
    bottoms[0].grad_mut().fill(-3.0);
    layer.backward(&[&top[0]], &[false], &mut bottoms).unwrap();
    assert!(bottoms[0].grad().iter().all(|&g| g == -3.0));
}

#[test]
fn test_lifecycle_violations() {
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 1, 4, 4]);
    let mut top = vec![Tensor::empty()];

    assert!(matches!(
        layer.forward(&[&bottom], &mut top),
        Err(FeatFoldError::InvalidState { .. })
    ));
    assert!(matches!(
        layer.reshape(&[&bottom], &mut top),
        Err(FeatFoldError::InvalidState { .. })
    ));

    layer
        .setup(&[&bottom], &mut top, &ReshapeConfig::default())
        .unwrap();
    let err = layer.forward(&[&bottom], &mut top).unwrap_err();
    assert_eq!(
        err.to_string(),
        "forward is not allowed while the layer is configured"
    );
}

#[test]
fn test_rejects_bad_inputs() {
    let mut layer = FixedStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 1, 4, 4]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::default());

    for shape in [&[4, 4][..], &[1, 0, 4, 4][..], &[1, 1, 1, 4, 4][..]] {
        let bad = Tensor::zeros(shape);
        assert!(matches!(
            layer.reshape(&[&bad], &mut top),
            Err(FeatFoldError::InvalidInputShape { .. })
        ));
    }
    // The previous plan survives a rejected reshape
    layer.forward(&[&bottom], &mut top).unwrap();

    let mut no_tops: Vec<Tensor<f64>> = Vec::new();
    assert!(matches!(
        layer.reshape(&[&bottom], &mut no_tops),
        Err(FeatFoldError::TensorCount { .. })
    ));
}

#[test]
fn test_block_larger_than_input() {
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 2, 2, 2]);
    let mut top = set_up(&mut layer, &bottom, &ReshapeConfig::new(4));

    assert_eq!(top[0].shape(), &[1, 32, 0, 0]);
    assert!(top[0].is_empty());
    layer.forward(&[&bottom], &mut top).unwrap();

    let top_snapshot = top[0].clone();
    let mut bottoms = vec![bottom];
    bottoms[0].grad_mut().fill(9.0);
    layer
        .backward(&[&top_snapshot], &[true], &mut bottoms)
        .unwrap();
    assert!(bottoms[0].grad().iter().all(|&g| g == 0.0));
}

#[cfg(feature = "serde")]
#[test]
fn test_config_from_json_drives_layer() {
    let config = ReshapeConfig::from_json(r#"{ "sample_step": 4 }"#).unwrap();
    let mut layer = ConfigurableStepReshaper::<f64>::new();
    let bottom = ramp(&[1, 1, 8, 8]);
    let top = set_up(&mut layer, &bottom, &config);
    assert_eq!(top[0].shape(), &[1, 16, 2, 2]);
}
