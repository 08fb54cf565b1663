//! Space-to-depth forward and backward through the host layer interface
//!
//! Builds both layer variants, loads the configurable one from a JSON config,
//! and walks a small odd-sized feature map through
//! `setup -> reshape -> forward -> backward`.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=featfold_layer=trace cargo run --example space_to_depth --features tracing
//! ```

use anyhow::Result;
use featfold::layer::tracing_support::{init_tracing, TracingConfig};
use featfold::prelude::*;

/// Print one channel of a rank-4 tensor as a grid
fn print_channel(label: &str, tensor: &Tensor<f32>, n: usize, c: usize) -> Result<()> {
    let dims = tensor.dims()?;
    println!("{label} [n={n}, c={c}] {}x{}", dims.height, dims.width);
    for y in 0..dims.height {
        let row: Vec<String> = (0..dims.width)
            .map(|x| format!("{:5.1}", tensor[&[n, c, y, x]]))
            .collect();
        println!("  {}", row.join(" "));
    }
    Ok(())
}

fn run_layer<L: Layer<f32>>(
    layer: &mut L,
    config: &ReshapeConfig,
    bottom: &Tensor<f32>,
) -> Result<Vec<Tensor<f32>>> {
    let mut top = vec![Tensor::empty()];
    layer.setup(&[bottom], &mut top, config)?;
    layer.reshape(&[bottom], &mut top)?;
    layer.forward(&[bottom], &mut top)?;
    Ok(top)
}

fn main() -> Result<()> {
    init_tracing(TracingConfig::default())?;

    println!("=== featfold: space-to-depth ===\n");

    let (h, w) = (5, 5);
    let data: Vec<f32> = (0..h * w).map(|x| x as f32).collect();
    let bottom = Tensor::from_vec(data, &[1, 1, h, w])?;
    print_channel("input", &bottom, 0, 0)?;

    // Fixed 2x2 blocks
    let mut fixed = FixedStepReshaper::<f32>::new();
    let top = run_layer(&mut fixed, &ReshapeConfig::default(), &bottom)?;
    if let Some(plan) = fixed.plan() {
        println!("\n{}: {plan}", fixed.type_name());
    }
    for c in 0..top[0].shape()[1] {
        print_channel("output", &top[0], 0, c)?;
    }

    // Block size from a JSON config
    let config = ReshapeConfig::from_json(r#"{ "sample_step": 3 }"#)?;
    let mut configurable = ConfigurableStepReshaper::<f32>::new();
    let mut top = run_layer(&mut configurable, &config, &bottom)?;
    if let Some(plan) = configurable.plan() {
        println!("\n{}: {plan}", configurable.type_name());
    }
    print_channel("output", &top[0], 0, 4)?;

    // Unit gradient flows back to every represented input pixel
    top[0].grad_mut().fill(1.0);
    let top_snapshot = top[0].clone();
    let mut bottoms = vec![bottom];
    configurable.backward(&[&top_snapshot], &[true], &mut bottoms)?;

    let grad = Tensor::from_vec(bottoms[0].grad().to_vec(), bottoms[0].shape())?;
    println!();
    print_channel("input gradient", &grad, 0, 0)?;

    tracing::info!(state = %configurable.state(), "done");
    Ok(())
}
