//! Basic usage of the wildfire GCN classifier
//!
//! Builds a small model over a 5×5 pixel patch and classifies a batch of
//! random feature sequences.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use firegcn::graph::GridConfig;
use firegcn::model::FireGcnConfig;
use firegcn::rnn::GcnGruConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== firegcn Basic Example ===\n");

    // Use the NdArray backend (CPU)
    type Backend = NdArray<f32>;
    let device = Default::default();

    // Example 1: Full classifier
    println!("Example 1: Classifier over a 5x5 patch");
    let config = FireGcnConfig::new(5, 5, 12)
        .with_hidden_dim(12)
        .with_embed_dim(4)
        .with_window_len(6);
    let model = config.init::<Backend>(&device)?;

    println!("  Nodes:       {}", model.num_nodes());
    println!("  Input dim:   {}", model.input_dim());
    println!("  Hidden dim:  {}", model.hidden_dim());
    println!("  Classes:     {}", model.num_classes());
    println!();

    // Input shape: [batch=4, T=6, features=12, N=25]
    let input = Tensor::<Backend, 4>::random([4, 6, 12, 25], Distribution::Uniform(0.0, 1.0), &device);
    let log_probs = model.forward(input)?;

    println!("  Input shape:  [4, 6, 12, 25]");
    println!("  Output shape: {:?}", log_probs.dims());
    println!("  Fire probabilities: {}", log_probs.exp().narrow(1, 1, 1));
    println!();

    // Example 2: Encoder on its own, two layers, every layer returned
    println!("Example 2: Two-layer encoder");
    let supports = GridConfig::new(5, 5, 2).build_tensor::<Backend>(&device)?;
    let encoder = GcnGruConfig::new(25, 12, 9, 4, 2, 6)
        .with_num_layers(2)
        .with_return_all_layers(true)
        .init(supports, &device)?;

    // Input shape: [batch=2, T=6, N=25, features=12]
    let input = Tensor::<Backend, 4>::random([2, 6, 25, 12], Distribution::Uniform(-1.0, 1.0), &device);
    let embeddings = Tensor::<Backend, 2>::random([25, 4], Distribution::Normal(0.0, 1.0), &device);
    let output = encoder.forward(input, embeddings)?;

    for (layer, (sequence, state)) in output
        .layer_outputs
        .iter()
        .zip(&output.last_states)
        .enumerate()
    {
        println!("  Layer {}: sequence {:?}, final state {:?}", layer, sequence.dims(), state.dims());
    }
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
