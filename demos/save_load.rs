//! Save and Load Example
//!
//! Stores a model's hyperparameters as JSON and its parameters with one of
//! Burn's file recorders, then restores both and checks the outputs agree.

use burn::backend::NdArray;
use burn::config::Config;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::{Distribution, Tensor};
use firegcn::model::FireGcnConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Model Save/Load Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();
    let dir = std::env::temp_dir();

    println!("Creating model...");
    let config = FireGcnConfig::new(4, 4, 6)
        .with_hidden_dim(6)
        .with_embed_dim(3)
        .with_window_len(4);
    let model = config.init::<Backend>(&device)?;

    let input = Tensor::<Backend, 4>::random([2, 4, 6, 16], Distribution::Uniform(0.0, 1.0), &device);
    let before = model.forward(input.clone())?;
    println!("  Output shape: {:?}", before.dims());
    println!();

    println!("=== Serialization ===");
    let config_path = dir.join("firegcn_config.json");
    let model_path = dir.join("firegcn_model");
    config.save(&config_path)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .save_file(&model_path, &recorder)
        .map_err(|e| format!("saving model: {e:?}"))?;
    println!("  Config: {}", config_path.display());
    println!("  Params: {}", model_path.display());
    println!();

    println!("=== Restore ===");
    let restored_config = FireGcnConfig::load(&config_path)?;
    let restored = restored_config
        .init::<Backend>(&device)?
        .load_file(&model_path, &recorder, &device)
        .map_err(|e| format!("loading model: {e:?}"))?;

    let after = restored.forward(input)?;
    let diff = (before - after).abs().max().into_scalar();
    println!("  Max output difference after reload: {}", diff);

    Ok(())
}
