//! Wildfire classifier over a pixel grid
//!
//! Input layout is `[batch, T, features, N]`, nodes numbered row-major over a
//! `width × height` patch. The pipeline is:
//!
//! 1. move features last and layer-normalize them,
//! 2. encode with a [`GcnGru`] stack over the grid and a learned node
//!    embedding table,
//! 3. take the last layer's final state `[batch, N, hidden]`,
//! 4. flatten to `[batch, hidden · N]` (feature-major), apply a linear head and
//!    dropout, and return log-probabilities over the classes.

use crate::cells::weight_pool::{standard_normal, uniform, xavier_uniform};
use crate::error::{ensure_dims, GcnError};
use crate::graph::{GridConfig, SupportKind};
use crate::rnn::{GcnGru, GcnGruConfig};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Hyperparameters of a [`FireGcn`] model
#[derive(Config, Debug)]
pub struct FireGcnConfig {
    /// Patch width in pixels
    pub width: usize,
    /// Patch height in pixels
    pub height: usize,
    /// Number of input features per pixel and time step
    pub input_dim: usize,
    /// Recurrent state width, divisible by 3
    #[config(default = 24)]
    pub hidden_dim: usize,
    #[config(default = 8)]
    pub embed_dim: usize,
    /// Hop count of the support stacks
    #[config(default = 2)]
    pub link_len: usize,
    /// Time steps per sample
    #[config(default = 10)]
    pub window_len: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = 2)]
    pub num_classes: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
    /// Seed for parameter initialization
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = "SupportKind::Diffusion")]
    pub support: SupportKind,
}

impl FireGcnConfig {
    pub fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    /// Static grid graph described by this config
    pub fn grid(&self) -> GridConfig {
        GridConfig::new(self.width, self.height, self.link_len).with_support(self.support)
    }

    /// Encoder hyperparameters described by this config
    pub fn encoder(&self) -> GcnGruConfig {
        GcnGruConfig::new(
            self.num_nodes(),
            self.input_dim,
            self.hidden_dim,
            self.embed_dim,
            self.link_len,
            self.window_len,
        )
        .with_num_layers(self.num_layers)
        .with_return_all_layers(false)
        .with_seed(self.seed)
    }

    /// Initialize a model
    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::Result<FireGcn<B>> {
        if self.num_classes == 0 {
            return Err(GcnError::BadConfig("at least one output class is required"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(GcnError::BadConfig("dropout must be in [0, 1)"));
        }
        let supports = self.grid().build_tensor::<B>(device)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let encoder = GcnGru::new(&self.encoder(), supports, &mut rng, device)?;
        let node_embeddings = standard_normal([self.num_nodes(), self.embed_dim], &mut rng, device);

        let input_norm = LayerNormConfig::new(self.input_dim).init(device);
        // seeded like the encoder
        let fc_inputs = self.num_nodes() * self.hidden_dim;
        let fc = Linear {
            weight: xavier_uniform([fc_inputs, self.num_classes], &mut rng, device),
            bias: Some(uniform(
                [self.num_classes],
                1.0 / (fc_inputs as f32).sqrt(),
                &mut rng,
                device,
            )),
        };
        let dropout = DropoutConfig::new(self.dropout).init();

        tracing::debug!(
            width = self.width,
            height = self.height,
            input_dim = self.input_dim,
            hidden_dim = self.hidden_dim,
            num_classes = self.num_classes,
            "created fire GCN model"
        );

        Ok(FireGcn {
            input_norm,
            node_embeddings,
            encoder,
            fc,
            dropout,
            width: self.width,
            height: self.height,
            input_dim: self.input_dim,
            hidden_dim: self.hidden_dim,
            num_classes: self.num_classes,
        })
    }
}

/// Spatio-temporal GCN classifier
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct FireGcn<B: Backend> {
    /// Normalizes the feature axis of every pixel and step
    input_norm: LayerNorm<B>,
    /// Node embedding table `[N, embed_dim]`
    node_embeddings: Param<Tensor<B, 2>>,
    encoder: GcnGru<B>,
    /// `[hidden · N] → num_classes`
    fc: Linear<B>,
    dropout: Dropout,
    #[module(skip)]
    width: usize,
    #[module(skip)]
    height: usize,
    #[module(skip)]
    input_dim: usize,
    #[module(skip)]
    hidden_dim: usize,
    #[module(skip)]
    num_classes: usize,
}

impl<B: Backend> FireGcn<B> {
    pub fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn encoder(&self) -> &GcnGru<B> {
        &self.encoder
    }

    /// Current node embedding table
    pub fn node_embeddings(&self) -> Tensor<B, 2> {
        self.node_embeddings.val()
    }

    /// Final hidden state of the encoder, `[batch, N, hidden]`
    ///
    /// `input`: `[batch, T, features, N]`
    pub fn encode(&self, input: Tensor<B, 4>) -> crate::Result<Tensor<B, 3>> {
        let [batch, seq_len, _, _] = input.dims();
        ensure_dims(
            "model input",
            [batch, seq_len, self.input_dim, self.num_nodes()],
            input.dims(),
        )?;

        let x = self.input_norm.forward(input.permute([0, 1, 3, 2]));
        let output = self.encoder.forward(x, self.node_embeddings.val())?;
        output
            .last_state()
            .ok_or(GcnError::BadConfig("encoder returned no layers"))
    }

    /// Class log-probabilities `[batch, num_classes]`
    ///
    /// `input`: `[batch, T, features, N]`
    pub fn forward(&self, input: Tensor<B, 4>) -> crate::Result<Tensor<B, 2>> {
        let hidden = self.encode(input)?;
        let [batch, num_nodes, hidden_dim] = hidden.dims();

        let features = hidden.swap_dims(1, 2).reshape([batch, hidden_dim * num_nodes]);
        let logits = self.dropout.forward(self.fc.forward(features));
        Ok(activation::log_softmax(logits, 1))
    }
}
